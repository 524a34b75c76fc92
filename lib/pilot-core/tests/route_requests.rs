//! Request building from route enums, through the public API only.

use assert2::{check, let_assert};
use pilot_core::prelude::*;
use pilot_core::APPLICATION_JSON;
use serde_json::{Value, json};

enum AirportRoute {
    List { country: String, limit: u32 },
    Details(String),
    Rate { code: String, stars: u8, comment: Option<String> },
}

impl Route for AirportRoute {
    fn base_url(&self) -> url::Url {
        "https://api.example.com/v2/".parse().expect("valid URL")
    }

    fn path(&self) -> String {
        match self {
            Self::List { .. } => "airports".to_string(),
            Self::Details(code) => format!("/airports/{code}/"),
            Self::Rate { code, .. } => format!("airports/{code}/ratings"),
        }
    }

    fn method(&self) -> Method {
        match self {
            Self::Rate { .. } => Method::Post,
            _ => Method::Get,
        }
    }

    fn headers(&self) -> Headers {
        Headers::from([("X-Client".to_string(), "route-tests".to_string())])
    }

    fn parameters(&self) -> Option<Parameters> {
        let value = match self {
            Self::List { country, limit } => json!({ "country": country, "limit": limit }),
            Self::Details(_) => return None,
            Self::Rate {
                code,
                stars,
                comment,
            } => json!({ "code": code, "stars": stars, "comment": comment }),
        };
        value.as_object().cloned()
    }

    fn parameter_encoding(&self) -> Option<ParameterEncoding> {
        match self {
            Self::List { .. } => Some(ParameterEncoding::Query),
            Self::Details(_) => None,
            Self::Rate { .. } => Some(ParameterEncoding::JsonBody),
        }
    }
}

#[test]
fn path_segments_join_the_base() {
    let request = Request::from_route(&AirportRoute::Details("CDG".to_string()));

    check!(request.url().as_str() == "https://api.example.com/v2/airports/CDG");
    check!(request.header("x-client") == Some("route-tests"));
}

#[test]
fn query_route_keeps_string_parameters() {
    let route = AirportRoute::List {
        country: "FR".to_string(),
        limit: 10,
    };

    let request = Request::from_route(&route);

    insta::assert_snapshot!(request.url().as_str(), @"https://api.example.com/v2/airports?country=FR");
}

#[test]
fn json_route_body_is_the_parameter_object() {
    let route = AirportRoute::Rate {
        code: "CDG".to_string(),
        stars: 4,
        comment: None,
    };

    let request = Request::from_route(&route);

    check!(request.method() == Method::Post);
    check!(request.header("content-type") == Some(APPLICATION_JSON));
    let_assert!(Some(body) = request.body());
    let_assert!(Ok(sent) = serde_json::from_slice::<Value>(body));
    check!(sent == json!({ "code": "CDG", "stars": 4, "comment": null }));
}

#[test]
fn routes_work_behind_references_and_trait_objects() {
    let route = AirportRoute::Details("NCE".to_string());
    let by_ref = &route;
    let as_dyn: &dyn Route = &route;

    check!(Request::from_route(&by_ref) == Request::from_route(as_dyn));
    check!(as_dyn.url().as_str() == "https://api.example.com/v2/airports/NCE");
}
