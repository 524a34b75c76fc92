//! Flight API routes and models shared by the integration tests.

#![allow(dead_code)]

use pilot::prelude::*;
use pilot::url::Url;
use serde_json::json;

pub const FLIGHT: &str = r#"{"code":"ABC123","departure":"DEP","arrival":"ARV","departure_time":1597169495,"estimated_arrival_time":1597176695}"#;
pub const FLIGHT_WITHOUT_DATES: &str = r#"{"code":"ABC123","departure":"DEP","arrival":"ARV"}"#;
pub const INVALID_FLIGHT_ID: &str = r#"{"error":{"code":404,"description":"Invalid flight id."}}"#;
pub const INCOMPLETE_ERROR: &str = r#"{"error":{"code":404}}"#;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub code: String,
    pub departure: String,
    pub arrival: String,
    pub departure_time: Timestamp,
    pub estimated_arrival_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    pub code: i32,
    pub description: String,
}

#[derive(Debug, Clone)]
pub enum FlightRoute {
    ById(String),
    Search { origin: String, page: u32 },
    Book { code: String, seats: u32 },
}

/// A flight route against a given server.
#[derive(Debug, Clone)]
pub struct FlightApi {
    pub base: Url,
    pub route: FlightRoute,
}

impl FlightApi {
    pub fn new(base: &str, route: FlightRoute) -> Self {
        Self {
            base: base.parse().expect("valid base URL"),
            route,
        }
    }

    pub fn by_id(base: &str, id: &str) -> Self {
        Self::new(base, FlightRoute::ById(id.to_string()))
    }
}

impl Route for FlightApi {
    fn base_url(&self) -> Url {
        self.base.clone()
    }

    fn path(&self) -> String {
        match &self.route {
            FlightRoute::ById(id) => format!("flights/{id}"),
            FlightRoute::Search { .. } => "flights".to_string(),
            FlightRoute::Book { .. } => "bookings".to_string(),
        }
    }

    fn method(&self) -> Method {
        match self.route {
            FlightRoute::Book { .. } => Method::Post,
            _ => Method::Get,
        }
    }

    fn headers(&self) -> Headers {
        Headers::from([("Accept".to_string(), "application/json".to_string())])
    }

    fn parameters(&self) -> Option<Parameters> {
        let value = match &self.route {
            FlightRoute::ById(_) => return None,
            FlightRoute::Search { origin, page } => {
                json!({ "origin": origin, "page": page.to_string(), "direct": true })
            }
            FlightRoute::Book { code, seats } => json!({ "code": code, "seats": seats }),
        };
        match value {
            serde_json::Value::Object(parameters) => Some(parameters),
            _ => None,
        }
    }

    fn parameter_encoding(&self) -> Option<ParameterEncoding> {
        match self.route {
            FlightRoute::ById(_) => None,
            FlightRoute::Search { .. } => Some(ParameterEncoding::Query),
            FlightRoute::Book { .. } => Some(ParameterEncoding::JsonBody),
        }
    }
}

/// Decoder for the flight API wire format.
pub fn flight_decoder() -> JsonDecoder {
    JsonDecoder::new()
        .key_decoding(KeyDecoding::ConvertFromSnakeCase)
        .date_decoding(DateDecoding::SecondsSinceEpoch)
}

pub fn expected_flight() -> Flight {
    Flight {
        code: "ABC123".to_string(),
        departure: "DEP".to_string(),
        arrival: "ARV".to_string(),
        departure_time: Timestamp::from_seconds(1_597_169_495).expect("valid timestamp"),
        estimated_arrival_time: Timestamp::from_seconds(1_597_176_695).expect("valid timestamp"),
    }
}
