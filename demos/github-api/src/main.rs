//! GitHub API Example
//!
//! Demonstrates routes as an enum, designated error decoding, and tracing
//! diagnostics with pilot.
//!
//! Run with `RUST_LOG=pilot=debug` to see the traffic.

// Example-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]
#![allow(dead_code)]

use pilot::prelude::*;
use pilot::url::Url;
use serde_json::json;
use tracing_subscriber::EnvFilter;

const GITHUB_API: &str = "https://api.github.com";

// ============================================================================
// Data Types
// ============================================================================

/// A GitHub contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub contributions: u32,
}

/// A GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub pushed_at: Timestamp,
}

/// A GitHub issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u32,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
}

/// Error document GitHub sends along with 4xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubError {
    pub message: String,
    pub documentation_url: Option<String>,
}

// ============================================================================
// Routes
// ============================================================================

#[derive(Debug, Clone)]
pub enum Endpoint {
    Contributors { owner: String, repo: String },
    Repository { owner: String, repo: String },
    ListIssues {
        owner: String,
        repo: String,
        state: Option<String>,
        per_page: Option<u32>,
    },
    CreateIssue {
        owner: String,
        repo: String,
        title: String,
        body: Option<String>,
        token: String,
    },
}

#[derive(Debug, Clone)]
pub struct GitHubRoute {
    base: Url,
    endpoint: Endpoint,
}

impl Route for GitHubRoute {
    fn base_url(&self) -> Url {
        self.base.clone()
    }

    fn path(&self) -> String {
        match &self.endpoint {
            Endpoint::Contributors { owner, repo } => format!("repos/{owner}/{repo}/contributors"),
            Endpoint::Repository { owner, repo } => format!("repos/{owner}/{repo}"),
            Endpoint::ListIssues { owner, repo, .. }
            | Endpoint::CreateIssue { owner, repo, .. } => format!("repos/{owner}/{repo}/issues"),
        }
    }

    fn method(&self) -> Method {
        match self.endpoint {
            Endpoint::CreateIssue { .. } => Method::Post,
            _ => Method::Get,
        }
    }

    fn headers(&self) -> Headers {
        let mut headers = Headers::from([(
            "Accept".to_string(),
            "application/vnd.github+json".to_string(),
        )]);
        if let Endpoint::CreateIssue { token, .. } = &self.endpoint {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        headers
    }

    fn parameters(&self) -> Option<Parameters> {
        let value = match &self.endpoint {
            Endpoint::ListIssues {
                state, per_page, ..
            } => json!({
                "state": state,
                "per_page": per_page.map(|per_page| per_page.to_string()),
            }),
            Endpoint::CreateIssue { title, body, .. } => json!({ "title": title, "body": body }),
            _ => return None,
        };
        value.as_object().cloned()
    }

    fn parameter_encoding(&self) -> Option<ParameterEncoding> {
        match self.endpoint {
            Endpoint::ListIssues { .. } => Some(ParameterEncoding::Query),
            Endpoint::CreateIssue { .. } => Some(ParameterEncoding::JsonBody),
            _ => None,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Typed GitHub client.
#[derive(Debug, Clone)]
pub struct GitHub {
    base: Url,
    pilot: Pilot<GitHubRoute>,
    decoder: JsonDecoder,
}

impl GitHub {
    /// Create a client for the given API base URL.
    pub fn new(base: Url) -> Self {
        let client = HyperClient::builder()
            .user_agent("pilot-github-example/0.1.0")
            .build();
        Self {
            base,
            pilot: Pilot::new(client).with_diagnostics(TracingSink),
            decoder: JsonDecoder::new(),
        }
    }

    fn route(&self, endpoint: Endpoint) -> GitHubRoute {
        GitHubRoute {
            base: self.base.clone(),
            endpoint,
        }
    }

    /// List contributors for a repository.
    pub async fn contributors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Contributor>, GitHubError> {
        let route = self.route(Endpoint::Contributors {
            owner: owner.to_string(),
            repo: repo.to_string(),
        });
        self.pilot.request_target_failure(&route, &self.decoder).await
    }

    /// Get repository information.
    pub async fn repository(&self, owner: &str, repo: &str) -> Result<Repository, GitHubError> {
        let route = self.route(Endpoint::Repository {
            owner: owner.to_string(),
            repo: repo.to_string(),
        });
        self.pilot.request_target_failure(&route, &self.decoder).await
    }

    /// List issues, optionally filtered by state.
    pub async fn issues(
        &self,
        owner: &str,
        repo: &str,
        state: Option<&str>,
        per_page: Option<u32>,
    ) -> Result<Vec<Issue>, GitHubError> {
        let route = self.route(Endpoint::ListIssues {
            owner: owner.to_string(),
            repo: repo.to_string(),
            state: state.map(str::to_string),
            per_page,
        });
        self.pilot.request_target_failure(&route, &self.decoder).await
    }

    /// Open an issue.
    pub async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: Option<&str>,
        token: &str,
    ) -> Result<Issue, GitHubError> {
        let route = self.route(Endpoint::CreateIssue {
            owner: owner.to_string(),
            repo: repo.to_string(),
            title: title.to_string(),
            body: body.map(str::to_string),
            token: token.to_string(),
        });
        self.pilot.request_target_failure(&route, &self.decoder).await
    }
}

// ============================================================================
// Main: Demonstrate usage
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Ok(base) = Url::parse(GITHUB_API) else {
        return;
    };
    let github = GitHub::new(base);

    match github.repository("rust-lang", "rust").await {
        Ok(repo) => println!(
            "{}: {} stars, last push {}",
            repo.full_name, repo.stargazers_count, repo.pushed_at
        ),
        Err(Error::Designated(err)) => println!("GitHub refused: {}", err.message),
        Err(err) => println!("request failed: {err}"),
    }

    match github.contributors("rust-lang", "does-not-exist").await {
        Ok(contributors) => println!("{} contributors", contributors.len()),
        Err(Error::Designated(err)) => println!("GitHub refused: {}", err.message),
        Err(err) => println!("request failed: {err}"),
    }
}

// ============================================================================
// Tests using wiremock
// ============================================================================
