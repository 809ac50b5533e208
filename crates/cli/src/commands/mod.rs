use clap::Subcommand;
use mlit_core::{Error, FailureReport};
use mlit_fetch::FetchService;
use serde_json::Value;
use std::path::PathBuf;

pub mod cache;
pub mod fetch;
pub mod resolve;

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch an endpoint through the cache and print the materialized payload
    #[command(visible_alias = "f")]
    Fetch {
        /// Endpoint relative to the API base URL (e.g. XIT001)
        endpoint: String,

        /// Request parameter as key=value; values that parse as JSON keep their type
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = fetch::parse_param)]
        params: Vec<(String, Value)>,

        /// Resource category used in resource:// references
        #[arg(short, long, default_value = "responses")]
        category: String,

        /// Bypass both cache tiers and overwrite their entries
        #[arg(long)]
        force_refresh: bool,
    },

    /// Resolve a resource:// reference
    #[command(visible_alias = "r")]
    Resolve {
        /// Reference returned by a previous fetch
        uri: String,

        /// Write the raw bytes to this file instead of printing them
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Delete expired entries from the file cache
    Purge,
}

/// What a command produced, ready to print
pub enum Outcome {
    Success(Value),
    Failure(Failure),
}

/// A reported failure and whether it aborted the operation
pub struct Failure {
    pub aborts: bool,
    pub report: FailureReport,
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        if error.aborts_operation() {
            tracing::error!(kind = error.kind(), "{error}");
        } else {
            tracing::warn!(kind = error.kind(), "{error}");
        }
        Self {
            aborts: error.aborts_operation(),
            report: error.to_report(),
        }
    }
}

impl Outcome {
    pub fn render(&self) -> serde_json::Result<String> {
        match self {
            Outcome::Success(value) => serde_json::to_string_pretty(value),
            Outcome::Failure(failure) => serde_json::to_string_pretty(&failure.report),
        }
    }
}

impl Commands {
    pub async fn execute(self, service: &FetchService) -> Outcome {
        let result = match self {
            Commands::Fetch {
                endpoint,
                params,
                category,
                force_refresh,
            } => fetch::execute(service, endpoint, params, &category, force_refresh).await,
            Commands::Resolve { uri, output } => {
                resolve::execute(service, &uri, output.as_deref()).await
            }
            Commands::Purge => cache::purge(service).await,
        };

        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlit_config::MlitConfig;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service(server: &MockServer, dir: &TempDir) -> FetchService {
        let mut config = MlitConfig::defaults()
            .unwrap()
            .with_cache_dir(dir.path().join("bin"))
            .with_base_url(&format!("{}/ex-api/external/", server.uri()))
            .unwrap()
            .with_api_key("cli-key");
        config.cache.inline_threshold = 8;
        FetchService::from_config(&config).await.unwrap()
    }

    fn success(outcome: Outcome) -> Value {
        match outcome {
            Outcome::Success(value) => value,
            Outcome::Failure(failure) => panic!("expected success, got {:?}", failure.report),
        }
    }

    #[tokio::test]
    async fn test_invalid_category_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(0)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let service = service(&server, &dir).await;

        let outcome = Commands::Fetch {
            endpoint: "XIT001".to_string(),
            params: vec![("year".to_string(), Value::from(2024))],
            category: "Bad Category".to_string(),
            force_refresh: false,
        }
        .execute(&service)
        .await;

        match outcome {
            Outcome::Failure(failure) => {
                assert!(failure.aborts);
                assert_eq!(failure.report.kind, "invalid_parameter");
            }
            Outcome::Success(value) => panic!("expected failure, got {value}"),
        }
        assert_eq!(service.stats().upstream_fetches, 0);
    }

    #[tokio::test]
    async fn test_fetched_reference_resolves_into_output_file() {
        let server = MockServer::start().await;
        let tile: Vec<u8> = (0..64).collect();
        Mock::given(path("/ex-api/external/XKT001"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(tile.clone())
                    .insert_header("content-type", "application/vnd.mapbox-vector-tile"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let service = service(&server, &dir).await;

        let fetched = success(
            Commands::Fetch {
                endpoint: "XKT001".to_string(),
                params: Vec::new(),
                category: "tiles".to_string(),
                force_refresh: false,
            }
            .execute(&service)
            .await,
        );
        assert_eq!(fetched["isResource"], true);
        assert_eq!(fetched["fromCache"], false);
        let uri = fetched["resourceUri"].as_str().unwrap().to_string();
        assert!(uri.starts_with("resource://mlit/tiles/"));

        let output = dir.path().join("tile.mvt");
        let resolved = success(
            Commands::Resolve {
                uri: uri.clone(),
                output: Some(output.clone()),
            }
            .execute(&service)
            .await,
        );
        assert_eq!(resolved["resourceUri"], uri.as_str());
        assert_eq!(resolved["sizeBytes"], 64);
        assert_eq!(resolved["output"], output.display().to_string());
        assert_eq!(std::fs::read(&output).unwrap(), tile);
    }

    #[tokio::test]
    async fn test_resolving_unknown_reference_is_not_fatal() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let service = service(&server, &dir).await;
        let missing = format!("resource://mlit/tiles/{}.bin", "0".repeat(64));

        let outcome = Commands::Resolve {
            uri: missing,
            output: Some(dir.path().join("never-written")),
        }
        .execute(&service)
        .await;

        match outcome {
            Outcome::Failure(failure) => {
                assert!(!failure.aborts);
                assert_eq!(failure.report.kind, "resource_not_found");
            }
            Outcome::Success(value) => panic!("expected failure, got {value}"),
        }
        assert!(!dir.path().join("never-written").exists());
    }
}
