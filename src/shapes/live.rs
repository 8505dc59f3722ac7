//! Response shapes sampled from a server running on localhost.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::DataShapeProvider;
use crate::error::{Result, RouteError};
use crate::routes::{DataShape, EndpointRecord, HttpMethod};

/// Longest example kept for a scalar JSON body.
const MAX_SCALAR_EXAMPLE: usize = 200;

/// Scalar array elements shown in an example.
const MAX_SCALAR_ITEMS: usize = 3;

/// Reads response shapes from a server running on localhost.
///
/// Only parameter-free GET endpoints are requested; nothing is ever sent
/// that could change server state.
pub struct LiveInspector {
    client: Client,
    base_url: String,
}

impl LiveInspector {
    /// Probe `http://localhost:PORT/health`. A 200 or a 404 both mean a
    /// server is listening.
    pub fn connect(port: u16, timeout: Duration) -> Result<Self> {
        let base_url = format!("http://localhost:{}", port);
        let client = Client::builder().timeout(timeout).build()?;

        let status = client
            .get(format!("{}/health", base_url))
            .send()
            .map_err(|e| {
                debug!(error = %e, "health probe failed");
                RouteError::ServerUnavailable(base_url.clone())
            })?
            .status();

        if status.as_u16() != 200 && status.as_u16() != 404 {
            warn!(url = %base_url, status = status.as_u16(), "unexpected health status");
            return Err(RouteError::ServerUnavailable(base_url));
        }

        info!(url = %base_url, "connected to live server");
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn inspect(&self, endpoint: &EndpointRecord) -> Result<Option<DataShape>> {
        let path = if endpoint.display_path.starts_with('/') {
            endpoint.display_path.as_str()
        } else {
            endpoint.fingerprint.path.as_str()
        };
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()?;

        let status = response.status();
        if status.as_u16() != 200 {
            debug!(path, status = status.as_u16(), "skipping non-200 response");
            return Ok(None);
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        if !is_json {
            return Ok(Some(DataShape::new(
                "Response",
                format!("Status {}", status.as_u16()),
                "text/plain",
            )));
        }

        let body: Value = response.json()?;
        Ok(Some(describe_json(path, &body)))
    }
}

/// Whether an endpoint can be requested without inventing parameters.
pub fn should_inspect(endpoint: &EndpointRecord) -> bool {
    endpoint.method() == HttpMethod::Get && !endpoint.fingerprint.path.has_params()
}

impl DataShapeProvider for LiveInspector {
    fn name(&self) -> &'static str {
        "live"
    }

    fn shapes_for(&self, endpoint: &EndpointRecord) -> Vec<DataShape> {
        if !should_inspect(endpoint) {
            return Vec::new();
        }
        match self.inspect(endpoint) {
            Ok(shape) => shape.into_iter().collect(),
            Err(e) => {
                warn!(endpoint = %endpoint.fingerprint, error = %e, "inspection failed");
                Vec::new()
            }
        }
    }
}

/// Describe a JSON response body by its top-level shape.
pub fn describe_json(path: &str, body: &Value) -> DataShape {
    let about_users = path.to_lowercase().contains("users");
    match body {
        Value::Object(map) => {
            let description = if map.contains_key("status") {
                "Status response"
            } else if about_users {
                "User data response"
            } else if map.contains_key("error") {
                "Error response"
            } else {
                "Data object response"
            };
            DataShape::new("Response", description, pretty(body))
        }
        Value::Array(items) => match items.first() {
            None => DataShape::new("Response", "Empty array response", "[]"),
            Some(first @ Value::Object(_)) => {
                let description = if about_users {
                    "Array of user objects".to_string()
                } else {
                    format!("Array of {} items", items.len())
                };
                DataShape::new("Response", description, pretty(&Value::Array(vec![first.clone()])))
            }
            Some(first) => {
                let shown: Vec<Value> = items.iter().take(MAX_SCALAR_ITEMS).cloned().collect();
                DataShape::new(
                    "Response",
                    format!("Array of {} {} values", items.len(), type_name(first)),
                    pretty(&Value::Array(shown)),
                )
            }
        },
        scalar => {
            let mut example = pretty(scalar);
            if example.chars().count() > MAX_SCALAR_EXAMPLE {
                example = example.chars().take(MAX_SCALAR_EXAMPLE).collect::<String>() + "...";
            }
            DataShape::new(
                "Response",
                format!("Simple {} response", type_name(scalar)),
                example,
            )
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
