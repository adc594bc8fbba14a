use crate::{
    config::ClientConfig,
    error::{ClientError, ErrorKind},
    http_client::{device_http_client, handle_http_response, transport_error},
};
use anyhow::Result;
use log::{debug, info};
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use trait_variant::make;

/// Address and credentials of a door controller
///
/// Supplied by the caller for every operation and never stored by the client.
#[derive(Clone, Eq, PartialEq)]
pub struct DeviceConfig {
    pub host_address: String,
    pub auth_key: String,
}

impl DeviceConfig {
    pub fn new(host_address: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Self {
            host_address: host_address.into(),
            auth_key: auth_key.into(),
        }
    }

    /// Reject configurations that must never reach the network
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.host_address.trim().is_empty() {
            return Err(ClientError::new(
                ErrorKind::InvalidConfig,
                "Please enter a valid IP address",
            ));
        }
        if self.auth_key.trim().is_empty() {
            return Err(ClientError::new(
                ErrorKind::InvalidConfig,
                "Please enter an authentication key",
            ));
        }
        Ok(())
    }
}

// the key is a secret, keep it out of logs
impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("host_address", &self.host_address)
            .field("auth_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DoorState {
    Locked,
    Unlocked,
    #[default]
    Unknown,
}

impl DoorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoorState::Locked => "locked",
            DoorState::Unlocked => "unlocked",
            DoorState::Unknown => "unknown",
        }
    }
}

impl From<&str> for DoorState {
    fn from(value: &str) -> Self {
        match value {
            "locked" => DoorState::Locked,
            "unlocked" => DoorState::Unlocked,
            _ => DoorState::Unknown,
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful outcome of a door controller operation
///
/// `door` holds the value exactly as the controller sent it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationResult {
    pub door: String,
}

impl OperationResult {
    /// The reported door value, with anything unrecognized treated as unknown
    pub fn state(&self) -> DoorState {
        DoorState::from(self.door.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Endpoint {
    Status,
    Lock,
    Unlock,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Status => "status",
            Endpoint::Lock => "lock",
            Endpoint::Unlock => "unlock",
        }
    }
}

/// Characters escaped in the key: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Deserialize)]
struct DoorResponse {
    door: Option<Value>,
    error: Option<Value>,
}

#[make(Send)]
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait DoorController {
    async fn get_status(&self, config: DeviceConfig) -> Result<OperationResult, ClientError>;
    async fn lock(&self, config: DeviceConfig) -> Result<OperationResult, ClientError>;
    async fn unlock(&self, config: DeviceConfig) -> Result<OperationResult, ClientError>;
}

/// Client for the door controller HTTP API
///
/// Each operation is one independent `GET http://{host}/{endpoint}?key=...`
/// round trip. Nothing is retried and no state is kept between calls.
#[derive(Clone)]
pub struct DeviceControlClient {
    client: Client,
}

impl DeviceControlClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_client(device_http_client(config.request_timeout)?))
    }

    /// Use an already configured HTTP client, e.g. one routed through a proxy
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build_url(host_address: &str, endpoint: Endpoint) -> String {
        format!("http://{host_address}/{}", endpoint.path())
    }

    /// Query string carrying the percent-encoded key
    ///
    /// A space is sent as `%20`, never `+`, since the controller decodes the
    /// query as a plain URI component.
    fn key_query(auth_key: &str) -> String {
        format!("key={}", utf8_percent_encode(auth_key, KEY_ENCODE_SET))
    }

    /// GET request to the door controller with the key as query parameter
    async fn request(
        &self,
        config: DeviceConfig,
        endpoint: Endpoint,
    ) -> Result<OperationResult, ClientError> {
        config.validate()?;

        let host = config.host_address.as_str();
        let url = Self::build_url(host, endpoint);
        info!("GET {url}");

        let res = self
            .client
            .get(format!("{url}?{}", Self::key_query(&config.auth_key)))
            .send()
            .await
            .map_err(|e| transport_error(&e, host))?;

        let body = handle_http_response(res, host).await?;
        let result = parse_body(&body)?;

        debug!("GET {url} reported door {}", result.door);

        Ok(result)
    }
}

impl DoorController for DeviceControlClient {
    async fn get_status(&self, config: DeviceConfig) -> Result<OperationResult, ClientError> {
        self.request(config, Endpoint::Status).await
    }

    async fn lock(&self, config: DeviceConfig) -> Result<OperationResult, ClientError> {
        self.request(config, Endpoint::Lock).await
    }

    async fn unlock(&self, config: DeviceConfig) -> Result<OperationResult, ClientError> {
        self.request(config, Endpoint::Unlock).await
    }
}

/// Interpret the body of a success response
fn parse_body(body: &str) -> Result<OperationResult, ClientError> {
    let malformed = |e: serde_json::Error| {
        ClientError::new(
            ErrorKind::MalformedResponse,
            format!("Invalid response from door controller: {e}"),
        )
    };

    // only a JSON object is a valid body, arrays must not map onto the fields
    let object: Map<String, Value> = serde_json::from_str(body).map_err(malformed)?;
    let response: DoorResponse =
        serde_json::from_value(Value::Object(object)).map_err(malformed)?;

    if let Some(message) = response.error.as_ref().and_then(error_message) {
        return Err(ClientError::new(ErrorKind::DeviceReportedError, message));
    }

    match response.door {
        Some(Value::String(door)) => Ok(OperationResult { door }),
        Some(Value::Null) | None => Err(ClientError::new(
            ErrorKind::MalformedResponse,
            "Invalid response from door controller: missing door state",
        )),
        Some(other) => Ok(OperationResult {
            door: other.to_string(),
        }),
    }
}

/// Message of an `error` field, if the field signals a failure
///
/// Empty strings, `false`, `0` and `null` do not count as errors.
fn error_message(error: &Value) -> Option<String> {
    match error {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
