use crate::error::ClientError;
use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{Client, Response};
use std::time::Duration;

/// Create an HTTP client for door controller communication
///
/// Every request made with the returned client is aborted once `timeout`
/// elapses, covering connect, send and reading the body. The controller sits
/// on the local network, so system proxy settings are ignored.
///
/// # Arguments
/// * `timeout` - Total time a single request may take
///
/// # Examples
/// ```no_run
/// use smart_door_lock::http_client::device_http_client;
/// use std::time::Duration;
///
/// let client = device_http_client(Duration::from_secs(5))
///     .expect("failed to create client");
/// ```
pub fn device_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()
        .context("failed to create HTTP client")
}

/// Map a failure that happened before a usable response arrived
///
/// Local timeouts, refused connections and name resolution failures all mean
/// the same thing to the user: the controller could not be reached.
pub fn transport_error(err: &reqwest::Error, host: &str) -> ClientError {
    if err.is_timeout() {
        warn!("request to {host} timed out");
    } else {
        warn!("request to {host} failed: {err}");
    }

    ClientError::unreachable(host)
}

/// Handle HTTP response by checking status and extracting body
///
/// # Arguments
/// * `res` - The HTTP response to handle
/// * `host` - Host the request was sent to, used in failure messages
///
/// # Returns
/// * `Ok(String)` - The response body if the status is successful
/// * `Err` - The classified status failure, or `Unreachable` if the body
///   could not be read
pub async fn handle_http_response(res: Response, host: &str) -> Result<String, ClientError> {
    let status = res.status();

    if !status.is_success() {
        debug!("{} responded with status {status}", res.url().path());
        return Err(ClientError::from_status(status.as_u16()));
    }

    res.text().await.map_err(|e| transport_error(&e, host))
}
