//! Failure classification for door controller requests

use std::fmt;

/// Category of a failed door controller request
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// No response was received: connection refused, DNS failure, network
    /// unreachable or the local request timeout expired
    Unreachable,
    /// The controller rejected the authentication key (HTTP 403)
    Unauthorized,
    /// The controller itself timed out talking to the lock (HTTP 504)
    DeviceTimeout,
    /// Any other non-success HTTP status
    HttpError,
    /// A success response carrying an explicit `error` field
    DeviceReportedError,
    /// A success response whose body could not be decoded
    MalformedResponse,
    /// Host address or key missing, raised before any request is sent
    InvalidConfig,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::DeviceTimeout => "device timeout",
            ErrorKind::HttpError => "http error",
            ErrorKind::DeviceReportedError => "device reported error",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::InvalidConfig => "invalid config",
        };
        f.write_str(name)
    }
}

/// Error returned by every door controller operation
///
/// The message is meant to be shown to the user as is.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
}

impl ClientError {
    pub const INVALID_KEY: &'static str = "Invalid authentication key";
    pub const NO_CONTROLLER_RESPONSE: &'static str = "No response from door controller";

    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn unreachable(host: &str) -> Self {
        Self::new(
            ErrorKind::Unreachable,
            format!("Cannot connect to {host}. Check if device is on the same WiFi network."),
        )
    }

    pub fn from_status(status: u16) -> Self {
        let (kind, message) = match status {
            403 => (ErrorKind::Unauthorized, Self::INVALID_KEY.to_string()),
            504 => (
                ErrorKind::DeviceTimeout,
                Self::NO_CONTROLLER_RESPONSE.to_string(),
            ),
            _ => (ErrorKind::HttpError, format!("HTTP Error: {status}")),
        };

        Self {
            kind,
            message,
            status: Some(status),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the response that caused the failure, if one arrived
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod from_status {
        use super::*;

        #[test]
        fn forbidden_is_unauthorized() {
            let error = ClientError::from_status(403);
            assert_eq!(error.kind(), ErrorKind::Unauthorized);
            assert_eq!(error.message(), "Invalid authentication key");
            assert_eq!(error.status(), Some(403));
        }

        #[test]
        fn gateway_timeout_is_device_timeout() {
            let error = ClientError::from_status(504);
            assert_eq!(error.kind(), ErrorKind::DeviceTimeout);
            assert_eq!(error.message(), "No response from door controller");
        }

        #[test]
        fn other_status_names_the_code() {
            let error = ClientError::from_status(500);
            assert_eq!(error.kind(), ErrorKind::HttpError);
            assert_eq!(error.message(), "HTTP Error: 500");
            assert_eq!(error.status(), Some(500));
        }
    }

    #[test]
    fn unreachable_names_host() {
        let error = ClientError::unreachable("10.0.0.5");
        assert_eq!(error.kind(), ErrorKind::Unreachable);
        assert!(error.message().contains("10.0.0.5"));
        assert!(error.message().contains("same WiFi network"));
        assert_eq!(error.status(), None);
    }

    #[test]
    fn display_is_the_message() {
        let error = ClientError::new(ErrorKind::DeviceReportedError, "relay fault");
        assert_eq!(error.to_string(), "relay fault");
    }
}
