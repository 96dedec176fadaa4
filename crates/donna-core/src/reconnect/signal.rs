//! Failure shapes reported by the realtime transport.

use serde_json::Value;
use std::fmt;
use std::io;

/// WebSocket close codes the policy knows by name (RFC 6455 §7.4 plus the
/// relay's application codes).
pub mod close_code {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;
    /// Endpoint going away (page unload, server restart).
    pub const GOING_AWAY: u16 = 1001;
    /// Protocol error.
    pub const PROTOCOL_ERROR: u16 = 1002;
    /// Abnormal closure: the socket dropped without a close frame.
    pub const ABNORMAL: u16 = 1006;
    /// Relay: no credentials arrived before the auth deadline.
    pub const AUTH_TIMEOUT: u16 = 4001;
    /// Relay: credentials were rejected.
    pub const INVALID_TOKEN: u16 = 4003;
}

/// What the connection manager saw when an attempt or a live session failed.
///
/// The realtime client can surface anything (an `Error`, a `CloseEvent`, a
/// thrown string, or nothing at all), so every shape has a variant and none
/// of them can make classification fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureSignal {
    /// Error-like value carrying a message.
    Error { message: String },
    /// WebSocket close event.
    Close { code: u16, reason: Option<String> },
    /// A value that is not an error, e.g. a thrown plain string.
    Opaque(String),
    /// No value at all.
    Absent,
}

impl FailureSignal {
    pub fn error(message: impl Into<String>) -> Self {
        FailureSignal::Error {
            message: message.into(),
        }
    }

    pub fn close(code: u16) -> Self {
        FailureSignal::Close { code, reason: None }
    }

    /// Numeric close code, if this is a close event.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            FailureSignal::Close { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Error message, if this is an error-like value.
    pub fn message(&self) -> Option<&str> {
        match self {
            FailureSignal::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Map an arbitrary JSON value (as forwarded by the relay or typed on the
    /// command line) onto a signal. Never fails.
    ///
    /// A numeric `code` that fits a close code takes precedence over `message`.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FailureSignal::Absent,
            Value::String(s) => FailureSignal::Opaque(s.clone()),
            Value::Object(map) => {
                let code = map
                    .get("code")
                    .and_then(Value::as_u64)
                    .and_then(|c| u16::try_from(c).ok());
                if let Some(code) = code {
                    return FailureSignal::Close {
                        code,
                        reason: map.get("reason").and_then(Value::as_str).map(str::to_owned),
                    };
                }
                match map.get("message").and_then(Value::as_str) {
                    Some(message) => FailureSignal::error(message),
                    None => FailureSignal::Opaque(value.to_string()),
                }
            }
            other => FailureSignal::Opaque(other.to_string()),
        }
    }
}

impl fmt::Display for FailureSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureSignal::Error { message } => write!(f, "{}", message),
            FailureSignal::Close {
                code,
                reason: Some(reason),
            } if !reason.is_empty() => write!(f, "close {} ({})", code, reason),
            FailureSignal::Close { code, .. } => write!(f, "close {}", code),
            FailureSignal::Opaque(s) => write!(f, "non-error value: {}", s),
            FailureSignal::Absent => write!(f, "no failure value"),
        }
    }
}

/// Socket-level IO errors are tagged with the errno names the classifier
/// matches on, since their `Display` text ("connection reset by peer") does not
/// carry them.
impl From<&io::Error> for FailureSignal {
    fn from(e: &io::Error) -> Self {
        let tag = match e.kind() {
            io::ErrorKind::ConnectionReset => Some("ECONNRESET"),
            io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
            io::ErrorKind::TimedOut => Some("ETIMEDOUT"),
            _ => None,
        };
        match tag {
            Some(tag) => FailureSignal::error(format!("{}: {}", tag, e)),
            None => FailureSignal::error(e.to_string()),
        }
    }
}

impl From<io::Error> for FailureSignal {
    fn from(e: io::Error) -> Self {
        FailureSignal::from(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_null_and_string() {
        assert_eq!(FailureSignal::from_json(&Value::Null), FailureSignal::Absent);
        assert_eq!(
            FailureSignal::from_json(&json!("string error")),
            FailureSignal::Opaque("string error".into())
        );
    }

    #[test]
    fn from_json_close_event() {
        let s = FailureSignal::from_json(&json!({"code": 1006, "reason": ""}));
        assert_eq!(s.close_code(), Some(1006));
        let s = FailureSignal::from_json(&json!({"code": 1000, "message": "bye"}));
        assert_eq!(s.close_code(), Some(1000));
    }

    #[test]
    fn from_json_error_object() {
        let s = FailureSignal::from_json(&json!({"message": "Network error occurred"}));
        assert_eq!(s.message(), Some("Network error occurred"));
    }

    #[test]
    fn from_json_string_code_is_not_a_close_code() {
        // Node-style errors carry string codes such as "ECONNRESET".
        let s = FailureSignal::from_json(&json!({"code": "ECONNRESET", "message": "read ECONNRESET"}));
        assert_eq!(s.close_code(), None);
        assert_eq!(s.message(), Some("read ECONNRESET"));
    }

    #[test]
    fn from_json_out_of_range_code_and_other_values() {
        let s = FailureSignal::from_json(&json!({"code": 70000}));
        assert!(matches!(s, FailureSignal::Opaque(_)));
        assert!(matches!(FailureSignal::from_json(&json!(42)), FailureSignal::Opaque(_)));
        assert!(matches!(FailureSignal::from_json(&json!([1, 2])), FailureSignal::Opaque(_)));
    }

    #[test]
    fn io_errors_carry_errno_tags() {
        let e = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        let s = FailureSignal::from(&e);
        assert!(s.message().unwrap().starts_with("ECONNRESET"));
        let e = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        assert_eq!(FailureSignal::from(e).message(), Some("permission denied"));
    }

    #[test]
    fn display_close_with_reason() {
        let s = FailureSignal::Close {
            code: 4003,
            reason: Some("invalid token".into()),
        };
        assert_eq!(s.to_string(), "close 4003 (invalid token)");
        assert_eq!(FailureSignal::close(1006).to_string(), "close 1006");
    }
}
