//! Classify failure signals and close codes for retry decisions.
//!
//! Classification is an allow-list: only messages that name a transient
//! network condition are retriable. Anything unrecognised fails closed so an
//! auth failure can never turn into a reconnect loop.

use super::signal::{close_code, FailureSignal};

/// Substrings (lowercase) that mark a timeout.
const TIMEOUT_PATTERNS: &[&str] = &["timeout", "timed out", "etimedout"];

/// Substrings (lowercase) that mark a transient network failure.
const NETWORK_PATTERNS: &[&str] = &[
    "network error",
    "connection error",
    "websocket connection error",
    "failed to fetch",
    "econnreset",
    "econnrefused",
];

/// High-level classification of a failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connect or read timed out.
    Timeout,
    /// Network-level failure (reset, refused, dropped socket).
    Network,
    /// Anything else; never retried.
    Fatal,
}

impl FailureKind {
    pub fn is_retriable(self) -> bool {
        !matches!(self, FailureKind::Fatal)
    }

    pub fn as_label(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::Fatal => "fatal",
        }
    }
}

/// Class of a WebSocket close code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseClass {
    /// 1000: clean shutdown.
    Normal,
    /// 1001: peer went away.
    GoingAway,
    /// 1002: protocol violation.
    Protocol,
    /// 1006: dropped without a close frame.
    Abnormal,
    /// 4001 / 4003: relay rejected or timed out authentication.
    Auth,
    /// Everything else.
    Unknown,
}

impl CloseClass {
    /// Only a dropped socket is worth reconnecting for.
    pub fn is_retriable(self) -> bool {
        matches!(self, CloseClass::Abnormal)
    }

    /// Normal closure or going-away: the peer ended the session on purpose.
    pub fn is_clean(self) -> bool {
        matches!(self, CloseClass::Normal | CloseClass::GoingAway)
    }
}

pub fn classify_close_code(code: u16) -> CloseClass {
    match code {
        close_code::NORMAL => CloseClass::Normal,
        close_code::GOING_AWAY => CloseClass::GoingAway,
        close_code::PROTOCOL_ERROR => CloseClass::Protocol,
        close_code::ABNORMAL => CloseClass::Abnormal,
        close_code::AUTH_TIMEOUT | close_code::INVALID_TOKEN => CloseClass::Auth,
        _ => CloseClass::Unknown,
    }
}

/// Classify an error message (case-insensitive substring match).
pub fn classify_message(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    if TIMEOUT_PATTERNS.iter().any(|p| lower.contains(p)) {
        return FailureKind::Timeout;
    }
    if NETWORK_PATTERNS.iter().any(|p| lower.contains(p)) {
        return FailureKind::Network;
    }
    FailureKind::Fatal
}

/// Classify any failure signal. Close events map through [`classify_close_code`];
/// non-error values are always fatal.
pub fn classify(signal: &FailureSignal) -> FailureKind {
    match signal {
        FailureSignal::Error { message } => classify_message(message),
        FailureSignal::Close { code, .. } if classify_close_code(*code).is_retriable() => {
            FailureKind::Network
        }
        FailureSignal::Close { .. } | FailureSignal::Opaque(_) | FailureSignal::Absent => {
            FailureKind::Fatal
        }
    }
}

/// Whether a thrown error is transient. Only error-like values with a
/// recognised message qualify; close events, plain strings and absent values
/// return `false`.
pub fn is_retriable_error(signal: &FailureSignal) -> bool {
    match signal {
        FailureSignal::Error { message } => classify_message(message).is_retriable(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(message: &str) -> FailureSignal {
        FailureSignal::error(message)
    }

    #[test]
    fn network_messages_retriable() {
        for m in [
            "Network error occurred",
            "Connection error",
            "WebSocket connection error",
            "Failed to fetch",
            "Connection timeout",
            "ECONNRESET",
            "ECONNREFUSED",
            "ETIMEDOUT",
            "request timed out after 10s",
        ] {
            assert!(is_retriable_error(&err(m)), "{m} should be retriable");
        }
    }

    #[test]
    fn fatal_messages_not_retriable() {
        for m in ["Authentication failed", "Invalid request", "Permission denied", ""] {
            assert!(!is_retriable_error(&err(m)), "{m} should not be retriable");
        }
    }

    #[test]
    fn non_error_values_not_retriable() {
        assert!(!is_retriable_error(&FailureSignal::Absent));
        assert!(!is_retriable_error(&FailureSignal::Opaque("string error".into())));
        // Even a network-sounding string is not an error object.
        assert!(!is_retriable_error(&FailureSignal::Opaque("network error".into())));
        assert!(!is_retriable_error(&FailureSignal::close(1006)));
    }

    #[test]
    fn message_kinds() {
        assert_eq!(classify_message("Connection timeout"), FailureKind::Timeout);
        assert_eq!(classify_message("read ECONNRESET"), FailureKind::Network);
        assert_eq!(classify_message("Authentication failed"), FailureKind::Fatal);
    }

    #[test]
    fn close_code_classes() {
        assert_eq!(classify_close_code(1000), CloseClass::Normal);
        assert_eq!(classify_close_code(1001), CloseClass::GoingAway);
        assert_eq!(classify_close_code(1002), CloseClass::Protocol);
        assert_eq!(classify_close_code(1006), CloseClass::Abnormal);
        assert_eq!(classify_close_code(4001), CloseClass::Auth);
        assert_eq!(classify_close_code(4003), CloseClass::Auth);
        assert_eq!(classify_close_code(1011), CloseClass::Unknown);
        assert!(classify_close_code(1006).is_retriable());
        assert!(!classify_close_code(1011).is_retriable());
    }

    #[test]
    fn classify_signal_shapes() {
        assert_eq!(classify(&FailureSignal::close(1006)), FailureKind::Network);
        assert_eq!(classify(&FailureSignal::close(4003)), FailureKind::Fatal);
        assert_eq!(classify(&FailureSignal::Absent), FailureKind::Fatal);
    }
}
