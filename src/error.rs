// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the session layer, preserving the failure kind for UI display.

use serde_json::Value;

/// Session and API error type.
///
/// `Clone` so a single refresh outcome can be handed to every request
/// waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Session invalid or expired")]
    Unauthorized { message: Option<String> },

    #[error("Access denied")]
    Forbidden { message: Option<String> },

    #[error("API error (HTTP {status})")]
    Api { status: u16, message: Option<String> },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unexpected API response: {0}")]
    MalformedResponse(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("No active session")]
    NotAuthenticated,
}

/// Coarse error classification consumed by UI code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Unauthorized,
    Forbidden,
    Validation,
    Other,
}

/// Fallback text shown when the API gives no usable message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Ocurrió un error inesperado";

impl AuthError {
    /// Build an error from a non-success HTTP status and its raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 => AuthError::Unauthorized { message },
            403 => AuthError::Forbidden { message },
            _ => AuthError::Api { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Network(_) => ErrorKind::Network,
            AuthError::Unauthorized { .. } | AuthError::NotAuthenticated => {
                ErrorKind::Unauthorized
            }
            AuthError::Forbidden { .. } => ErrorKind::Forbidden,
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::Api { .. } | AuthError::MalformedResponse(_) | AuthError::Storage(_) => {
                ErrorKind::Other
            }
        }
    }

    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Unauthorized { .. } => Some(401),
            AuthError::Forbidden { .. } => Some(403),
            AuthError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Unauthorized { .. })
    }

    /// Message suitable for display, falling back to `default`.
    pub fn user_message(&self, default: &str) -> String {
        let message = match self {
            AuthError::Unauthorized { message }
            | AuthError::Forbidden { message }
            | AuthError::Api { message, .. } => message.clone(),
            AuthError::Validation(msg) => Some(msg.clone()),
            _ => None,
        };

        message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    /// Replace the API-provided message, keeping the kind.
    pub(crate) fn with_message(self, text: &str) -> Self {
        let message = Some(text.to_string());
        match self {
            AuthError::Unauthorized { .. } => AuthError::Unauthorized { message },
            AuthError::Forbidden { .. } => AuthError::Forbidden { message },
            AuthError::Api { status, .. } => AuthError::Api { status, message },
            other => other,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuthError::MalformedResponse(err.to_string())
        } else {
            AuthError::Network(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort_unstable();
        AuthError::Validation(format!("invalid fields: {}", fields.join(", ")))
    }
}

/// Pull a human-readable message out of an API error body.
///
/// The API is not consistent about where it puts the text, so this checks
/// `mensaje`, `message`, `error.mensaje`, `error.message`, and a bare
/// string `error`, in that order.
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let direct = |v: &Value| {
        v.get("mensaje")
            .or_else(|| v.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    direct(&value).or_else(|| match value.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(inner @ Value::Object(_)) => direct(inner),
        _ => None,
    })
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_preserves_kind() {
        let err = AuthError::from_status(401, r#"{"mensaje":"Token expirado"}"#);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.user_message("x"), "Token expirado");

        let err = AuthError::from_status(403, "");
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.status(), Some(403));

        let err = AuthError::from_status(500, "oops");
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_extract_message_locations() {
        assert_eq!(
            extract_message(r#"{"message":"Email ya registrado"}"#).as_deref(),
            Some("Email ya registrado")
        );
        assert_eq!(
            extract_message(r#"{"error":{"mensaje":"Credenciales inválidas"}}"#).as_deref(),
            Some("Credenciales inválidas")
        );
        assert_eq!(
            extract_message(r#"{"error":"bad_request"}"#).as_deref(),
            Some("bad_request")
        );
        assert_eq!(extract_message("<html>502</html>"), None);
        assert_eq!(extract_message(r#"{"ok":false}"#), None);
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = AuthError::Network("connection refused".to_string());
        assert_eq!(err.user_message(DEFAULT_ERROR_MESSAGE), DEFAULT_ERROR_MESSAGE);

        let err = AuthError::Api {
            status: 500,
            message: Some("   ".to_string()),
        };
        assert_eq!(err.user_message("fallback"), "fallback");
    }

    #[test]
    fn test_with_message_keeps_kind() {
        let err = AuthError::from_status(403, "{}").with_message("Acceso denegado");
        assert!(matches!(err, AuthError::Forbidden { .. }));
        assert_eq!(err.user_message("x"), "Acceso denegado");

        let err = AuthError::Network("down".into()).with_message("ignored");
        assert!(matches!(err, AuthError::Network(_)));
    }
}
