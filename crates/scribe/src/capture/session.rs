//! Session identity of a captured conversation
//!
//! The identity comes from a query parameter on the transcript endpoint's
//! URL. The value is opaque: any non-empty string up to a generous length
//! bound is accepted as-is.

use thiserror::Error;
use url::Url;

use crate::error::{Result, ScribeError};

/// Upper bound on session ID length
const MAX_SESSION_ID_LEN: usize = 4096;

/// Errors that can occur during session ID validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionIdError {
    /// Session ID is empty
    #[error("Session ID cannot be empty")]
    Empty,

    /// Session ID exceeds maximum length
    #[error("Session ID exceeds maximum length of {MAX_SESSION_ID_LEN} bytes")]
    TooLong,
}

/// Opaque identity of one conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Get the session ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> std::result::Result<(), SessionIdError> {
        if s.is_empty() {
            return Err(SessionIdError::Empty);
        }

        if s.len() > MAX_SESSION_ID_LEN {
            return Err(SessionIdError::TooLong);
        }

        Ok(())
    }
}

impl TryFrom<&str> for SessionId {
    type Error = SessionIdError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Self::validate(value)?;
        Ok(SessionId(value.to_string()))
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionIdError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::validate(&value)?;
        Ok(SessionId(value))
    }
}

impl From<SessionId> for String {
    fn from(session_id: SessionId) -> Self {
        session_id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read the session identity from `param` on a response URL
pub fn extract_session_id(url: &Url, param: &str) -> Result<SessionId> {
    let raw = url
        .query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| {
            ScribeError::SessionIdExtraction(format!("no '{param}' parameter in {url}"))
        })?;

    SessionId::try_from(raw)
        .map_err(|e| ScribeError::SessionIdExtraction(format!("'{param}' in {url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_session_ids() {
        assert!(SessionId::try_from("0f3c9a1e-6b2d-4c8e-9f10-2a3b4c5d6e7f").is_ok());
        assert!(SessionId::try_from("PROJECT_123").is_ok());
        assert!(SessionId::try_from("a").is_ok());
    }

    #[test]
    fn test_empty_session_id() {
        let result = SessionId::try_from("");
        assert!(matches!(result, Err(SessionIdError::Empty)));
    }

    #[test]
    fn test_session_id_is_opaque() {
        for id in ["abc.def", "a+b", "has spaces", "test@email", "x~y", "中文"] {
            assert_eq!(SessionId::try_from(id).unwrap().as_str(), id);
        }
        assert!(SessionId::try_from("x".repeat(200)).is_ok());
    }

    #[test]
    fn test_session_id_length_limit() {
        let max_id = "a".repeat(4096);
        assert!(SessionId::try_from(max_id.as_str()).is_ok());

        let long_id = "a".repeat(4097);
        assert!(matches!(
            SessionId::try_from(long_id.as_str()),
            Err(SessionIdError::TooLong)
        ));
    }

    #[test]
    fn test_conversions() {
        let session_id = SessionId::try_from("test-id").unwrap();
        assert_eq!(session_id.as_str(), "test-id");
        assert_eq!(session_id.as_ref(), "test-id");
        assert_eq!(format!("{}", session_id), "test-id");
        let s: String = session_id.into();
        assert_eq!(s, "test-id");
    }

    #[test]
    fn test_extract_session_id_from_query() {
        let url = Url::parse(
            "https://chat.deepseek.com/api/v0/chat/history_messages?chat_session_id=abc-123&cache_version=7",
        )
        .unwrap();
        let id = extract_session_id(&url, "chat_session_id").unwrap();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn test_extract_session_id_missing_param() {
        let url = Url::parse("https://chat.deepseek.com/api/v0/chat/history_messages").unwrap();
        let err = extract_session_id(&url, "chat_session_id").unwrap_err();
        assert!(matches!(err, ScribeError::SessionIdExtraction(_)));
    }

    #[test]
    fn test_extract_session_id_empty_value() {
        let url = Url::parse("https://x.test/history_messages?chat_session_id=").unwrap();
        assert!(extract_session_id(&url, "chat_session_id").is_err());
    }

    #[test]
    fn test_extract_session_id_accepts_punctuation_and_escapes() {
        let url = Url::parse("https://x.test/history_messages?chat_session_id=abc.def").unwrap();
        assert_eq!(
            extract_session_id(&url, "chat_session_id").unwrap().as_str(),
            "abc.def"
        );

        let url = Url::parse("https://x.test/history_messages?chat_session_id=a%2Bb").unwrap();
        assert_eq!(
            extract_session_id(&url, "chat_session_id").unwrap().as_str(),
            "a+b"
        );
    }
}
