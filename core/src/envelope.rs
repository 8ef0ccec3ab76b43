//! The JSON envelope wrapped around every API payload.
//!
//! ```json
//! {"responseCode":200,"message":"success","content":{...},"duration":"12ms"}
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Outer object of a JSON response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub response_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

impl Envelope {
    /// Parse a body as an envelope, or `None` if it is not one.
    pub fn from_slice(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }
}

/// Extract the `content` field of a JSON envelope and re-serialize it.
///
/// Sibling fields are ignored. A missing `content` yields `null`. Bodies
/// that are not JSON objects fail with `UnexpectedResponse`.
pub fn unwrap_content(body: &[u8]) -> Result<Vec<u8>, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::UnexpectedResponse)?;
    let Value::Object(mut object) = value else {
        return Err(ApiError::UnexpectedResponse);
    };
    let content = object.remove("content").unwrap_or(Value::Null);
    Ok(serde_json::to_vec(&content)?)
}

/// Best-effort human-readable message for a failed response body.
pub(crate) fn error_message(body: &[u8]) -> String {
    if let Some(message) = Envelope::from_slice(body).and_then(|e| e.message) {
        return message;
    }
    String::from_utf8_lossy(body).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_unwrapped_independent_of_siblings() {
        let body = br#"{"content": {"id": 42}, "responseCode": 200}"#;
        assert_eq!(unwrap_content(body).unwrap(), br#"{"id":42}"#);
    }

    #[test]
    fn array_content_is_preserved() {
        let body = br#"{"responseCode":200,"message":"success","content":[1,"two",null]}"#;
        assert_eq!(unwrap_content(body).unwrap(), br#"[1,"two",null]"#);
    }

    #[test]
    fn missing_content_is_null() {
        assert_eq!(unwrap_content(br#"{"responseCode":200}"#).unwrap(), b"null");
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(matches!(
            unwrap_content(b"[1,2,3]"),
            Err(ApiError::UnexpectedResponse)
        ));
    }

    #[test]
    fn non_json_is_rejected() {
        assert!(matches!(
            unwrap_content(b"<html>gateway timeout</html>"),
            Err(ApiError::UnexpectedResponse)
        ));
    }

    #[test]
    fn error_message_prefers_envelope_message() {
        let body = br#"{"responseCode":401,"message":"You're not authorized","content":""}"#;
        assert_eq!(error_message(body), "You're not authorized");
        assert_eq!(error_message(b"  Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn envelope_parses_metadata() {
        let body = br#"{"responseCode":400,"message":"draw-pdf-answers Request Failed","content":"","duration":"98.08ms","info":"https:\/\/api.jotform.com\/docs"}"#;
        let envelope = Envelope::from_slice(body).unwrap();
        assert_eq!(envelope.response_code, Some(400));
        assert_eq!(envelope.duration.as_deref(), Some("98.08ms"));
        assert_eq!(envelope.info.as_deref(), Some("https://api.jotform.com/docs"));
        assert_eq!(envelope.content, Value::String(String::new()));
    }
}
