use std::fmt;

/// Every failure in the load → decode → preprocess → classify path.
///
/// The HTTP boundary flattens all of these into one `{"error": ...}` reply;
/// the variants exist for logging and for the optional strict status mode.
#[derive(Debug)]
pub enum EmotionError {
    /// The request body was not the expected shape (bad JSON, missing field,
    /// not a data URL, too large).
    Request(String),
    Base64(base64::DecodeError),
    Decode(String),
    EmptyFrame,
    Shape { expected: usize, actual: usize },
    Model(String),
    Config(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl EmotionError {
    /// True when the caller sent something unusable, false when the fault is
    /// on the server side (model, I/O, configuration).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EmotionError::Request(_)
                | EmotionError::Base64(_)
                | EmotionError::Decode(_)
                | EmotionError::EmptyFrame
        )
    }
}

impl fmt::Display for EmotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmotionError::Request(msg) => write!(f, "invalid request: {msg}"),
            EmotionError::Base64(err) => write!(f, "invalid base64 payload: {err}"),
            EmotionError::Decode(msg) => write!(f, "could not decode image: {msg}"),
            EmotionError::EmptyFrame => write!(f, "image frame is empty"),
            EmotionError::Shape { expected, actual } => {
                write!(f, "shape mismatch: expected {expected} values, got {actual}")
            }
            EmotionError::Model(msg) => write!(f, "model error: {msg}"),
            EmotionError::Config(msg) => write!(f, "config error: {msg}"),
            EmotionError::Io(err) => write!(f, "io error: {err}"),
            EmotionError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for EmotionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EmotionError::Base64(err) => Some(err),
            EmotionError::Io(err) => Some(err),
            EmotionError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EmotionError {
    fn from(err: std::io::Error) -> Self {
        EmotionError::Io(err)
    }
}

impl From<serde_json::Error> for EmotionError {
    fn from(err: serde_json::Error) -> Self {
        EmotionError::Json(err)
    }
}

impl From<base64::DecodeError> for EmotionError {
    fn from(err: base64::DecodeError) -> Self {
        EmotionError::Base64(err)
    }
}

impl From<image::ImageError> for EmotionError {
    fn from(err: image::ImageError) -> Self {
        EmotionError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EmotionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(EmotionError::Request("x".into()).is_client_error());
        assert!(EmotionError::EmptyFrame.is_client_error());
        assert!(EmotionError::Decode("bad".into()).is_client_error());
        assert!(!EmotionError::Model("nan".into()).is_client_error());
        assert!(!EmotionError::Shape { expected: 4096, actual: 12 }.is_client_error());
    }

    #[test]
    fn display_includes_detail() {
        let err = EmotionError::Shape { expected: 4096, actual: 10 };
        assert_eq!(err.to_string(), "shape mismatch: expected 4096 values, got 10");
    }
}
