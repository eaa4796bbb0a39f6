use wasm_bindgen::JsValue;

/// Everything that can reject an action. None of these are fatal: the
/// caller shows the message and the state stays where it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AcademyError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("unknown module {0}")]
    UnknownModule(u32),

    #[error("unknown quiz '{0}'")]
    UnknownQuiz(String),

    #[error("catalog decode failed: {0}")]
    Catalog(String),

    #[error("config decode failed: {0}")]
    Config(String),

    #[error("invalid transition from {from} on {action}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error("payment gateway: {0}")]
    Gateway(String),

    #[error("identity provider: {0}")]
    Identity(String),
}

impl AcademyError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AcademyError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<AcademyError> for JsValue {
    fn from(e: AcademyError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
