use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while compiling a syntax definition.
///
/// Analysis itself is infallible once a rule is compiled; every failure mode
/// lives in the compiler. Each variant carries a context string (field name,
/// pattern text, or file path) and maps to a stable integer code via
/// [`SyntaxError::code`] for host bindings.
pub enum SyntaxError {
    #[error("syntax definition is not valid JSON: {0}")]
    /// The input is not well-formed JSON.
    JsonInvalid(String),

    #[error("missing required property: {0}")]
    /// A required field is absent.
    PropertyMissed(String),

    #[error("invalid property: {0}")]
    /// A field has the wrong type or shape.
    PropertyInvalid(String),

    #[error("invalid pattern: {0}")]
    /// A token pattern or merged state pattern was rejected by the regex
    /// backend.
    PatternInvalid(String),

    #[error("unknown state reference: {0}")]
    /// A `state`, `subState`, `onLineEndState` or `importSyntax` reference
    /// could not be resolved.
    StateInvalid(String),

    #[error("file does not exist: {0}")]
    /// The file form was given a path that does not exist.
    FileNotExists(String),

    #[error("file is unreadable or empty: {0}")]
    /// The file could not be read, or its content was empty.
    FileInvalid(String),
}

impl SyntaxError {
    /// Stable integer code for host bindings.
    pub fn code(&self) -> i32 {
        match self {
            Self::PropertyMissed(_) => -1,
            Self::PropertyInvalid(_) => -2,
            Self::PatternInvalid(_) => -3,
            Self::StateInvalid(_) => -4,
            Self::JsonInvalid(_) => -5,
            Self::FileNotExists(_) => -6,
            Self::FileInvalid(_) => -7,
        }
    }

    /// The context string carried by the error (field name, pattern text, or
    /// file path).
    pub fn context(&self) -> &str {
        match self {
            Self::JsonInvalid(s)
            | Self::PropertyMissed(s)
            | Self::PropertyInvalid(s)
            | Self::PatternInvalid(s)
            | Self::StateInvalid(s)
            | Self::FileNotExists(s)
            | Self::FileInvalid(s) => s,
        }
    }
}
