use thiserror::Error;

/// Main error type for the tuner
#[derive(Error, Debug)]
pub enum TunerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Variable name already in use: {name}")]
    DuplicateName { name: String },

    #[error("Unknown search strategy: {strategy}")]
    UnknownStrategy { strategy: String },

    #[error("Variable not found: {name}")]
    VariableNotFound { name: String },

    #[error("No score recorded for assignment {assignment}")]
    MissingScore { assignment: String },

    #[error("Reduction error: {message}")]
    Reduction { message: String },

    /// The search bookkeeping reached a state its invariants rule out.
    #[error("Unreachable search state for {variable}: {message}")]
    Unreachable { variable: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TunerError {
    /// True for errors caused by caller-supplied configuration rather than
    /// by a bug in the search bookkeeping.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::DuplicateName { .. } | Self::UnknownStrategy { .. }
        )
    }
}

/// Result type alias for tuner operations
pub type TunerResult<T> = Result<T, TunerError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::TunerError::Config(format!($($arg)*))
    };
}

/// Macro for creating unreachable-state errors for a named variable
#[macro_export]
macro_rules! unreachable_state {
    ($variable:expr, $($arg:tt)*) => {
        $crate::TunerError::Unreachable {
            variable: $variable.to_string(),
            message: format!($($arg)*),
        }
    };
}
