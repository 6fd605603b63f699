//! # Pipeline Error Types
//!
//! Coded error model shared by every stage of the transaction pipeline.
//!
//! Error codes are five-nibble hexadecimal values. The leading non-zero nibbles of a
//! class code identify the class, so `08100` (Kafka connection) belongs to the
//! `08000` (connection) class and `01302` (nonce too low) belongs to `01300`
//! (invalid nonce). Control flow only ever looks at the class of a code; the
//! component path attached to an error is for logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Five-nibble error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub u64);

impl ErrorCode {
    // Warnings (class 01XXX)
    pub const WARNING: ErrorCode = ErrorCode(0x01000);
    pub const INVALID_NONCE: ErrorCode = ErrorCode(0x01300);
    pub const NONCE_TOO_HIGH: ErrorCode = ErrorCode(0x01301);
    pub const NONCE_TOO_LOW: ErrorCode = ErrorCode(0x01302);

    // Connection errors (class 08XXX)
    pub const CONNECTION: ErrorCode = ErrorCode(0x08000);
    pub const KAFKA_CONNECTION: ErrorCode = ErrorCode(0x08100);
    pub const HTTP_CONNECTION: ErrorCode = ErrorCode(0x08200);
    pub const ETH_CONNECTION: ErrorCode = ErrorCode(0x08300);
    pub const SERVICE_CONNECTION: ErrorCode = ErrorCode(0x08700);

    // Authentication errors (class 09XXX)
    pub const INVALID_AUTHENTICATION: ErrorCode = ErrorCode(0x09000);

    pub const FEATURE_NOT_SUPPORTED: ErrorCode = ErrorCode(0x0A000);

    // Invalid state (class 24XXX)
    pub const INVALID_STATE: ErrorCode = ErrorCode(0x24000);
    pub const CONFLICTED: ErrorCode = ErrorCode(0x24200);

    // Message errors (class 42XXX)
    pub const DATA: ErrorCode = ErrorCode(0x42000);
    pub const ENCODING: ErrorCode = ErrorCode(0x42100);
    pub const INVALID_FORMAT: ErrorCode = ErrorCode(0x42300);
    pub const INVALID_PARAMETER: ErrorCode = ErrorCode(0x42400);

    // Storage errors (class DBXXX)
    pub const STORAGE: ErrorCode = ErrorCode(0xDB000);
    pub const NOT_FOUND: ErrorCode = ErrorCode(0xDB200);

    pub const CONFIG: ErrorCode = ErrorCode(0xF0000);

    // Internal errors (class FFXXX)
    pub const INTERNAL: ErrorCode = ErrorCode(0xFF000);
    pub const DATA_CORRUPTED: ErrorCode = ErrorCode(0xFF100);
    pub const DEPENDENCY_FAILURE: ErrorCode = ErrorCode(0xFF200);

    /// Five upper-case hex digits, e.g. `42400`
    pub fn hex(&self) -> String {
        format!("{:05X}", self.0)
    }

    /// Check whether this code belongs to `class`
    ///
    /// The class width is given by the trailing zero nibbles of the class code.
    pub fn is_class(&self, class: ErrorCode) -> bool {
        if class.0 == 0 {
            return false;
        }

        let mut shift = 0;
        while (class.0 >> shift) & 0xF == 0 {
            shift += 4;
        }

        (self.0 >> shift) == (class.0 >> shift)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

/// Error carrying a code, a message and the component path it crossed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub struct CodedError {
    pub code: ErrorCode,
    pub message: String,
    pub component: String,
}

impl CodedError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            component: String::new(),
        }
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.component.is_empty() {
            write!(f, "{}: {}", self.code, self.message)
        } else {
            write!(f, "{}@{}: {}", self.code, self.component, self.message)
        }
    }
}

/// Error type returned by every pipeline operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The surrounding cancellation token fired
    #[error("context canceled")]
    Canceled,

    /// A call ran past its deadline
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Coded(#[from] CodedError),
}

impl PipelineError {
    fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Coded(CodedError::new(code, message))
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::WARNING, message)
    }

    pub fn invalid_nonce_warning(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::INVALID_NONCE, message)
    }

    pub fn nonce_too_high_warning(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::NONCE_TOO_HIGH, message)
    }

    pub fn nonce_too_low_warning(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::NONCE_TOO_LOW, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::CONNECTION, message)
    }

    pub fn kafka_connection(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::KAFKA_CONNECTION, message)
    }

    pub fn http_connection(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::HTTP_CONNECTION, message)
    }

    pub fn eth_connection(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::ETH_CONNECTION, message)
    }

    pub fn service_connection(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::SERVICE_CONNECTION, message)
    }

    pub fn invalid_authentication(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::INVALID_AUTHENTICATION, message)
    }

    pub fn feature_not_supported(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::FEATURE_NOT_SUPPORTED, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::INVALID_STATE, message)
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::ENCODING, message)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::INVALID_FORMAT, message)
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::INVALID_PARAMETER, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::NOT_FOUND, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::CONFIG, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::INTERNAL, message)
    }

    pub fn data_corrupted(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::DATA_CORRUPTED, message)
    }

    pub fn dependency_failure(message: impl Into<String>) -> Self {
        Self::coded(ErrorCode::DEPENDENCY_FAILURE, message)
    }

    /// Prefix the component path of a coded error (`"a"` then `"b"` gives `"b.a"`)
    pub fn extend_component(self, component: &str) -> Self {
        match self {
            Self::Coded(mut err) => {
                err.component = if err.component.is_empty() {
                    component.to_string()
                } else {
                    format!("{component}.{}", err.component)
                };
                Self::Coded(err)
            }
            other => other,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Coded(err) => Some(err.code),
            _ => None,
        }
    }

    fn is_class(&self, class: ErrorCode) -> bool {
        self.code().is_some_and(|code| code.is_class(class))
    }

    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::Canceled | Self::DeadlineExceeded)
    }

    pub fn is_connection_error(&self) -> bool {
        self.is_class(ErrorCode::CONNECTION)
    }

    pub fn is_dependency_failure(&self) -> bool {
        self.is_class(ErrorCode::DEPENDENCY_FAILURE)
    }

    pub fn is_invalid_nonce_warning(&self) -> bool {
        self.is_class(ErrorCode::INVALID_NONCE)
    }

    pub fn is_invalid_parameter(&self) -> bool {
        self.is_class(ErrorCode::INVALID_PARAMETER)
    }

    pub fn is_invalid_state(&self) -> bool {
        self.is_class(ErrorCode::INVALID_STATE)
    }

    pub fn is_not_found(&self) -> bool {
        self.is_class(ErrorCode::NOT_FOUND)
    }

    /// Coded form of this error, suitable for appending to an envelope
    pub fn to_coded(&self) -> CodedError {
        match self {
            Self::Coded(err) => err.clone(),
            Self::Canceled => CodedError::new(ErrorCode::INTERNAL, "context canceled"),
            Self::DeadlineExceeded => {
                CodedError::new(ErrorCode::INTERNAL, "context deadline exceeded")
            }
        }
    }
}

impl From<crate::config::ConfigurationError> for PipelineError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        PipelineError::configuration(err.to_string())
    }
}

pub type PipelineResult<T> = anyhow::Result<T, PipelineError>;
