//! Ошибки библиотеки

use crate::device::DeviceType;
use crate::opencl::utils::status_name;
use std::fmt;

/// Результат операций oclgpu
pub type Result<T> = std::result::Result<T, Error>;

/// Этап конвейера, на котором отказал нативный вызов
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Platform,
    Device,
    Context,
    Compile,
    Queue,
    Kernel,
    Allocate,
    Transfer,
    Dispatch,
    Query,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Platform => "platform lookup",
            Stage::Device => "device lookup",
            Stage::Context => "context creation",
            Stage::Compile => "program compilation",
            Stage::Queue => "command queue creation",
            Stage::Kernel => "kernel resolution",
            Stage::Allocate => "memory allocation",
            Stage::Transfer => "host/device transfer",
            Stage::Dispatch => "kernel dispatch",
            Stage::Query => "info query",
        };
        f.write_str(name)
    }
}

/// Ошибки oclgpu
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported constant type `{0}`: expected an integer or floating point scalar")]
    UnsupportedType(&'static str),

    #[error("platform index {index} out of range ({available} available)")]
    PlatformNotFound { index: usize, available: usize },

    #[error("device index {index} out of range ({available} {kind} devices available)")]
    DeviceNotFound {
        index: usize,
        available: usize,
        kind: DeviceType,
    },

    #[error("{stage} failed: {call} returned {code} ({})", status_name(*.code))]
    Api {
        stage: Stage,
        call: &'static str,
        code: i32,
    },

    #[error("kernel compilation failed with {code} ({}):\n{log}", status_name(*.code))]
    Build { code: i32, log: String },

    #[error("invalid name: {0}")]
    InvalidName(#[from] std::ffi::NulError),

    #[error("array lengths must match: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("image dimensions must match: expected {expected:?}, got {actual:?}")]
    ImageMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("no {0} argument passed as input")]
    MissingData(&'static str),

    #[error("destination holds {actual} bytes but the buffer holds {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("buffer holds {actual}, cannot read it as {expected}")]
    WrongExtent {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("invalid work size: {0}")]
    InvalidWorkSize(String),

    #[error("kernel `{kernel}` takes {expected} arguments, {actual} given")]
    ArgumentCount {
        kernel: String,
        expected: usize,
        actual: usize,
    },

    #[error("argument {0} is a buffer created by a different program")]
    ForeignBuffer(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn api(stage: Stage, call: &'static str, code: i32) -> Self {
        Error::Api { stage, call, code }
    }

    /// Этап нативного вызова, если ошибка пришла из OpenCL
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Api { stage, .. } => Some(*stage),
            Error::Build { .. } => Some(Stage::Compile),
            Error::PlatformNotFound { .. } => Some(Stage::Platform),
            Error::DeviceNotFound { .. } => Some(Stage::Device),
            _ => None,
        }
    }

    /// Нативный код возврата, если он есть
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Api { code, .. } | Error::Build { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_names_the_status() {
        let err = Error::api(Stage::Transfer, "clEnqueueReadBuffer", -30);
        assert_eq!(
            err.to_string(),
            "host/device transfer failed: clEnqueueReadBuffer returned -30 (CL_INVALID_VALUE)"
        );
        assert_eq!(err.stage(), Some(Stage::Transfer));
        assert_eq!(err.code(), Some(-30));
    }

    #[test]
    fn build_error_carries_log() {
        let err = Error::Build {
            code: -11,
            log: "error: use of undeclared identifier 'x'".into(),
        };
        let text = err.to_string();
        assert!(text.contains("CL_BUILD_PROGRAM_FAILURE"));
        assert!(text.ends_with("use of undeclared identifier 'x'"));
        assert_eq!(err.stage(), Some(Stage::Compile));
    }

    #[test]
    fn length_mismatch_message() {
        let err = Error::LengthMismatch {
            expected: 4,
            actual: 3,
        };
        assert!(err.to_string().starts_with("array lengths must match"));
        assert_eq!(err.stage(), None);
    }
}
