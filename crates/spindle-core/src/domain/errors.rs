//! Errors - エラー型とフェーズ分類
//!
//! 起動時エラー（ConfigError / LoadError）は致命的で、ループに入る前にプロセスを終了させる。
//! ループ中のエラーは `RuntimeError` にまとめ、どのフェーズ（poll / invoke / publish）で
//! 失敗したかを必ず保持する。

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::ports::StoreError;

/// Phase は失敗したランタイムの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Configure,
    Load,
    Poll,
    Invoke,
    Publish,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Configure => "configure",
            Phase::Load => "load",
            Phase::Poll => "poll",
            Phase::Invoke => "invoke",
            Phase::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Bad or missing configuration, detected before the loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("no handler available: archive {archive} does not exist and INLINE_CODE is empty")]
    NoHandlerSource { archive: String },
}

/// Handler resolution failure.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("inline program is empty")]
    EmptyProgram,

    #[error("loader cannot handle a {0} handler spec")]
    UnsupportedSpec(&'static str),

    #[error("failed to prepare scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("archive {path} does not exist")]
    ArchiveMissing { path: PathBuf },

    #[error("failed to extract archive {path}: {message}")]
    Extract { path: PathBuf, message: String },

    #[error("entry file '{entry_file}' not found at the archive root")]
    EntryFileMissing { entry_file: String },

    #[error("failed to start handler program with '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("handler program failed to load: {0}")]
    Program(String),

    #[error("entry point '{entry_point}' could not be resolved: {message}")]
    EntryPoint { entry_point: String, message: String },

    #[error("handler program exited during load ({status})")]
    Exited { status: String },

    #[error("handler program broke the load handshake: {0}")]
    Protocol(String),
}

/// Malformed structured data read from the input cell.
#[derive(Debug, Error)]
#[error("input is not valid JSON: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// A handler result that could not be encoded for the output cell.
#[derive(Debug, Error)]
#[error("result could not be encoded as JSON: {0}")]
pub struct EncodeError(#[from] pub serde_json::Error);

/// The handler failed while processing one event.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("handler raised: {0}")]
    Raised(String),

    #[error("handler program exited ({status})")]
    Exited { status: String },

    #[error("handler program sent an invalid reply: {0}")]
    Protocol(String),

    #[error("handler program I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that stop the runtime. Every variant maps to exactly one phase.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("configure phase failed: {0}")]
    Configuration(#[from] ConfigError),

    #[error("load phase failed: {0}")]
    Load(#[from] LoadError),

    #[error("poll phase failed: cannot connect to store: {0}")]
    Connect(#[source] StoreError),

    #[error("poll phase failed: {0}")]
    Poll(#[source] StoreError),

    #[error("invoke phase failed: {0}")]
    Invocation(#[from] InvocationError),

    #[error("publish phase failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("publish phase failed: {0}")]
    Publish(#[source] StoreError),
}

impl RuntimeError {
    pub fn phase(&self) -> Phase {
        match self {
            RuntimeError::Configuration(_) => Phase::Configure,
            RuntimeError::Load(_) => Phase::Load,
            RuntimeError::Connect(_) | RuntimeError::Poll(_) => Phase::Poll,
            RuntimeError::Invocation(_) => Phase::Invoke,
            RuntimeError::Encode(_) | RuntimeError::Publish(_) => Phase::Publish,
        }
    }
}
