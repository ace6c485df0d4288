//! Handler specs: where the handler program comes from.
//!
//! A spec is resolved once at startup and never changes afterwards.

use std::path::PathBuf;

/// The two delivery forms of a handler program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerSpec {
    /// Program text supplied directly through configuration.
    Inline { code: String, entry_point: String },

    /// A zip archive whose root contains `entry_file`.
    Archive {
        path: PathBuf,
        entry_file: String,
        entry_point: String,
    },
}

impl HandlerSpec {
    pub fn inline(code: impl Into<String>, entry_point: impl Into<String>) -> Self {
        HandlerSpec::Inline {
            code: code.into(),
            entry_point: entry_point.into(),
        }
    }

    pub fn archive(
        path: impl Into<PathBuf>,
        entry_file: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        HandlerSpec::Archive {
            path: path.into(),
            entry_file: entry_file.into(),
            entry_point: entry_point.into(),
        }
    }

    pub fn entry_point(&self) -> &str {
        match self {
            HandlerSpec::Inline { entry_point, .. } | HandlerSpec::Archive { entry_point, .. } => {
                entry_point
            }
        }
    }

    /// Short label used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerSpec::Inline { .. } => "inline",
            HandlerSpec::Archive { .. } => "archive",
        }
    }
}
