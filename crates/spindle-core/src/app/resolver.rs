//! HandlerSource resolver - 設定からハンドラの供給元を決める
//!
//! 起動時に 1 回だけ判断し、以後は再評価しない。
//! - ARCHIVE_PATH が存在する → Archive
//! - そうでなければ INLINE_CODE → Inline
//! - どちらも使えなければ ConfigError

use std::path::Path;

use tracing::info;

use super::config::RuntimeConfig;
use crate::domain::{ConfigError, HandlerSpec, LoadError};
use crate::impls::{ArchiveLoader, InlineLoader, ProcessLauncher};
use crate::ports::{Handler, HandlerLoader};

/// Decide where the handler comes from.
pub fn resolve_source(config: &RuntimeConfig) -> Result<HandlerSpec, ConfigError> {
    let archive = config.archive_path.trim();
    if !archive.is_empty() && Path::new(archive).exists() {
        info!(archive = %archive, "using handler from archive");
        return Ok(HandlerSpec::archive(
            archive,
            config.entry_file.clone(),
            config.entry_point.clone(),
        ));
    }

    if config.inline_code.trim().is_empty() {
        return Err(ConfigError::NoHandlerSource {
            archive: config.archive_path.clone(),
        });
    }

    info!("using handler from inline code");
    Ok(HandlerSpec::inline(
        config.inline_code.clone(),
        config.entry_point.clone(),
    ))
}

/// Dispatch `spec` to the loader for its variant.
pub async fn load_handler(
    spec: &HandlerSpec,
    launcher: ProcessLauncher,
) -> Result<Box<dyn Handler>, LoadError> {
    let loader: Box<dyn HandlerLoader> = match spec {
        HandlerSpec::Inline { .. } => Box::new(InlineLoader::new(launcher)),
        HandlerSpec::Archive { .. } => Box::new(ArchiveLoader::new(launcher)),
    };
    loader.resolve(spec).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExecutionContext;
    use crate::test_support::{
        ECHO_HANDLER, PY_IDENTITY, python_available, sh_launcher, write_archive,
    };
    use serde_json::json;

    fn config(pairs: &[(&str, &str)]) -> RuntimeConfig {
        RuntimeConfig::from_pairs(pairs.iter().map(|(k, v)| (*k, *v))).unwrap()
    }

    #[test]
    fn existing_archive_wins_over_inline_code() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("function.zip");
        write_archive(&archive, &[("main.py", PY_IDENTITY)]);
        let archive = archive.to_str().unwrap();

        let cfg = config(&[("ARCHIVE_PATH", archive), ("INLINE_CODE", "ignored")]);

        assert_eq!(
            resolve_source(&cfg).unwrap(),
            HandlerSpec::archive(archive, "main.py", "handler")
        );
    }

    #[test]
    fn missing_archive_falls_back_to_inline() {
        let cfg = config(&[
            ("ARCHIVE_PATH", "/definitely/not/here.zip"),
            ("INLINE_CODE", "echo hi"),
            ("ENTRY_POINT", "run"),
        ]);

        assert_eq!(
            resolve_source(&cfg).unwrap(),
            HandlerSpec::inline("echo hi", "run")
        );
    }

    #[test]
    fn nothing_usable_is_a_configuration_error() {
        let cfg = config(&[("ARCHIVE_PATH", "/definitely/not/here.zip")]);
        let err = resolve_source(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::NoHandlerSource { .. }));
        assert!(err.to_string().contains("/definitely/not/here.zip"));
    }

    #[tokio::test]
    async fn load_handler_dispatches_by_variant() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("function.zip");
        write_archive(&archive, &[("main", ECHO_HANDLER)]);

        for spec in [
            HandlerSpec::inline(ECHO_HANDLER, "handler"),
            HandlerSpec::archive(&archive, "main", "handler"),
        ] {
            let mut handler = load_handler(&spec, sh_launcher()).await.unwrap();
            let out = handler
                .call(json!({ "kind": spec.kind() }), &mut ExecutionContext::new())
                .await
                .unwrap();
            assert_eq!(out, json!({ "kind": spec.kind() }));
        }
    }

    #[tokio::test]
    async fn default_settings_load_a_plain_inline_function() {
        if !python_available() {
            return;
        }
        let cfg = config(&[
            ("ARCHIVE_PATH", "/definitely/not/here.zip"),
            ("INLINE_CODE", PY_IDENTITY),
        ]);

        let spec = resolve_source(&cfg).unwrap();
        let mut handler = load_handler(&spec, cfg.launcher().unwrap()).await.unwrap();

        let out = handler
            .call(json!({ "cpu0": 12.5, "cpu1": 44.0 }), &mut ExecutionContext::new())
            .await
            .unwrap();
        assert_eq!(out, json!({ "cpu0": 12.5, "cpu1": 44.0 }));
    }
}
