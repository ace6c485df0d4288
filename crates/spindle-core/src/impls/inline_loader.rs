//! InlineLoader - 設定で渡されたプログラム本文からハンドラを作る
//!
//! # フロー
//! 1. 専用の一時ディレクトリを作る（名前空間の分離）
//! 2. 本文を 1 つのファイルとして書き出す
//! 3. 子プロセスとして起動し、entry point を解決する
//! 4. 成否にかかわらず一時ディレクトリは削除される

use async_trait::async_trait;
use tracing::info;

use super::process_handler::ProcessLauncher;
use crate::domain::{HandlerSpec, LoadError};
use crate::ports::{Handler, HandlerLoader};

/// File name the inline program is written to.
const INLINE_PROGRAM_FILE: &str = "inline";

pub struct InlineLoader {
    launcher: ProcessLauncher,
}

impl InlineLoader {
    pub fn new(launcher: ProcessLauncher) -> Self {
        Self { launcher }
    }
}

#[async_trait]
impl HandlerLoader for InlineLoader {
    async fn resolve(&self, spec: &HandlerSpec) -> Result<Box<dyn Handler>, LoadError> {
        let HandlerSpec::Inline { code, entry_point } = spec else {
            return Err(LoadError::UnsupportedSpec(spec.kind()));
        };
        if code.trim().is_empty() {
            return Err(LoadError::EmptyProgram);
        }

        let scratch = self.launcher.scratch_dir()?;
        let program = scratch.path().join(INLINE_PROGRAM_FILE);
        tokio::fs::write(&program, code)
            .await
            .map_err(LoadError::Scratch)?;

        let handler = self
            .launcher
            .launch(scratch.path(), &program, entry_point)
            .await?;

        info!(
            entry_point = %entry_point,
            interpreter = %self.launcher.interpreter(),
            bytes = code.len(),
            "inline handler loaded"
        );
        Ok(Box::new(handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExecutionContext;
    use crate::test_support::{
        ECHO_HANDLER, PY_IDENTITY, entry_count, python_available, python_launcher, sh_launcher,
    };
    use serde_json::json;

    #[tokio::test]
    async fn valid_program_yields_a_callable_handler() {
        let loader = InlineLoader::new(sh_launcher());
        let mut handler = loader
            .resolve(&HandlerSpec::inline(ECHO_HANDLER, "handler"))
            .await
            .unwrap();

        let out = handler
            .call(json!({ "cpu0": 1 }), &mut ExecutionContext::new())
            .await
            .unwrap();
        assert_eq!(out, json!({ "cpu0": 1 }));
    }

    #[tokio::test]
    async fn plain_python_handler_loads_with_default_launcher() {
        if !python_available() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let loader = InlineLoader::new(python_launcher().with_scratch_root(root.path()));

        let mut handler = loader
            .resolve(&HandlerSpec::inline(PY_IDENTITY, "handler"))
            .await
            .unwrap();
        assert_eq!(entry_count(root.path()), 0);

        let out = handler
            .call(json!({ "cpu0": 12.5 }), &mut ExecutionContext::new())
            .await
            .unwrap();
        assert_eq!(out, json!({ "cpu0": 12.5 }));
    }

    #[tokio::test]
    async fn python_handler_without_the_entry_point_is_a_load_error() {
        if !python_available() {
            return;
        }
        let loader = InlineLoader::new(python_launcher());
        let result = loader
            .resolve(&HandlerSpec::inline(PY_IDENTITY, "process"))
            .await;
        assert!(matches!(result, Err(LoadError::EntryPoint { .. })));
    }

    #[tokio::test]
    async fn missing_entry_point_is_a_load_error() {
        let loader = InlineLoader::new(sh_launcher());
        let result = loader
            .resolve(&HandlerSpec::inline(ECHO_HANDLER, "does_not_exist"))
            .await;
        assert!(matches!(result, Err(LoadError::EntryPoint { .. })));
    }

    #[tokio::test]
    async fn empty_program_is_rejected_before_spawning() {
        let loader = InlineLoader::new(sh_launcher());
        let result = loader.resolve(&HandlerSpec::inline("  \n", "handler")).await;
        assert!(matches!(result, Err(LoadError::EmptyProgram)));
    }

    #[tokio::test]
    async fn archive_spec_is_not_accepted() {
        let loader = InlineLoader::new(sh_launcher());
        let result = loader
            .resolve(&HandlerSpec::archive("/tmp/f.zip", "main", "handler"))
            .await;
        assert!(matches!(result, Err(LoadError::UnsupportedSpec("archive"))));
    }

    #[tokio::test]
    async fn scratch_directory_is_removed_after_load() {
        let root = tempfile::tempdir().unwrap();
        let loader = InlineLoader::new(sh_launcher().with_scratch_root(root.path()));

        let handler = loader
            .resolve(&HandlerSpec::inline(ECHO_HANDLER, "handler"))
            .await
            .unwrap();
        assert_eq!(entry_count(root.path()), 0);

        let failed = loader
            .resolve(&HandlerSpec::inline(ECHO_HANDLER, "nope"))
            .await;
        assert!(failed.is_err());
        assert_eq!(entry_count(root.path()), 0);
        drop(handler);
    }
}
