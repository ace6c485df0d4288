//! ArchiveLoader - zip アーカイブからハンドラを作る
//!
//! # フロー
//! 1. アーカイブを一時ディレクトリに展開
//! 2. ルート直下のエントリファイルを探す
//! 3. 子プロセスとして起動し、entry point を解決する
//! 4. 一時ディレクトリはロードの成否にかかわらず削除される（`TempDir` の drop）

use std::fs::File;
use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use super::process_handler::ProcessLauncher;
use crate::domain::{HandlerSpec, LoadError};
use crate::ports::{Handler, HandlerLoader};

pub struct ArchiveLoader {
    launcher: ProcessLauncher,
}

impl ArchiveLoader {
    pub fn new(launcher: ProcessLauncher) -> Self {
        Self { launcher }
    }
}

/// Extract every entry of the zip at `archive` into `dest`.
fn extract(archive: &Path, dest: &Path) -> Result<usize, LoadError> {
    let extract_err = |message: String| LoadError::Extract {
        path: archive.to_path_buf(),
        message,
    };

    let file = File::open(archive).map_err(|e| extract_err(e.to_string()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_err(e.to_string()))?;
    let entries = zip.len();
    zip.extract(dest).map_err(|e| extract_err(e.to_string()))?;
    Ok(entries)
}

#[async_trait]
impl HandlerLoader for ArchiveLoader {
    async fn resolve(&self, spec: &HandlerSpec) -> Result<Box<dyn Handler>, LoadError> {
        let HandlerSpec::Archive {
            path,
            entry_file,
            entry_point,
        } = spec
        else {
            return Err(LoadError::UnsupportedSpec(spec.kind()));
        };
        if !path.exists() {
            return Err(LoadError::ArchiveMissing { path: path.clone() });
        }

        let scratch = self.launcher.scratch_dir()?;

        let archive = path.clone();
        let dest = scratch.path().to_path_buf();
        let entries = tokio::task::spawn_blocking(move || extract(&archive, &dest))
            .await
            .map_err(|e| LoadError::Extract {
                path: path.clone(),
                message: format!("extraction task failed: {e}"),
            })??;

        let program = scratch.path().join(entry_file);
        if !program.is_file() {
            return Err(LoadError::EntryFileMissing {
                entry_file: entry_file.clone(),
            });
        }

        let handler = self
            .launcher
            .launch(scratch.path(), &program, entry_point)
            .await?;

        info!(
            archive = %path.display(),
            entries = entries,
            entry_file = %entry_file,
            entry_point = %entry_point,
            "archive handler loaded"
        );
        Ok(Box::new(handler))
    }
}
