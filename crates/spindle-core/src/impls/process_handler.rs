//! ProcessHandler - 子プロセスとして動くハンドラ
//!
//! ユーザーのプログラム本文はランタイムのプロセス内では実行しない。
//! 子プロセスとして起動し、stdin / stdout 上で 1 行 1 JSON の小さなプロトコルで会話する。
//!
//! # 起動モード
//! - Bootstrap（既定）: 同梱のランナーを `<interpreter> <runner> <entry file>` で起動する。
//!   ランナーがプログラム単位を自分の名前空間で実行し、entry point を探して
//!   呼び出し可能か確かめる。ユーザーは普通の関数を書くだけでよい。
//! - Direct: `<interpreter> <entry file>` をそのまま起動する。プログラム自身がプロトコルを話す。
//!
//! # プロトコル
//! 1. resolve: `{"op":"resolve","entry_point":"handler"}`
//!    → `{"status":"ready"}`、`{"status":"error","message":"..."}`（entry point がない・呼べない）
//!    または `{"status":"load_failed","message":"..."}`（プログラム単位の実行・コンパイル失敗）
//! 2. invoke: `{"op":"invoke","event":...,"context":{...}}`
//!    → `{"status":"ok","result":...,"merge":{...}}` または `{"status":"error","message":"..."}`
//!
//! `merge` は成功時のみ `ExecutionContext::merge` で適用する。

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::domain::{ExecutionContext, InvocationError, LoadError};
use crate::ports::Handler;

/// Environment variable the program can read to learn its entry point.
pub const ENTRY_POINT_ENV: &str = "HANDLER_ENTRY_POINT";

/// Runner that loads a plain program unit and serves the protocol for it.
const BOOTSTRAP_RUNNER: &str = include_str!("bootstrap_runner.py");
const BOOTSTRAP_RUNNER_FILE: &str = ".spindle_runner.py";

/// Whether the program unit is started through the bundled runner or on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LaunchMode {
    /// `<interpreter> <runner> <unit>`: the runner resolves the entry point.
    #[default]
    Bootstrap,
    /// `<interpreter> <unit>`: the unit speaks the line protocol itself.
    Direct,
}

impl LaunchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchMode::Bootstrap => "bootstrap",
            LaunchMode::Direct => "direct",
        }
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaunchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bootstrap" => Ok(LaunchMode::Bootstrap),
            "direct" => Ok(LaunchMode::Direct),
            other => Err(format!("unknown launch mode '{other}' (expected bootstrap or direct)")),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Resolve {
        entry_point: &'a str,
    },
    Invoke {
        event: &'a Value,
        context: &'a ExecutionContext,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Reply {
    Ready,
    LoadFailed {
        message: String,
    },
    Ok {
        #[serde(default)]
        result: Value,
        #[serde(default)]
        merge: Option<Map<String, Value>>,
    },
    Error {
        message: String,
    },
}

/// How handler programs are started.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    interpreter: String,
    mode: LaunchMode,
    scratch_root: Option<PathBuf>,
}

impl ProcessLauncher {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            mode: LaunchMode::default(),
            scratch_root: None,
        }
    }

    pub fn with_mode(mut self, mode: LaunchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn mode(&self) -> LaunchMode {
        self.mode
    }

    /// A fresh directory that is removed when the returned guard drops.
    pub fn scratch_dir(&self) -> Result<TempDir, LoadError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("spindle-");
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(LoadError::Scratch)
    }

    /// Start `program` (a file inside `workdir`) and resolve `entry_point`.
    ///
    /// Returns only after the program acknowledged the entry point, so the
    /// caller may delete `workdir` as soon as this returns.
    pub async fn launch(
        &self,
        workdir: &Path,
        program: &Path,
        entry_point: &str,
    ) -> Result<ProcessHandler, LoadError> {
        let mut command = Command::new(&self.interpreter);
        if self.mode == LaunchMode::Bootstrap {
            let runner = workdir.join(BOOTSTRAP_RUNNER_FILE);
            tokio::fs::write(&runner, BOOTSTRAP_RUNNER)
                .await
                .map_err(LoadError::Scratch)?;
            command.arg(runner);
        }

        let mut child = command
            .arg(program)
            .current_dir(workdir)
            .env(ENTRY_POINT_ENV, entry_point)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LoadError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(LoadError::Protocol("handler pipes were not captured".into()));
        };

        let mut handler = ProcessHandler {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };
        handler.resolve(entry_point).await?;

        debug!(
            interpreter = %self.interpreter,
            mode = %self.mode,
            program = %program.display(),
            entry_point = entry_point,
            pid = ?handler.child.id(),
            "handler program ready"
        );
        Ok(handler)
    }
}

/// A running handler program. The child is killed when this is dropped.
#[derive(Debug)]
pub struct ProcessHandler {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl ProcessHandler {
    async fn resolve(&mut self, entry_point: &str) -> Result<(), LoadError> {
        let io_err = |e: std::io::Error| LoadError::Protocol(e.to_string());

        if let Err(e) = self.send(&Request::Resolve { entry_point }).await {
            if e.kind() == ErrorKind::BrokenPipe {
                return Err(LoadError::Exited {
                    status: self.exit_status().await,
                });
            }
            return Err(io_err(e));
        }

        let Some(line) = self.next_reply_line().await.map_err(io_err)? else {
            return Err(LoadError::Exited {
                status: self.exit_status().await,
            });
        };

        match serde_json::from_str::<Reply>(&line) {
            Ok(Reply::Ready) => Ok(()),
            Ok(Reply::Error { message }) => Err(LoadError::EntryPoint {
                entry_point: entry_point.to_string(),
                message,
            }),
            Ok(Reply::LoadFailed { message }) => Err(LoadError::Program(message)),
            Ok(other) => Err(LoadError::Protocol(format!(
                "expected a ready reply, got {other:?}"
            ))),
            Err(e) => Err(LoadError::Protocol(format!("{e}: {line}"))),
        }
    }

    async fn send(&mut self, request: &Request<'_>) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        self.stdin.write_all(&line).await?;
        self.stdin.flush().await
    }

    /// Next non-blank line from the program, or `None` on EOF.
    async fn next_reply_line(&mut self) -> std::io::Result<Option<String>> {
        while let Some(line) = self.stdout.next_line().await? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    async fn exit_status(&mut self) -> String {
        match self.child.wait().await {
            Ok(status) => status.to_string(),
            Err(e) => format!("unknown: {e}"),
        }
    }
}

#[async_trait]
impl Handler for ProcessHandler {
    async fn call(
        &mut self,
        event: Value,
        context: &mut ExecutionContext,
    ) -> Result<Value, InvocationError> {
        let sent = self
            .send(&Request::Invoke {
                event: &event,
                context: &*context,
            })
            .await;
        match sent {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                return Err(InvocationError::Exited {
                    status: self.exit_status().await,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let Some(line) = self.next_reply_line().await? else {
            return Err(InvocationError::Exited {
                status: self.exit_status().await,
            });
        };

        let reply: Reply = serde_json::from_str(&line)
            .map_err(|e| InvocationError::Protocol(format!("{e}: {line}")))?;

        match reply {
            Reply::Ok { result, merge } => {
                if let Some(updates) = merge {
                    context.merge(updates);
                }
                Ok(result)
            }
            Reply::Error { message } => Err(InvocationError::Raised(message)),
            Reply::Ready | Reply::LoadFailed { .. } => Err(InvocationError::Protocol(
                format!("unexpected load reply to invoke: {line}"),
            )),
        }
    }
}
