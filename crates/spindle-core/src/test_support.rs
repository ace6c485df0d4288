//! Handler programs used by tests.
//!
//! Most are POSIX `sh` scripts speaking the line protocol of
//! `impls::process_handler` directly, so those tests need nothing beyond
//! `/bin/sh` and `sed`. Plain Python units go through the bootstrap runner and
//! are skipped when `python3` is not installed.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use zip::write::SimpleFileOptions;

use crate::impls::{LaunchMode, ProcessLauncher};

/// Returns each event unchanged. Only resolves the entry point `handler`.
pub const ECHO_HANDLER: &str = r#"read -r request
if [ "$HANDLER_ENTRY_POINT" != "handler" ]; then
  printf '{"status":"error","message":"entry point %s not found"}\n' "$HANDLER_ENTRY_POINT"
  exit 0
fi
printf '{"status":"ready"}\n'
while read -r line; do
  event=$(printf '%s\n' "$line" | sed -n 's/^{"op":"invoke","event":\(.*\),"context":.*}$/\1/p')
  printf '{"status":"ok","result":%s}\n' "$event"
done
"#;

/// Counts its calls and asks the runtime to merge `count` and `seen`.
pub const COUNTING_HANDLER: &str = r#"read -r request
printf '{"status":"ready"}\n'
count=0
while read -r line; do
  count=$((count + 1))
  printf '{"status":"ok","result":{"calls":%s},"merge":{"count":%s,"seen":true}}\n' "$count" "$count"
done
"#;

/// Resolves, then raises on every invocation.
pub const FAILING_HANDLER: &str = r#"read -r request
printf '{"status":"ready"}\n'
while read -r line; do
  printf '{"status":"error","message":"division by zero"}\n'
done
"#;

/// Identity handler written the way users write them.
pub const PY_IDENTITY: &str = "def handler(input, context):\n    return input\n";

/// Counts its calls through the context it is given.
pub const PY_COUNTING: &str = r#"def handler(event, context):
    count = context.env.get("count", 0) + 1
    context.update_env({"count": count, "seen": True})
    return {"calls": count}
"#;

pub fn sh_launcher() -> ProcessLauncher {
    ProcessLauncher::new("sh").with_mode(LaunchMode::Direct)
}

pub fn python_launcher() -> ProcessLauncher {
    ProcessLauncher::new("python3")
}

pub fn python_available() -> bool {
    let found = Command::new("python3")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    if !found {
        eprintln!("python3 not found; skipping");
    }
    found
}

/// Write a zip archive at `path` with the given `(name, contents)` entries.
pub fn write_archive(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).expect("create archive");
    let mut zip = zip::ZipWriter::new(file);
    for (name, contents) in entries {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        zip.write_all(contents.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish archive");
}

/// Number of entries directly under `dir`.
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("read dir").count()
}
