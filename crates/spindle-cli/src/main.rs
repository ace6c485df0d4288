use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};

use spindle_core::app::{
    FunctionRuntime, LoopSettings, RetryingStore, RuntimeConfig, load_handler, resolve_source,
};
use spindle_core::domain::RuntimeError;
use spindle_core::impls::RedisStore;
use spindle_core::observability::init_logging;
use spindle_core::ports::KvStore;

/// Startup: config → handler → store. Any failure here exits before the loop.
async fn start(config: &RuntimeConfig) -> anyhow::Result<FunctionRuntime> {
    let spec = resolve_source(config).map_err(RuntimeError::from)?;
    let launcher = config.launcher().map_err(RuntimeError::from)?;
    let handler = load_handler(&spec, launcher)
        .await
        .map_err(RuntimeError::from)?;

    let redis_url = config.redis_url();
    let retry = config.retry_policy();
    let redis = retry
        .run("CONNECT", || RedisStore::connect(&redis_url))
        .await
        .map_err(RuntimeError::Connect)
        .with_context(|| format!("connecting to store at {redis_url}"))?;
    let store: Arc<dyn KvStore> =
        Arc::new(RetryingStore::new(Arc::new(redis), retry));

    Ok(FunctionRuntime::new(
        store,
        handler,
        LoopSettings {
            input_key: config.input_key.clone(),
            output_key: config.output_key.clone(),
            poll_period: config.poll_period(),
        },
    ))
}

async fn run() -> anyhow::Result<()> {
    let config = RuntimeConfig::from_env().map_err(RuntimeError::from)?;
    let mut runtime = start(&config).await?;

    // ctrl-c でループを止める（実行中のハンドラ呼び出しは最後まで待つ）
    // shutdown_tx はループが返るまで生かしておく。全送信側が drop されるとループは止まる。
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let signal_tx = Arc::clone(&shutdown_tx);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                let _ = signal_tx.send(true);
            }
            Err(e) => error!(error = %e, "cannot listen for ctrl-c; running until killed"),
        }
    });

    let summary = runtime.run(shutdown_rx).await?;
    info!(
        ticks = summary.ticks,
        published = summary.published,
        "spindle stopped"
    );
    Ok(())
}

/// Phase named in the fatal log line.
fn failure_phase(err: &anyhow::Error) -> String {
    err.downcast_ref::<RuntimeError>()
        .map(|e| e.phase().to_string())
        .unwrap_or_else(|| "startup".to_string())
}

/// Log a fatal error, if any, and pick the process exit status.
fn exit_status(outcome: &anyhow::Result<()>) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(err) => {
            error!(
                phase = %failure_phase(err),
                error = %format!("{err:#}"),
                "spindle terminated"
            );
            1
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    ExitCode::from(exit_status(&run().await))
}
