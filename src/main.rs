mod cli;

use mp4forge::{
    config::{self, PoolConfig},
    conversion::Converter,
    discover, pool, shutdown,
    watch::WatchIngestor,
};
use mp4forge_av::{tools, FfmpegEncoder, FfprobeProber};

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::path::PathBuf;
use std::sync::Arc;

fn build_converter(config: Arc<PoolConfig>) -> Converter {
    let ffprobe = tools::locate("ffprobe", config.tools.ffprobe_path.as_deref());
    let ffmpeg = tools::locate("ffmpeg", config.tools.ffmpeg_path.as_deref());
    tracing::debug!("Using ffprobe at {:?}, ffmpeg at {:?}", ffprobe, ffmpeg);

    let mut encoder = FfmpegEncoder::new(ffmpeg);
    if let Some(timeout) = config.tools.encode_timeout() {
        encoder = encoder.with_timeout(timeout);
    }

    Converter::new(
        config,
        Arc::new(FfprobeProber::new(ffprobe)),
        Arc::new(encoder),
    )
}

/// Expand every input up front so a bad path aborts before any work starts.
fn collect_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        files.extend(discover::discover(input, recursive)?);
    }
    Ok(files)
}

async fn run_batch(config: Arc<PoolConfig>, files: Vec<PathBuf>) -> Result<()> {
    tracing::info!("Converting {} file(s)", files.len());

    let (sink, handle) = pool::run_pool(Arc::new(build_converter(config)));
    for file in files {
        if sink.submit(file).await.is_err() {
            break;
        }
    }
    drop(sink);

    handle.drain().await;
    Ok(())
}

async fn run_watch(config: Arc<PoolConfig>, root: PathBuf) -> Result<()> {
    let (sink, handle) = pool::run_pool(Arc::new(build_converter(config)));
    let mut ingest = tokio::spawn(WatchIngestor::new(root, sink.clone()).run());

    let interrupted = tokio::select! {
        joined = &mut ingest => {
            // The ingestor only returns on its own after a fatal watch error.
            joined.context("file watcher task failed")??;
            false
        }
        _ = shutdown::shutdown_signal() => true,
    };

    if interrupted {
        tracing::info!("Shutting down...");
        sink.close();
        ingest.await.context("file watcher task failed")??;
    }

    handle.drain().await;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mp4forge=debug,mp4forge_av=debug,mp4forge_common=debug".to_string()
        } else {
            "mp4forge=info,mp4forge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let mut config = config::load_config_or_default(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config::validate_config(&config)?;
    let config = Arc::new(config);

    let rt = tokio::runtime::Runtime::new()?;

    let result = if cli.watch {
        if config.output_dir().is_none() {
            anyhow::bail!("Must specify output directory with --watch");
        }
        let [root] = cli.inputs.as_slice() else {
            anyhow::bail!("--watch takes exactly one directory to watch");
        };
        rt.block_on(run_watch(config, root.clone()))
    } else {
        let files = collect_inputs(&cli.inputs, config.recursive)?;
        rt.block_on(run_batch(config, files))
    };

    // After a fatal watch error workers may still be mid-encode.
    rt.shutdown_background();
    result
}
