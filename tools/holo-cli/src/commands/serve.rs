//! Run the stream server.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use holo_stream_server::{HandSource, ReplaySource};

pub async fn run(
    config: Option<PathBuf>,
    landmarks: Option<PathBuf>,
    looping: bool,
    host: Option<String>,
    port: Option<u16>,
    profile: Option<String>,
) -> anyhow::Result<()> {
    let mut config = super::load_config(config.as_deref())?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(profile) = profile {
        config.set_profile(&profile)?;
    }
    config.validate()?;

    let pacing = Duration::from_secs_f64(1.0 / config.server.fps_limit as f64);
    let source: Box<dyn HandSource> = match landmarks {
        Some(path) => Box::new(
            ReplaySource::open(&path)
                .map_err(|e| anyhow::anyhow!("Failed to open recording: {e}"))?
                .with_loop(looping)
                .with_interval(pacing),
        ),
        None => {
            tracing::warn!("No landmark source given; serving an empty stream");
            Box::new(ReplaySource::from_frames(Vec::new()))
        }
    };

    println!(
        "Serving gestures on ws://{}:{}/ws (profile: {})",
        config.server.host, config.server.port, config.gestures.profile
    );
    println!("Press Ctrl+C to stop.");

    let stop_flag = Arc::new(AtomicBool::new(false));
    let ctrl_c_flag = stop_flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            ctrl_c_flag.store(true, Ordering::SeqCst);
        }
    });

    let summary = holo_stream_server::serve(config, source, stop_flag).await?;

    println!("\nSession stopped.");
    println!("  Frames processed: {}", summary.frames_processed);
    println!("  Frames published: {}", summary.frames_published);
    println!("  Acquisition retries: {}", summary.acquisition_failures);

    Ok(())
}
