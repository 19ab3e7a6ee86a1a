//! Run the gesture processor over a recording with a simulated clock.

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use holo_common::clock::WIRE_TIMESTAMP_MODULUS_MS;
use holo_gesture_core::{GestureProcessor, ProcessorConfig};
use holo_gesture_model::{parse_frames, GestureMode, WireMessage};

pub fn run(file: PathBuf, config: Option<PathBuf>, interval_ms: u64) -> anyhow::Result<()> {
    let config = super::load_config(config.as_deref())?;
    let processor_config = ProcessorConfig::from_app_config(&config)?;

    let content = std::fs::read_to_string(&file)
        .map_err(|_| anyhow::anyhow!("Recording not found: {}", file.display()))?;
    let frames =
        parse_frames(&content).map_err(|e| anyhow::anyhow!("Failed to parse recording: {e}"))?;
    tracing::info!(
        path = %file.display(),
        frames = frames.len(),
        profile = %config.gestures.profile,
        "Replaying recording"
    );

    let epoch = Instant::now();
    let start_ms = chrono::Utc::now().timestamp_millis();
    let interval = Duration::from_millis(interval_ms);
    let mut processor = GestureProcessor::new(processor_config, epoch);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut mode_frames = [0u64; 5];

    for (index, hands) in frames.iter().enumerate() {
        let offset = interval * index as u32;
        let frame = processor.process(hands, epoch + offset);
        mode_frames[frame.mode.index()] += 1;

        let ts = (start_ms + offset.as_millis() as i64).rem_euclid(WIRE_TIMESTAMP_MODULUS_MS);
        let message = WireMessage::from_frame(&frame, index as u64, ts as u64, None);
        writeln!(out, "{}", message.to_json()?)?;
    }
    out.flush()?;

    let summary = GestureMode::ALL
        .iter()
        .map(|mode| format!("{mode}={}", mode_frames[mode.index()]))
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(
        frames = frames.len(),
        transitions = processor.fsm().transition_count(),
        modes = %summary,
        "Replay complete"
    );

    Ok(())
}
