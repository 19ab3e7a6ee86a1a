use std::path::PathBuf;
use std::time::{Duration, Instant};

use holo_gesture_core::{GestureProcessor, ProcessorConfig};
use holo_gesture_model::landmark::{index, Landmark, LANDMARK_COUNT};
use holo_gesture_model::{parse_frames, GestureMode, HandLandmarks, OutboundFrame};

/// Upright hand with its palm center at `(cx, cy)`.
///
/// `extended` lists index, middle, ring, pinky. With `pinch` the index tip
/// is folded onto the thumb tip.
fn hand(cx: f64, cy: f64, extended: [bool; 4], pinch: bool) -> HandLandmarks {
    let mut hand = HandLandmarks::new([Landmark::new(cx, cy + 0.05, 0.0); LANDMARK_COUNT]);
    hand.set(index::WRIST, Landmark::new(cx, cy + 0.15, 0.0));
    hand.set(index::PALM_CENTER, Landmark::new(cx, cy, 0.0));
    hand.set(index::THUMB_IP, Landmark::new(cx - 0.06, cy + 0.02, 0.0));
    hand.set(index::THUMB_TIP, Landmark::new(cx - 0.08, cy + 0.04, 0.0));

    let columns = [
        (index::INDEX_TIP, index::INDEX_PIP, -0.03),
        (index::MIDDLE_TIP, index::MIDDLE_PIP, -0.01),
        (index::RING_TIP, index::RING_PIP, 0.01),
        (index::PINKY_TIP, index::PINKY_PIP, 0.03),
    ];
    for ((tip, pip, dx), up) in columns.into_iter().zip(extended) {
        hand.set(pip, Landmark::new(cx + dx, cy - 0.05, 0.0));
        let tip_y = if up { cy - 0.12 } else { cy - 0.01 };
        hand.set(tip, Landmark::new(cx + dx, tip_y, 0.0));
    }
    if pinch {
        hand.set(index::INDEX_TIP, Landmark::new(cx - 0.07, cy + 0.02, 0.0));
    }
    hand
}

fn open_hand(cx: f64, cy: f64) -> HandLandmarks {
    hand(cx, cy, [true; 4], false)
}

fn pinching_hand(cx: f64, cy: f64) -> HandLandmarks {
    hand(cx, cy, [false, true, true, true], true)
}

fn at(t0: Instant, millis: u64) -> Instant {
    t0 + Duration::from_millis(millis)
}

#[test]
fn one_hand_drifting_right_rotates_left() {
    let t0 = Instant::now();
    let mut processor = GestureProcessor::new(ProcessorConfig::default(), t0);

    // 10 fps, palm moving +0.01 per frame.
    let frames: Vec<OutboundFrame> = (0..20u64)
        .map(|i| {
            let x = 0.5 + 0.01 * i as f64;
            processor.process(&[open_hand(x, 0.5)], at(t0, 100 * i))
        })
        .collect();

    assert_eq!(frames[0].mode, GestureMode::Idle);
    assert!(frames[1..].iter().all(|f| f.mode == GestureMode::Rotate));

    // The entry frame only seeds the previous palm position.
    assert_eq!(frames[1].rot_dx, 0.0);
    for (i, frame) in frames.iter().enumerate().skip(2) {
        assert!(frame.rot_dx < 0.0, "frame {i}: rot_dx = {}", frame.rot_dx);
    }
    assert!(frames.iter().all(|f| f.zoom_delta == 0.0 && f.explode == 0.0));
}

#[test]
fn two_pinching_hands_separating_zoom_in() {
    let t0 = Instant::now();
    let mut processor = GestureProcessor::new(ProcessorConfig::default(), t0);

    let near = [pinching_hand(0.4, 0.5), pinching_hand(0.6, 0.5)];
    let far = [pinching_hand(0.4, 0.5), pinching_hand(0.7, 0.5)];

    let mut t = 0;
    let mut last = None;
    for _ in 0..6 {
        last = Some(processor.process(&near, at(t0, t)));
        t += 33;
    }
    let settled = last.unwrap();
    assert_eq!(settled.mode, GestureMode::Zoom);
    assert_eq!(settled.zoom_delta, 0.0);

    let step = processor.process(&far, at(t0, t));
    assert_eq!(step.mode, GestureMode::Zoom);
    assert!((step.zoom_delta - 0.1).abs() < 1e-6, "zoom_delta = {}", step.zoom_delta);
    assert_eq!(step.rot_dx, 0.0);

    // Moving average catches up: 0.3 - (0.9 * 0.3 + 0.1 * 0.2) = 0.01.
    let follow = processor.process(&far, at(t0, t + 33));
    assert!((follow.zoom_delta - 0.01).abs() < 1e-6);

    let still = processor.process(&far, at(t0, t + 66));
    assert_eq!(still.zoom_delta, 0.0);
}

#[test]
fn channels_rebaseline_when_their_mode_resumes() {
    let t0 = Instant::now();
    let mut processor = GestureProcessor::new(ProcessorConfig::default(), t0);

    // 100 ms per frame clears every dwell, so each change lands one frame later.
    let mut t = 0;
    let mut step = |hands: &[HandLandmarks]| {
        let frame = processor.process(hands, at(t0, t));
        t += 100;
        frame
    };

    // Zoom with index tips 0.2 apart.
    let narrow = [pinching_hand(0.4, 0.5), pinching_hand(0.6, 0.5)];
    step(&narrow);
    for _ in 0..3 {
        let frame = step(&narrow);
        assert_eq!(frame.mode, GestureMode::Zoom);
        assert_eq!(frame.zoom_delta, 0.0);
    }

    // Rotate with one hand drifting right.
    for i in 0..6 {
        let frame = step(&[open_hand(0.5 + 0.01 * i as f64, 0.5)]);
        assert_eq!(frame.mode, GestureMode::Rotate);
    }

    // Back to zoom with the tips 0.6 apart: the old 0.2 average is gone.
    let wide = [pinching_hand(0.3, 0.5), pinching_hand(0.9, 0.5)];
    let reentry = step(&wide);
    assert_eq!(reentry.mode, GestureMode::Zoom);
    assert_eq!(reentry.zoom_delta, 0.0);
    assert_eq!(step(&wide).zoom_delta, 0.0);

    // Rotate again far from the last palm position: no jump on resume.
    let resumed = step(&[open_hand(0.8, 0.3)]);
    assert_eq!(resumed.mode, GestureMode::Rotate);
    assert_eq!(resumed.rot_dx, 0.0);
    assert_eq!(resumed.rot_dy, 0.0);

    let moving = step(&[open_hand(0.81, 0.3)]);
    assert_eq!(moving.mode, GestureMode::Rotate);
    assert!(moving.rot_dx < 0.0, "rot_dx = {}", moving.rot_dx);
}

#[test]
fn no_hands_stays_idle_and_quiet() {
    let t0 = Instant::now();
    let mut processor = GestureProcessor::new(ProcessorConfig::default(), t0);

    for i in 0..300u64 {
        let frame = processor.process(&[], at(t0, 33 * i));
        assert_eq!(frame.mode, GestureMode::Idle);
        assert!(!frame.freeze);
        assert_eq!(frame.hands, 0);
        assert_eq!(frame.rot_dx, 0.0);
        assert_eq!(frame.rot_dy, 0.0);
        assert_eq!(frame.zoom_delta, 0.0);
        assert_eq!(frame.explode, 0.0);
        assert!(!frame.measure.active);
    }
    assert_eq!(processor.fsm().transition_count(), 0);
}

fn load_fixture_session() -> Vec<Vec<HandLandmarks>> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("replay")
        .join("session.jsonl");

    let content = std::fs::read_to_string(path).expect("fixture session should be readable");
    parse_frames(&content).expect("fixture session should parse")
}

#[test]
fn fixture_session_visits_every_channel() {
    let session = load_fixture_session();
    assert_eq!(session.len(), 120);

    let t0 = Instant::now();
    let mut processor = GestureProcessor::new(ProcessorConfig::default(), t0);
    let frames: Vec<OutboundFrame> = session
        .iter()
        .enumerate()
        .map(|(i, hands)| processor.process(hands, at(t0, 33 * i as u64)))
        .collect();

    let seen = |mode: GestureMode| frames.iter().any(|f| f.mode == mode);
    assert!(seen(GestureMode::Rotate));
    assert!(seen(GestureMode::Zoom));
    assert!(seen(GestureMode::Freeze));

    assert!(frames.iter().any(|f| f.rot_dx < 0.0));
    assert!(frames.iter().all(|f| f.rot_dx <= 0.0));
    assert!(frames.iter().any(|f| f.zoom_delta > 0.0));

    let peak = frames.iter().map(|f| f.explode).fold(0.0, f64::max);
    assert!(peak > 0.5, "peak explode = {peak}");

    let tail = frames.last().unwrap();
    assert_eq!(tail.mode, GestureMode::Idle);
    assert_eq!(tail.hands, 0);
    assert!(tail.explode < peak);
    assert!(frames.iter().all(|f| (0.0..=1.0).contains(&f.explode)));
}
