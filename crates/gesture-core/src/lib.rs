//! Holo-Control Gesture Core: the stabilization pipeline
//!
//! Turns noisy per-frame hand landmarks into stable control signals:
//! - **Kalman:** scalar and 2-D filters that report their own uncertainty
//! - **Deadzone:** variance-driven noise gate
//! - **Classifier:** stateless gesture predicates over landmark geometry
//! - **FSM:** priority + dwell arbitration of the single live mode
//! - **Processor:** per-frame orchestration of the above
//!
//! This crate is pure computation with no I/O and no async. Time enters only as
//! an explicit `Instant` argument so every behavior is reproducible.

pub mod classifier;
pub mod deadzone;
pub mod fsm;
pub mod kalman;
pub mod processor;

pub use deadzone::AdaptiveDeadzone;
pub use fsm::{FsmSignals, FsmStats, GestureFsm};
pub use kalman::{Kalman1D, Kalman2D};
pub use processor::{GestureProcessor, ProcessorConfig};
