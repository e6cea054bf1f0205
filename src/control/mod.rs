//! Session control: the run state machine, postures and markers

pub mod controller;
pub mod markers;
pub mod posture;
pub mod session;

pub use controller::{IdleReason, RunController, TickOutcome};
pub use markers::{LogMarkers, MarkerSink, NoMarkers};
pub use posture::{Posture, PostureManager};
pub use session::{RunSession, RunState};
