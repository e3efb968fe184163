//! Capture cycle state machine

mod session;

pub use session::{CaptureFailure, CaptureMachine, CapturePhase, CaptureState, InvalidStateTransition};
