//! Attendance capture.
//!
//! This module holds the tap state machine that turns tag presentations into
//! check-ins and check-outs.

mod tap;

pub use tap::{TapAction, TapCalendar, TapOutcome, process_tap};
