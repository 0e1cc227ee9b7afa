//! Background Tasks Module
//!
//! Maintenance work the host application schedules explicitly.
//!
//! # Tasks
//! - Sweep: evicts expired and corrupted entries at a fixed interval

mod sweep;

pub use sweep::{spawn_sweep_task, SweepHandle};
