//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweep: optional timer around the store's sweep, off by default

mod cleanup;

pub use cleanup::spawn_sweep_task;
