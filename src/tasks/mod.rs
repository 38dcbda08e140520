//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: removes expired entries from every store at a configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
