//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod completion_alerts;
pub mod update_loop;

// Re-export main functions
pub use completion_alerts::completion_alert_task;
pub use update_loop::update_loop_task;
