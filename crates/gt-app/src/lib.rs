//! Batch driver for glyphtone: command line, output layout, job execution
//! on a worker pool and the final summary.

pub mod batch;
pub mod cli;
pub mod config;
pub mod job;
pub mod layout;
pub mod summary;
