//! Shift schedule configuration service.
//!
//! Stores facility staffing configurations, validates them, and hands a
//! staged copy to an external scheduling engine whose output bundles are
//! served back as archives.
pub mod cli;
pub mod commands;
pub mod config;
pub mod diag;
pub mod error;
pub mod generate;
pub mod model;
pub mod server;
pub mod staging;
pub mod store;
pub mod util;
pub mod validate;

pub use error::{Result, ShiftError};
