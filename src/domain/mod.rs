//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_helpers;
pub mod decision;
pub mod registry;
pub mod aggregate;
pub mod pipeline;
pub mod scan_result;
pub mod batch;
pub mod fundamentals;
pub mod config_validation;
pub mod error;
