//! Core domain types and logic.

pub mod signal;
pub mod price;
pub mod risk;
pub mod paper;
pub mod report;
pub mod pipeline;
pub mod config_validation;
pub mod error;
