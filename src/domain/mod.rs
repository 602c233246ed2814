//! Core domain types and logic.

pub mod price_history;
pub mod indicator;
pub mod strategy;
pub mod instrument;
pub mod decision;
pub mod engine;
pub mod portfolio;
pub mod config_validation;
pub mod error;
