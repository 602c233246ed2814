//! dualsignal: daily trading signals for a small fixed set of instruments.
//!
//! Hexagonal architecture: indicator math, strategy rules, the decision engine
//! and portfolio aggregation live in [`domain`], port traits in [`ports`],
//! concrete market-data, cache, config and report implementations in
//! [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
