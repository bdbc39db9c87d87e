//! Charter Core
//!
//! Core types shared by the Charter deployer, agent and CLI.
//!
//! This crate contains:
//! - Domain types: charts, chart repositories, label sets and node states
//! - Helpers: namespace defaults and input validation

pub mod domain;
pub mod util;
