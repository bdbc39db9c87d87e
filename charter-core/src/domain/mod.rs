//! Core domain types
//!
//! These types are shared between the deployer (which creates and deletes
//! chart resources) and the agent (which manages single-use build nodes).

pub mod chart;
pub mod labels;
pub mod node;
