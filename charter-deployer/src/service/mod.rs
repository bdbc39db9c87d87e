//! Service layer
//!
//! Services contain the deployer's business logic. They sequence calls to
//! the repositories and translate repository failures into service errors.

mod chart;

// Re-export traits
pub use chart::ChartDeploymentService;

// Re-export implementations
pub use chart::StandardChartDeploymentService;
