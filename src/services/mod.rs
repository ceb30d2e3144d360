// Service exports
pub mod export;
pub mod microlp;
pub mod solver;

pub use export::{ExportError, ReportWriter};
pub use microlp::MicroLpSolver;
pub use solver::{MilpSolver, SolveOptions, SolverOutput, SolverStatus};
