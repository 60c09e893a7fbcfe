pub mod analysis;
pub mod data_source;
pub mod error;
pub mod lab_cases;
pub mod metrics;
pub mod orchestrator;
pub mod recommendations;
pub mod retrieval;
pub mod router;
pub mod scoring;

pub use error::{PracticeError, Result};
pub use orchestrator::{Orchestrator, OrchestratorResponse, ResponseSection};
