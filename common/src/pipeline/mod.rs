pub mod diagram;
pub mod executor;
pub mod stage;

pub use diagram::{build_diagram_source, summarize_diagram, DiagramSummary, EMPTY_DIAGRAM};
pub use executor::{Pipeline, PipelineRun, StageFailure, StageReport};
pub use stage::{Stage, StageOutput};
