pub mod canonical;
pub mod extract;

pub use canonical::canonicalize;
pub use extract::parse_analysis_output;
