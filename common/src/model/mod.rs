pub mod relationship;
pub mod snapshot;
pub mod tutor;

pub use relationship::{relationships_to_lines, Relationship, DEFAULT_DIRECTION, MANY_MARKER};
pub use snapshot::{
    load_relationships, load_snapshot, load_snapshot_file, save_relationships, save_snapshot,
    save_snapshot_file, ProjectState,
};
pub use tutor::TutorResponse;
