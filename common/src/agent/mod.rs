pub mod parser;
pub mod prompt;
pub mod tutor;

pub use parser::{decode, parse_tutor_response, repair};
pub use tutor::{ask_tutor, greet, relationships_context, TutorProfile, TutorTopic, INITIAL_QUESTION};
