use crate::model::Relationship;

/// parse the analysis generator's pipe-delimited lines.
///
/// blank lines are ignored. any line that is not exactly five fields with
/// named entities on both ends is logged and skipped; this never fails.
pub fn parse_analysis_output(raw: &str) -> Vec<Relationship> {
    let mut relationships = Vec::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }

        match Relationship::from_pipe_line(line) {
            Some(rel) => relationships.push(rel),
            None => tracing::warn!(line = %line, "skipping malformed analysis line"),
        }
    }

    relationships
}
