use crate::model::Relationship;
use std::collections::HashMap;

/// collapse relationships that link the same unordered entity pair.
///
/// the first relationship seen for a pair holds its slot in the output. a later
/// one replaces it only when it is "many" and the held one is not, so the
/// first many-relationship for a pair always wins. verb and direction of the
/// losing entries are dropped without notice.
#[tracing::instrument(skip(relationships), fields(input = relationships.len()))]
pub fn canonicalize(relationships: &[Relationship]) -> Vec<Relationship> {
    let mut best: Vec<Relationship> = Vec::with_capacity(relationships.len());
    let mut slots: HashMap<(&str, &str), usize> = HashMap::new();

    for current in relationships {
        let key = current.canonical_key();
        match slots.get(&key).copied() {
            None => {
                slots.insert(key, best.len());
                best.push(current.clone());
            }
            Some(slot) => {
                if current.is_many() && !best[slot].is_many() {
                    tracing::debug!(
                        kept = %current.to_pipe_line(),
                        dropped = %best[slot].to_pipe_line(),
                        "many-relationship replaces earlier link"
                    );
                    best[slot] = current.clone();
                } else {
                    tracing::debug!(dropped = %current.to_pipe_line(), "duplicate link dropped");
                }
            }
        }
    }

    tracing::debug!(output = best.len(), "canonicalized relationships");
    best
}
