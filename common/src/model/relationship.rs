use serde::{Deserialize, Serialize};

/// direction marker assigned to every relationship the analysis stage extracts
pub const DEFAULT_DIRECTION: &str = ">";

/// cardinality token that marks the "many" side of a relationship
pub const MANY_MARKER: char = '*';

fn default_direction() -> String {
    DEFAULT_DIRECTION.to_string()
}

/// a link between two entities as extracted from a description.
///
/// cardinalities are free-form tokens (`1`, `*`, `1..2`, ...) and are never
/// rewritten; only the presence of [`MANY_MARKER`] is ever inspected.
/// serialized field names match the project files of the desktop editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "entity1")]
    pub entity_a: String,
    #[serde(rename = "cardinality1")]
    pub cardinality_a: String,
    pub verb: String,
    #[serde(rename = "cardinality2")]
    pub cardinality_b: String,
    #[serde(rename = "entity2")]
    pub entity_b: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

impl Relationship {
    pub fn new(
        entity_a: impl Into<String>,
        cardinality_a: impl Into<String>,
        verb: impl Into<String>,
        cardinality_b: impl Into<String>,
        entity_b: impl Into<String>,
        direction: impl Into<String>,
    ) -> Self {
        Self {
            entity_a: entity_a.into(),
            cardinality_a: cardinality_a.into(),
            verb: verb.into(),
            cardinality_b: cardinality_b.into(),
            entity_b: entity_b.into(),
            direction: direction.into(),
        }
    }

    /// parse one `Entity1|Card1|Verb|Card2|Entity2` line.
    ///
    /// trailing empty fields (`A|1|hat|*|B|`) are ignored. returns `None`
    /// unless exactly five fields remain and both entity names are non-blank.
    /// the direction is always [`DEFAULT_DIRECTION`].
    pub fn from_pipe_line(line: &str) -> Option<Self> {
        let mut parts: Vec<&str> = line.split('|').map(str::trim).collect();
        while parts.last().is_some_and(|field| field.is_empty()) {
            parts.pop();
        }

        match parts.as_slice() {
            [entity_a, cardinality_a, verb, cardinality_b, entity_b]
                if !entity_a.is_empty() && !entity_b.is_empty() =>
            {
                Some(Self::new(
                    *entity_a,
                    *cardinality_a,
                    *verb,
                    *cardinality_b,
                    *entity_b,
                    DEFAULT_DIRECTION,
                ))
            }
            _ => None,
        }
    }

    /// five-field pipe form, direction omitted
    pub fn to_pipe_line(&self) -> String {
        [
            self.entity_a.as_str(),
            self.cardinality_a.as_str(),
            self.verb.as_str(),
            self.cardinality_b.as_str(),
            self.entity_b.as_str(),
        ]
        .join("|")
    }

    /// true when either side carries the many marker
    pub fn is_many(&self) -> bool {
        self.cardinality_a.contains(MANY_MARKER) || self.cardinality_b.contains(MANY_MARKER)
    }

    /// the unordered entity pair, sorted byte-wise so `(A, B)` and `(B, A)`
    /// produce the same key
    pub fn canonical_key(&self) -> (&str, &str) {
        let (a, b) = (self.entity_a.as_str(), self.entity_b.as_str());
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// render a relationship table as pipe lines, one per row
pub fn relationships_to_lines(relationships: &[Relationship]) -> String {
    relationships
        .iter()
        .map(Relationship::to_pipe_line)
        .collect::<Vec<_>>()
        .join("\n")
}
