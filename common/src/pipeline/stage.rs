use crate::error::ErmError;
use crate::model::{ProjectState, Relationship};

/// the pipeline steps in dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// description -> canonical relationships
    Analyze,
    /// relationships -> conceptual diagram source (local)
    Diagram,
    /// conceptual source -> logical table model source
    TableModel,
    /// logical source -> schema script
    Schema,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [Stage::Analyze, Stage::Diagram, Stage::TableModel, Stage::Schema];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Analyze => "analyze",
            Stage::Diagram => "diagram",
            Stage::TableModel => "table-model",
            Stage::Schema => "schema",
        }
    }

    pub fn prerequisite(&self) -> Option<Stage> {
        match self {
            Stage::Analyze => None,
            Stage::Diagram => Some(Stage::Analyze),
            Stage::TableModel => Some(Stage::Diagram),
            Stage::Schema => Some(Stage::TableModel),
        }
    }

    /// the artifact this stage consumes
    pub fn input_name(&self) -> &'static str {
        match self {
            Stage::Analyze => "description",
            Stage::Diagram => "relationship list",
            Stage::TableModel => "conceptual diagram source",
            Stage::Schema => "logical model source",
        }
    }

    /// whether `state` already carries this stage's output
    pub fn has_output(&self, state: &ProjectState) -> bool {
        match self {
            Stage::Analyze => !state.relationships.is_empty(),
            Stage::Diagram => !state.erm_source.trim().is_empty(),
            Stage::TableModel => !state.table_model_source.trim().is_empty(),
            Stage::Schema => !state.ddl_script.trim().is_empty(),
        }
    }

    /// error for a blank input artifact
    pub fn missing_input(&self) -> ErmError {
        ErmError::MissingInput {
            stage: self.as_str(),
            artifact: self.input_name(),
        }
    }

    /// drop the output of this stage from `state`
    pub fn clear_output(&self, state: &mut ProjectState) {
        match self {
            Stage::Analyze => state.relationships.clear(),
            Stage::Diagram => state.erm_source.clear(),
            Stage::TableModel => state.table_model_source.clear(),
            Stage::Schema => state.ddl_script.clear(),
        }
    }

    /// `self` and every stage after it
    pub fn and_later(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::ORDER.into_iter().filter(move |stage| stage >= self)
    }

    /// stages still to run to reach `target`: everything after the last stage
    /// (up to `target`) whose output is already present
    pub fn plan(target: Stage, state: &ProjectState) -> Vec<Stage> {
        let upto: Vec<Stage> = Stage::ORDER.into_iter().filter(|s| *s <= target).collect();

        let start = upto
            .iter()
            .rposition(|stage| stage.has_output(state))
            .map(|idx| idx + 1)
            .unwrap_or(0);

        upto[start..].to_vec()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = ErmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Stage::ORDER
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ErmError::Config(format!("unknown stage '{}'", s)))
    }
}

/// what one stage produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutput {
    Relationships(Vec<Relationship>),
    ErmSource(String),
    TableModelSource(String),
    DdlScript(String),
}

impl StageOutput {
    /// store the output in its snapshot field
    pub fn apply(self, state: &mut ProjectState) {
        match self {
            StageOutput::Relationships(rels) => state.relationships = rels,
            StageOutput::ErmSource(source) => state.erm_source = source,
            StageOutput::TableModelSource(source) => state.table_model_source = source,
            StageOutput::DdlScript(script) => state.ddl_script = script,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(rels: bool, erm: bool, table: bool, ddl: bool) -> ProjectState {
        let mut state = ProjectState::new("Eine Klasse hat viele Schüler.");
        if rels {
            state.relationships.push(Relationship::new("Klasse", "1", "hat", "*", "Schüler", ">"));
        }
        if erm {
            state.erm_source = "@startuml\n@enduml".to_string();
        }
        if table {
            state.table_model_source = "@startuml\nentity Klasse {}\n@enduml".to_string();
        }
        if ddl {
            state.ddl_script = "CREATE TABLE Klasse (id INT);".to_string();
        }
        state
    }

    #[test]
    fn test_prerequisite_chain() {
        assert_eq!(Stage::Analyze.prerequisite(), None);
        assert_eq!(Stage::Schema.prerequisite(), Some(Stage::TableModel));

        let mut stage = Stage::Schema;
        let mut chain = vec![stage];
        while let Some(prev) = stage.prerequisite() {
            chain.push(prev);
            stage = prev;
        }
        chain.reverse();
        assert_eq!(chain, Stage::ORDER.to_vec());
    }

    #[test]
    fn test_plan_from_scratch() {
        let state = state_with(false, false, false, false);
        assert_eq!(Stage::plan(Stage::Schema, &state), Stage::ORDER.to_vec());
        assert_eq!(Stage::plan(Stage::Diagram, &state), vec![Stage::Analyze, Stage::Diagram]);
    }

    #[test]
    fn test_plan_resumes_after_last_output() {
        let state = state_with(true, true, false, false);
        assert_eq!(Stage::plan(Stage::Schema, &state), vec![Stage::TableModel, Stage::Schema]);
    }

    #[test]
    fn test_plan_trusts_later_artifacts() {
        // a hand-written conceptual source without a relationship table
        let state = state_with(false, true, false, false);
        assert_eq!(Stage::plan(Stage::Schema, &state), vec![Stage::TableModel, Stage::Schema]);
    }

    #[test]
    fn test_plan_is_empty_when_target_done() {
        let state = state_with(true, true, true, true);
        assert!(Stage::plan(Stage::Schema, &state).is_empty());
        assert!(Stage::plan(Stage::Diagram, &state).is_empty());
    }

    #[test]
    fn test_clear_and_later() {
        let mut state = state_with(true, true, true, true);
        for stage in Stage::TableModel.and_later() {
            stage.clear_output(&mut state);
        }

        assert!(Stage::Diagram.has_output(&state));
        assert!(!Stage::TableModel.has_output(&state));
        assert!(!Stage::Schema.has_output(&state));
    }

    #[test]
    fn test_stage_from_str() {
        assert_eq!("table-model".parse::<Stage>().unwrap(), Stage::TableModel);
        assert!("render".parse::<Stage>().is_err());
    }

    #[test]
    fn test_output_apply() {
        let mut state = ProjectState::default();
        StageOutput::DdlScript("CREATE TABLE a (id INT);".to_string()).apply(&mut state);
        assert!(Stage::Schema.has_output(&state));
    }
}
