use crate::agent::prompt::{
    build_analysis_prompt, build_schema_prompt, build_table_model_prompt, ANALYSIS_SYSTEM_PROMPT,
    SCHEMA_SYSTEM_PROMPT, TABLE_MODEL_SYSTEM_PROMPT,
};
use crate::agent::{self, repair, TutorTopic};
use crate::error::{ErmError, Result};
use crate::llm::{StageGenerators, TextGenerator};
use crate::model::{ProjectState, Relationship, TutorResponse};
use crate::pipeline::diagram;
use crate::pipeline::stage::{Stage, StageOutput};
use crate::relations::{canonicalize, parse_analysis_output};
use std::time::Instant;
use tracing::Instrument;

/// how long one stage took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub duration_ms: u64,
}

/// the stage a run halted at and why
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: ErmError,
}

/// result of a pipeline run. `state` always holds every artifact produced
/// before a failure, so it can be saved and resumed.
#[derive(Debug)]
pub struct PipelineRun {
    pub state: ProjectState,
    pub completed: Vec<StageReport>,
    pub failure: Option<StageFailure>,
}

impl PipelineRun {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    /// the final state, or the error of the failed stage
    pub fn into_result(self) -> Result<ProjectState> {
        match self.failure {
            None => Ok(self.state),
            Some(failure) => Err(failure.error),
        }
    }
}

/// the staged transformation from description to schema script.
///
/// holds nothing but the generator handles, so clones can serve many
/// projects at once.
#[derive(Debug, Clone)]
pub struct Pipeline {
    generators: StageGenerators,
}

impl Pipeline {
    pub fn new(generators: StageGenerators) -> Self {
        Self { generators }
    }

    /// one generator for every stage and the tutor
    pub fn with_generator(generator: std::sync::Arc<dyn TextGenerator>) -> Self {
        Self::new(StageGenerators::shared(generator))
    }

    /// extract relationships from a description and canonicalize them.
    /// malformed lines in the reply are dropped, not fatal.
    #[tracing::instrument(skip_all, fields(description_len = description.len()))]
    pub async fn analyze(&self, description: &str) -> Result<Vec<Relationship>> {
        if description.trim().is_empty() {
            return Err(Stage::Analyze.missing_input());
        }

        let raw = self
            .generators
            .analysis
            .generate(ANALYSIS_SYSTEM_PROMPT, &build_analysis_prompt(description))
            .await?;

        let extracted = parse_analysis_output(&raw);
        let relationships = canonicalize(&extracted);

        tracing::info!(
            extracted = extracted.len(),
            kept = relationships.len(),
            "analysis complete"
        );
        Ok(relationships)
    }

    pub fn build_diagram_source(&self, relationships: &[Relationship]) -> String {
        diagram::build_diagram_source(relationships)
    }

    /// conceptual diagram source -> logical table model source
    #[tracing::instrument(skip_all, fields(source_len = erm_source.len()))]
    pub async fn transform_to_logical_model(&self, erm_source: &str) -> Result<String> {
        if erm_source.trim().is_empty() {
            return Err(Stage::TableModel.missing_input());
        }

        let raw = self
            .generators
            .table
            .generate(TABLE_MODEL_SYSTEM_PROMPT, &build_table_model_prompt(erm_source))
            .await?;

        non_blank(Stage::TableModel, repair(&raw))
    }

    /// logical table model source -> schema script
    #[tracing::instrument(skip_all, fields(source_len = table_model_source.len()))]
    pub async fn generate_schema(&self, table_model_source: &str) -> Result<String> {
        if table_model_source.trim().is_empty() {
            return Err(Stage::Schema.missing_input());
        }

        let raw = self
            .generators
            .sql
            .generate(SCHEMA_SYSTEM_PROMPT, &build_schema_prompt(table_model_source))
            .await?;

        non_blank(Stage::Schema, repair(&raw))
    }

    /// tutor question about an artifact; never touches pipeline state
    pub async fn ask_tutor(
        &self,
        topic: TutorTopic,
        context: &str,
        question: &str,
    ) -> Result<TutorResponse> {
        agent::ask_tutor(self.generators.tutor.as_ref(), topic, context, question).await
    }

    pub async fn greet(&self, topic: TutorTopic) -> Result<TutorResponse> {
        agent::greet(self.generators.tutor.as_ref(), topic).await
    }

    /// run one stage against the current state
    pub async fn run_stage(&self, stage: Stage, state: &ProjectState) -> Result<StageOutput> {
        let output = match stage {
            Stage::Analyze => StageOutput::Relationships(self.analyze(&state.description).await?),
            Stage::Diagram => StageOutput::ErmSource(self.build_diagram_source(&state.relationships)),
            Stage::TableModel => StageOutput::TableModelSource(
                self.transform_to_logical_model(&state.erm_source).await?,
            ),
            Stage::Schema => {
                StageOutput::DdlScript(self.generate_schema(&state.table_model_source).await?)
            }
        };
        Ok(output)
    }

    /// bring `state` up to `target`, resuming after the last artifact present
    pub async fn run(&self, state: ProjectState, target: Stage) -> PipelineRun {
        let plan = Stage::plan(target, &state);
        self.run_stages(state, plan, target).await
    }

    /// drop the artifacts of `stage` and everything after it, then run
    /// through to the schema. used after the relationship table was edited.
    pub async fn rerun_from(&self, mut state: ProjectState, stage: Stage) -> PipelineRun {
        let stages: Vec<Stage> = stage.and_later().collect();
        for later in &stages {
            later.clear_output(&mut state);
        }
        self.run_stages(state, stages, Stage::Schema).await
    }

    async fn run_stages(&self, state: ProjectState, stages: Vec<Stage>, target: Stage) -> PipelineRun {
        let span = tracing::info_span!(
            "pipeline::run",
            pipeline.target = %target,
            pipeline.stage_count = stages.len()
        );

        async move {
            let mut state = state;
            let mut completed = Vec::with_capacity(stages.len());

            if stages.is_empty() {
                tracing::info!("nothing to do, artifacts already present");
            }

            for stage in stages {
                let stage_span = tracing::info_span!("stage", stage.name = %stage, otel.kind = "internal");
                let start = Instant::now();

                let result = async {
                    tracing::info!("executing stage");
                    self.run_stage(stage, &state).await
                }
                .instrument(stage_span.clone())
                .await;

                match result {
                    Ok(output) => {
                        output.apply(&mut state);
                        let duration_ms = start.elapsed().as_millis() as u64;
                        stage_span.in_scope(|| {
                            tracing::info!(stage.duration_ms = duration_ms, "stage completed")
                        });
                        completed.push(StageReport { stage, duration_ms });
                    }
                    Err(error) => {
                        tracing::error!(stage = %stage, error = %error, "stage failed, halting");
                        return PipelineRun {
                            state,
                            completed,
                            failure: Some(StageFailure { stage, error }),
                        };
                    }
                }
            }

            tracing::info!(completed_stages = completed.len(), "pipeline run complete");
            PipelineRun {
                state,
                completed,
                failure: None,
            }
        }
        .instrument(span)
        .await
    }
}

fn non_blank(stage: Stage, output: &str) -> Result<String> {
    if output.is_empty() {
        return Err(ErmError::Generation(format!(
            "generator returned no content for stage '{}'",
            stage
        )));
    }
    Ok(output.to_string())
}
