use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use common::agent::{relationships_context, TutorTopic};
use common::config::{Backend, ErmConfig};
use common::llm::build_stage_generators;
use common::model::{
    load_relationships, load_snapshot_file, relationships_to_lines, save_relationships,
    save_snapshot_file, ProjectState, Relationship, DEFAULT_DIRECTION,
};
use common::pipeline::{summarize_diagram, Pipeline, Stage};
use common::tracing::init_tracing;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ermgen")]
#[command(
    about = "turn a natural-language description into an erm diagram, a table model and sql ddl",
    long_about = None
)]
pub struct Cli {
    /// Config file (default: ./ermgen.toml when present)
    #[arg(long, global = true, env = "ERMGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Generator backend for every role (ollama, openai, scripted)
    #[arg(long, global = true, env = "ERMGEN_BACKEND")]
    backend: Option<Backend>,

    /// Model name for every role
    #[arg(long, global = true, env = "ERMGEN_MODEL")]
    model: Option<String>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract canonical relationships from a description
    Analyze {
        /// Description text file ("-" for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the relationships as json instead of pipe lines
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Render a relationship json file as a conceptual PlantUML diagram
    Diagram {
        /// Relationship json file ("-" for stdin)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Transform a conceptual PlantUML diagram into a logical table model
    TableModel {
        /// Conceptual PlantUML file ("-" for stdin)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a MariaDB DDL script from a logical table model
    Schema {
        /// Logical model PlantUML file ("-" for stdin)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the pipeline on a project snapshot and save the result
    Run {
        /// Project snapshot (created when missing)
        #[arg(short, long)]
        project: PathBuf,

        /// Description text file; replaces the project's description
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Last stage to run (analyze, diagram, table-model, schema)
        #[arg(long, default_value = "schema")]
        until: Stage,

        /// Regenerate this stage and every later one, through to schema
        #[arg(long, conflicts_with = "until")]
        from: Option<Stage>,
    },

    /// Ask a tutor about an artifact
    Tutor {
        /// relationships, erm-diagram, erm-plantuml, logical-model,
        /// logical-model-plantuml, sql-ddl or information
        #[arg(short, long)]
        topic: TutorTopic,

        /// Context file; overrides the artifact taken from --project
        #[arg(long)]
        context: Option<PathBuf>,

        /// Project snapshot to take the context from
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Print the raw response json
        #[arg(long, default_value = "false")]
        json: bool,

        /// Question; without one the tutor greets and suggests questions
        question: Option<String>,
    },

    /// Edit the relationship table of a project
    Relation {
        #[command(subcommand)]
        subcommand: RelationCommands,
    },

    /// Summarize a project snapshot
    Show {
        #[arg(short, long)]
        project: PathBuf,
    },
}

#[derive(Subcommand)]
enum RelationCommands {
    /// Append a relationship given as Entity1|Cardinality1|Verb|Cardinality2|Entity2
    Add {
        #[arg(short, long)]
        project: PathBuf,

        line: String,

        #[arg(long, default_value = DEFAULT_DIRECTION)]
        direction: String,
    },

    /// Remove a relationship by its number in `relation list`
    Remove {
        #[arg(short, long)]
        project: PathBuf,

        number: usize,
    },

    /// List the relationships of a project
    List {
        #[arg(short, long)]
        project: PathBuf,

        /// Write the list as json
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let _guard = init_tracing("ermgen", self.verbose)?;

        let config = ErmConfig::load(self.config.as_deref())?.with_overrides(self.backend, self.model);

        match self.command {
            Commands::Analyze {
                input,
                output,
                json,
            } => analyze(&config, &input, output.as_deref(), json).await,
            Commands::Diagram { input, output } => diagram(&input, output.as_deref()),
            Commands::TableModel { input, output } => {
                table_model(&config, &input, output.as_deref()).await
            }
            Commands::Schema { input, output } => schema(&config, &input, output.as_deref()).await,
            Commands::Run {
                project,
                input,
                until,
                from,
            } => run(&config, &project, input.as_deref(), until, from).await,
            Commands::Tutor {
                topic,
                context,
                project,
                json,
                question,
            } => {
                tutor(
                    &config,
                    topic,
                    context.as_deref(),
                    project.as_deref(),
                    json,
                    question.as_deref().unwrap_or_default(),
                )
                .await
            }
            Commands::Relation { subcommand } => match subcommand {
                RelationCommands::Add {
                    project,
                    line,
                    direction,
                } => relation_add(&project, &line, direction),
                RelationCommands::Remove { project, number } => relation_remove(&project, number),
                RelationCommands::List { project, json } => relation_list(&project, json),
            },
            Commands::Show { project } => show(&project),
        }
    }
}

fn build_pipeline(config: &ErmConfig) -> Result<Pipeline> {
    let generators = build_stage_generators(config)?;
    tracing::debug!(?generators, "generators ready");
    Ok(Pipeline::new(generators))
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, text)?;
            tracing::info!(output = %path.display(), bytes = text.len(), "wrote artifact");
        }
        None => println!("{}", text),
    }
    Ok(())
}

async fn analyze(config: &ErmConfig, input: &Path, output: Option<&Path>, json: bool) -> Result<()> {
    let description = read_input(input)?;
    let relationships = build_pipeline(config)?.analyze(&description).await?;

    let text = if json {
        let mut buf = Vec::new();
        save_relationships(&relationships, &mut buf)?;
        String::from_utf8(buf)?
    } else {
        relationships_to_lines(&relationships)
    };

    write_output(output, &text)
}

fn diagram(input: &Path, output: Option<&Path>) -> Result<()> {
    let relationships = load_relationships(read_input(input)?.as_bytes())?;
    let source = common::pipeline::build_diagram_source(&relationships);
    write_output(output, &source)
}

async fn table_model(config: &ErmConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let erm_source = read_input(input)?;
    let source = build_pipeline(config)?
        .transform_to_logical_model(&erm_source)
        .await?;
    write_output(output, &source)
}

async fn schema(config: &ErmConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let table_model_source = read_input(input)?;
    let script = build_pipeline(config)?.generate_schema(&table_model_source).await?;
    write_output(output, &script)
}

async fn run(
    config: &ErmConfig,
    project: &Path,
    input: Option<&Path>,
    until: Stage,
    from: Option<Stage>,
) -> Result<()> {
    let mut state = if project.exists() {
        load_snapshot_file(project)?
    } else if input.is_some() {
        tracing::info!(project = %project.display(), "starting new project");
        ProjectState::default()
    } else {
        anyhow::bail!("{} does not exist; pass --input to start a project", project.display());
    };

    if let Some(input) = input {
        let description = read_input(input)?;
        if description != state.description {
            // a new description invalidates everything derived from the old one
            state.description = description;
            for stage in Stage::Analyze.and_later() {
                stage.clear_output(&mut state);
            }
        }
    }

    let pipeline = build_pipeline(config)?;
    let outcome = match from {
        Some(stage) => pipeline.rerun_from(state, stage).await,
        None => pipeline.run(state, until).await,
    };

    // always keep what was produced, a failed stage can be retried later
    save_snapshot_file(&outcome.state, project)?;

    for report in &outcome.completed {
        tracing::info!(stage = %report.stage, duration_ms = report.duration_ms, "stage done");
    }

    match outcome.failure {
        None => {
            eprintln!(
                "{} stage(s) completed, project saved to {}",
                outcome.completed.len(),
                project.display()
            );
            Ok(())
        }
        Some(failure) => Err(anyhow::Error::new(failure.error).context(format!(
            "stage '{}' failed; earlier artifacts were saved to {}",
            failure.stage,
            project.display()
        ))),
    }
}

fn project_context(topic: TutorTopic, state: &ProjectState) -> String {
    match topic {
        TutorTopic::Relationships => relationships_context(&state.relationships),
        TutorTopic::ErmDiagram | TutorTopic::ErmPlantUml => state.erm_source.clone(),
        TutorTopic::LogicalModel | TutorTopic::LogicalModelPlantUml => {
            state.table_model_source.clone()
        }
        TutorTopic::SqlDdl => state.ddl_script.clone(),
        TutorTopic::Information => String::new(),
    }
}

async fn tutor(
    config: &ErmConfig,
    topic: TutorTopic,
    context: Option<&Path>,
    project: Option<&Path>,
    json: bool,
    question: &str,
) -> Result<()> {
    let context = match (context, project) {
        (Some(path), _) => read_input(path)?,
        (None, Some(project)) => project_context(topic, &load_snapshot_file(project)?),
        (None, None) => String::new(),
    };

    let response = build_pipeline(config)?
        .ask_tutor(topic, &context, question)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", response.answer);
    if !response.suggested_questions.is_empty() {
        println!();
        for suggestion in &response.suggested_questions {
            println!("- {}", suggestion);
        }
    }
    Ok(())
}

fn relation_add(project: &Path, line: &str, direction: String) -> Result<()> {
    let mut relationship = Relationship::from_pipe_line(line).with_context(|| {
        format!(
            "'{}' is not Entity1|Cardinality1|Verb|Cardinality2|Entity2",
            line
        )
    })?;
    relationship.direction = direction;

    let state = load_snapshot_file(project)?.with_relationship_added(relationship);
    save_snapshot_file(&state, project)?;

    eprintln!("{} relationship(s) in {}", state.relationships.len(), project.display());
    Ok(())
}

fn relation_remove(project: &Path, number: usize) -> Result<()> {
    let index = number
        .checked_sub(1)
        .context("relationship numbers start at 1")?;

    let state = load_snapshot_file(project)?.with_relationship_removed(index)?;
    save_snapshot_file(&state, project)?;

    eprintln!("{} relationship(s) in {}", state.relationships.len(), project.display());
    Ok(())
}

fn relation_list(project: &Path, json: bool) -> Result<()> {
    let state = load_snapshot_file(project)?;

    if json {
        save_relationships(&state.relationships, std::io::stdout().lock())?;
        println!();
        return Ok(());
    }

    for (idx, rel) in state.relationships.iter().enumerate() {
        println!("{:>3}  {} {}", idx + 1, rel.to_pipe_line(), rel.direction);
    }
    Ok(())
}

fn show(project: &Path) -> Result<()> {
    let state = load_snapshot_file(project)?;

    println!("project: {}", project.display());
    println!("description: {} chars", state.description.chars().count());
    println!("relationships: {}", state.relationships.len());

    for (label, source) in [
        ("erm diagram", &state.erm_source),
        ("table model", &state.table_model_source),
    ] {
        if source.trim().is_empty() {
            println!("{}: -", label);
            continue;
        }
        let summary = summarize_diagram(source);
        println!(
            "{}: {} entities, {} links{}",
            label,
            summary.entities.len(),
            summary.links,
            if summary.well_formed { "" } else { " (not wrapped in @startuml/@enduml)" }
        );
    }

    if state.ddl_script.trim().is_empty() {
        println!("ddl script: -");
    } else {
        println!("ddl script: {} lines", state.ddl_script.lines().count());
    }

    let next = Stage::plan(Stage::Schema, &state);
    match next.first() {
        Some(stage) => println!("next stage: {}", stage),
        None => println!("next stage: - (complete)"),
    }
    Ok(())
}
