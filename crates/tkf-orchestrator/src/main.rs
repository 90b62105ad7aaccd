use anyhow::{anyhow, Context};
use async_trait::async_trait;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tkf_events::InMemoryEventLog;
use tkf_fabric::{InMemoryKnowledgeStore, KnowledgeStore};
use tkf_knowledge::InMemoryPersonaDirectory;
use tkf_llm::{parse_verdict, GenerationRequest, LlmError, OpenAiClient, TextGenerator};
use tkf_orchestrator::{AppConfig, PersonaOutcome, RunReport, Workflow};
use tracing_subscriber::EnvFilter;

/// Stand-in used when no endpoint is configured; fails on first use
struct Unconfigured;

#[async_trait]
impl TextGenerator for Unconfigured {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        Err(LlmError::Config(format!(
            "`{}` needs a generative service; set TKF_LLM_ENDPOINT or [llm] endpoint",
            request.name
        )))
    }
}

fn cli() -> Command {
    Command::new("tkf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Trusted Knowledge Fabric: persona-driven UX knowledge pipeline")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("seed")
                .about("Seed the TKF and print the resulting content")
                .arg(
                    Arg::new("knowledge")
                        .long("knowledge")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Initial knowledge: text, or a JSON array of {statement, reasoning}"),
                ),
        )
        .subcommand(
            Command::new("process")
                .about("Ingest browser runs and curate their knowledge into the TKF")
                .arg(
                    Arg::new("runs-dir")
                        .long("runs-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory with one sub-directory per run"),
                )
                .arg(
                    Arg::new("personas-dir")
                        .long("personas-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory of persona JSON profiles"),
                )
                .arg(
                    Arg::new("knowledge")
                        .long("knowledge")
                        .value_parser(value_parser!(PathBuf))
                        .help("Initial knowledge to seed before processing"),
                ),
        )
        .subcommand(
            Command::new("verdict")
                .about("Parse a judge reply under the strict verdict contract")
                .arg(Arg::new("text").required(true).help("Reply text")),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn generator(config: &AppConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    if config.llm.endpoint.is_none() {
        return Ok(Arc::new(Unconfigured));
    }
    let client = OpenAiClient::new(config.llm.clone()).context("failed to build LLM client")?;
    Ok(Arc::new(client))
}

/// Command-line path, else the configured one
fn path_arg(args: &ArgMatches, name: &str, configured: Option<&PathBuf>) -> Option<PathBuf> {
    args.get_one::<PathBuf>(name).or(configured).cloned()
}

fn print_report(report: &RunReport) {
    println!("Run {}", report.group_id);
    for persona in &report.personas {
        let status = match &persona.outcome {
            PersonaOutcome::Edited { statements, report } => format!(
                "{statements} statements, {} admitted: {}",
                report.admitted(),
                report.message
            ),
            PersonaOutcome::NoKnowledge => "no knowledge accepted".to_string(),
            PersonaOutcome::UnknownPersona => "unknown persona, skipped".to_string(),
            PersonaOutcome::Failed { error } => format!("FAILED: {error}"),
        };
        println!("  {} ({} events): {status}", persona.persona_id, persona.events);
    }
}

async fn seed(config: &AppConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let path = path_arg(args, "knowledge", config.init_knowledge.as_ref())
        .ok_or_else(|| anyhow!("--knowledge is required"))?;
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let store = InMemoryKnowledgeStore::new(config.fabric, generator(config)?);
    store.seed(&raw).await.context("seeding failed")?;
    println!("{}", store.full_content().await);
    Ok(())
}

async fn process(config: &AppConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let runs_dir = path_arg(args, "runs-dir", config.runs_dir.as_ref())
        .ok_or_else(|| anyhow!("--runs-dir (or runs_dir in config) is required"))?;
    let personas_dir = path_arg(args, "personas-dir", config.personas_dir.as_ref())
        .ok_or_else(|| anyhow!("--personas-dir (or personas_dir in config) is required"))?;

    let llm = generator(config)?;
    let personas = InMemoryPersonaDirectory::load_from_dir(&personas_dir)?;
    let workflow = Workflow::new(
        Arc::new(InMemoryEventLog::with_config(config.events)),
        Arc::new(InMemoryKnowledgeStore::new(config.fabric, llm.clone())),
        Arc::new(personas),
        llm,
    )
    .with_generator_config(config.generator)
    .with_editor_config(config.editor);

    if let Some(knowledge) = path_arg(args, "knowledge", config.init_knowledge.as_ref()) {
        workflow.initialize_from_file(&knowledge).await?;
    }

    let reports = workflow.process_runs_dir(&runs_dir).await?;
    for report in &reports {
        print_report(report);
    }
    let admitted: usize = reports.iter().map(RunReport::admitted).sum();
    println!();
    println!("{} runs processed, {admitted} updates admitted", reports.len());
    println!();
    println!("{}", workflow.store().full_content().await);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json"));

    let config = AppConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("seed", args)) => seed(&config, args).await,
        Some(("process", args)) => process(&config, args).await,
        Some(("verdict", args)) => {
            let text = args
                .get_one::<String>("text")
                .ok_or_else(|| anyhow!("missing reply text"))?;
            let verdict = parse_verdict(text)?;
            println!("{verdict}");
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn process_flags_parse() {
        let matches = cli()
            .try_get_matches_from([
                "tkf",
                "process",
                "--runs-dir",
                "runs",
                "--personas-dir",
                "personas",
                "--json",
            ])
            .unwrap();
        assert!(matches.get_flag("json"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "process");
        assert_eq!(
            path_arg(args, "runs-dir", None),
            Some(PathBuf::from("runs"))
        );
        assert_eq!(
            path_arg(args, "knowledge", Some(&PathBuf::from("seed.json"))),
            Some(PathBuf::from("seed.json"))
        );
    }

    #[tokio::test]
    async fn unconfigured_service_fails_on_use() {
        let err = Unconfigured
            .generate(GenerationRequest::new("tkf_formatter", "", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));
    }
}
