mod report;

use clap::{Parser, Subcommand};
use coamingx::{Engine, EngineOptions, ProjectInput, RuleTable};
use report::{EvaluationReport, TableReport};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "coamingx",
    version,
    about = "Brittle crack arrest measures for hatch coamings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a project document.
    Evaluate {
        #[arg(long, help = "Project input JSON")]
        input: PathBuf,
        #[arg(long, help = "Rule table revision JSON (defaults to the built-in table)")]
        rules: Option<PathBuf>,
        #[arg(long, help = "Engine options JSON")]
        options: Option<PathBuf>,
        #[arg(long, help = "Print the result as JSON instead of a report")]
        json: bool,
        #[arg(long, help = "Also write the JSON result to this file")]
        out: Option<PathBuf>,
    },
    /// Print a rule table revision.
    Table {
        #[arg(long, help = "Rule table revision JSON (defaults to the built-in table)")]
        rules: Option<PathBuf>,
        #[arg(long, help = "Print the table as JSON")]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Evaluate {
            input,
            rules,
            options,
            json,
            out,
        } => {
            let project = ProjectInput::from_json(&read(&input)?)?;
            let engine = Engine::new(load_table(rules.as_deref())?, load_options(options.as_deref())?);
            let result = engine.evaluate(&project);

            let serialized = result.to_json_pretty()?;
            if let Some(path) = out {
                fs::write(&path, &serialized)
                    .map_err(|error| format!("cannot write {}: {error}", path.display()))?;
                debug!(path = %path.display(), "result written");
            }
            if json {
                println!("{serialized}");
            } else {
                print!("{}", EvaluationReport(&result));
            }
        }
        Commands::Table { rules, json } => {
            let table = load_table(rules.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                print!("{}", TableReport(&table));
            }
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, Box<dyn Error>> {
    fs::read_to_string(path)
        .map_err(|error| format!("cannot read {}: {error}", path.display()).into())
}

fn load_table(path: Option<&Path>) -> Result<RuleTable, Box<dyn Error>> {
    match path {
        Some(path) => Ok(RuleTable::from_json(&read(path)?)?),
        None => Ok(RuleTable::builtin()),
    }
}

fn load_options(path: Option<&Path>) -> Result<EngineOptions, Box<dyn Error>> {
    match path {
        Some(path) => Ok(EngineOptions::from_json(&read(path)?)?),
        None => Ok(EngineOptions::default()),
    }
}
