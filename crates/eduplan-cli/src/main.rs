mod config;
mod generate_cmd;
mod models_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};

use eduplan_core::{
    ApiKey, CurriculumParams, DocumentKind, GenerationPipeline, GenerationRequest, LessonParams,
    TermPlanParams,
};

use config::{CliOverrides, EduplanConfig};

#[derive(Parser)]
#[command(
    name = "eduplan",
    about = "Generate curriculum maps, term plans and lesson plans with Gemini"
)]
struct Cli {
    /// Gemini API key (overrides GEMINI_API_KEY env var)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Comma-separated model fallback chain (overrides EDUPLAN_MODELS env var)
    #[arg(long, global = true)]
    models: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an eduplan config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate a document and print it as JSON
    Generate {
        #[command(subcommand)]
        command: GenerateCommands,
    },
    /// Rewrite one section of an existing document
    Refine {
        /// Document kind: curriculum, planeadores, or clases
        #[arg(long)]
        kind: DocumentKind,
        /// JSON file holding the document (`-` for stdin)
        #[arg(long)]
        file: String,
        /// Section to rewrite (e.g. objetivos)
        #[arg(long)]
        section: String,
        /// What to change
        #[arg(long)]
        instructions: String,
    },
    /// List models available to the configured key
    Models,
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum GenerateCommands {
    /// Curriculum map covering every academic period
    Curriculum {
        /// Subject (asignatura)
        #[arg(long)]
        subject: String,
        /// Grade (grado)
        #[arg(long)]
        grade: String,
        /// Education level (nivel)
        #[arg(long)]
        level: String,
        /// Student age range (edades)
        #[arg(long)]
        ages: String,
        /// Number of academic periods
        #[arg(long, default_value_t = 4)]
        periods: u32,
        /// Academic year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Lesson plan for one academic period
    Plan {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        grade: String,
        /// Academic period (periodo)
        #[arg(long)]
        period: String,
        /// Optional topic (tema)
        #[arg(long)]
        topic: Option<String>,
    },
    /// Plan for a single class session
    Lesson {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        grade: String,
        #[arg(long)]
        topic: Option<String>,
    },
}

impl GenerateCommands {
    fn into_request(self) -> GenerationRequest {
        match self {
            Self::Curriculum {
                subject,
                grade,
                level,
                ages,
                periods,
                year,
            } => GenerationRequest::CurriculumMap(CurriculumParams {
                subject,
                grade,
                level,
                ages,
                period_count: periods,
                year,
            }),
            Self::Plan {
                subject,
                grade,
                period,
                topic,
            } => GenerationRequest::TermPlan(TermPlanParams {
                subject,
                grade,
                period,
                topic,
            }),
            Self::Lesson {
                subject,
                grade,
                topic,
            } => GenerationRequest::LessonSession(LessonParams {
                subject,
                grade,
                topic,
            }),
        }
    }
}

/// Execute the `eduplan init` command: write config file.
fn cmd_init(api_key: Option<&str>, models: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile::default();
    let key = api_key.and_then(ApiKey::new);
    cfg.gemini.api_key = key.as_ref().map(|k| k.expose().to_string());
    if let Some(list) = models {
        let parsed = eduplan_core::ModelCandidates::parse_list(list).context("invalid --models list")?;
        cfg.gemini.models = Some(parsed.iter().map(str::to_string).collect());
    }

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    match &key {
        Some(k) => println!("  gemini.api_key = sha256:{}", k.fingerprint()),
        None => println!("  gemini.api_key not set (export {} instead)", config::ENV_API_KEY),
    }
    if let Some(list) = &cfg.gemini.models {
        println!("  gemini.models = {}", list.join(", "));
    }
    println!();
    println!("Next: run `eduplan serve` to start the API.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let overrides = CliOverrides {
        api_key: cli.api_key.as_deref(),
        models: cli.models.as_deref(),
        ..Default::default()
    };

    match cli.command {
        Commands::Init { force } => {
            cmd_init(cli.api_key.as_deref(), cli.models.as_deref(), force)?;
        }
        Commands::Serve { bind, port } => {
            let resolved = EduplanConfig::resolve(&CliOverrides {
                bind: bind.as_deref(),
                port,
                ..overrides
            })?;
            let pipeline = GenerationPipeline::from_config(&resolved.generation)
                .context("failed to build HTTP client")?;
            serve_cmd::run_serve(pipeline, &resolved.bind, resolved.port).await?;
        }
        Commands::Generate { command } => {
            let resolved = EduplanConfig::resolve(&overrides)?;
            let pipeline = GenerationPipeline::from_config(&resolved.generation)
                .context("failed to build HTTP client")?;
            generate_cmd::run_generate(&pipeline, command.into_request()).await?;
        }
        Commands::Refine {
            kind,
            file,
            section,
            instructions,
        } => {
            let request = generate_cmd::load_refinement(kind, &file, &section, &instructions)?;
            let resolved = EduplanConfig::resolve(&overrides)?;
            let pipeline = GenerationPipeline::from_config(&resolved.generation)
                .context("failed to build HTTP client")?;
            generate_cmd::run_generate(&pipeline, request).await?;
        }
        Commands::Models => {
            let resolved = EduplanConfig::resolve(&overrides)?;
            models_cmd::run_models(&resolved.generation).await?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "eduplan", &mut std::io::stdout());
        }
    }

    Ok(())
}
