//! designer-brain - extract and query a design-system model from HTML/CSS templates

mod server;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use brain_common::{ComponentCategory, ComponentRecord, ComponentType, DesignModel};
use brain_core::{load_model, save_model, Ingestor, ModelStore, SourceWatcher, WalkConfig};
use brain_query::{GenerationRequest, SearchQuery, DEFAULT_LIMIT};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "designer-brain")]
#[command(version, about = "Design-system extraction from static templates", long_about = None)]
#[command(after_help = "EXAMPLES:
    designer-brain extract ./template -o design-model.json
    designer-brain search card --type card
    designer-brain context --type button --description \"Checkout button\"
    designer-brain serve --source ./template --watch")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ModelArg {
    /// Model document to read
    #[arg(long = "model", value_name = "FILE", default_value = "design-model.json")]
    path: PathBuf,
}

#[derive(Args)]
struct WalkArgs {
    /// Skip files larger than this many bytes
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Extra directory names to skip
    #[arg(long = "ignore", value_name = "DIR")]
    ignore: Vec<String>,
}

impl WalkArgs {
    fn config(&self) -> WalkConfig {
        let mut config = WalkConfig::default();
        if let Some(max) = self.max_file_size {
            config.max_file_size = max;
        }
        config.ignore_patterns.extend(self.ignore.iter().cloned());
        config
    }
}

#[derive(Subcommand)]
enum Command {
    /// Extract a design model from a template directory
    Extract {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        #[arg(short, long, value_name = "FILE", default_value = "design-model.json")]
        output: PathBuf,

        /// Pretty-print the model document
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        walk: WalkArgs,
    },

    /// Show model counts
    Stats {
        #[command(flatten)]
        model: ModelArg,
    },

    /// Search components by name, description or use case
    Search {
        query: String,

        #[arg(long = "type", value_parser = parse_type)]
        component_type: Option<ComponentType>,

        #[arg(long, value_parser = parse_category)]
        category: Option<ComponentCategory>,

        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        #[command(flatten)]
        model: ModelArg,
    },

    /// Print one component record as JSON
    Show {
        id: String,

        #[command(flatten)]
        model: ModelArg,
    },

    /// Assemble a generation brief for a component type
    Context {
        #[arg(long = "type", value_parser = parse_type)]
        component_type: ComponentType,

        #[arg(long)]
        description: String,

        #[arg(long)]
        variant: Option<String>,

        /// Leave the token set out of the context
        #[arg(long)]
        no_tokens: bool,

        /// Print the context as JSON instead of the markdown brief
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        model: ModelArg,
    },

    /// Score markup and styles against the model's constraints
    Validate {
        #[arg(long, value_name = "FILE")]
        html: PathBuf,

        #[arg(long, value_name = "FILE")]
        css: Option<PathBuf>,

        #[command(flatten)]
        model: ModelArg,
    },

    /// Serve the model over HTTP
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,

        /// Template directory to extract from at startup
        #[arg(long, value_name = "DIR")]
        source: Option<PathBuf>,

        /// Re-extract when files under --source change
        #[arg(long, requires = "source")]
        watch: bool,

        #[command(flatten)]
        walk: WalkArgs,

        #[command(flatten)]
        model: ModelArg,
    },
}

fn parse_type(value: &str) -> std::result::Result<ComponentType, String> {
    ComponentType::parse(value).ok_or_else(|| {
        let known: Vec<&str> = ComponentType::ALL.iter().map(|t| t.as_str()).collect();
        format!("unknown component type '{}' (expected one of: {})", value, known.join(", "))
    })
}

fn parse_category(value: &str) -> std::result::Result<ComponentCategory, String> {
    ComponentCategory::parse(value).ok_or_else(|| {
        let known: Vec<&str> = ComponentCategory::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown category '{}' (expected one of: {})", value, known.join(", "))
    })
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("DESIGNER_BRAIN_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Extract {
            dir,
            output,
            pretty,
            walk,
        } => {
            let model = Ingestor::new(dir).with_config(walk.config()).run().await?;
            save_model(&output, &model, pretty).await?;
            print_stats(&model);
            println!("\n{} {}", "Saved".green().bold(), output.display());
        }
        Command::Stats { model } => {
            let model = read_model(&model.path).await?;
            print_stats(&model);
        }
        Command::Search {
            query,
            component_type,
            category,
            limit,
            model,
        } => {
            let model = read_model(&model.path).await?;
            let mut search = SearchQuery::new(query).with_limit(limit);
            if let Some(t) = component_type {
                search = search.with_type(t);
            }
            if let Some(c) = category {
                search = search.with_category(c);
            }

            let results = brain_query::search(&model, &search);
            if results.is_empty() {
                println!("{}", "No matching components".yellow());
            }
            for component in results {
                print_component_line(component);
            }
        }
        Command::Show { id, model } => {
            let model = read_model(&model.path).await?;
            let component = brain_query::retrieve(&model, &id)
                .with_context(|| format!("No component with id '{}'", id))?;
            println!("{}", serde_json::to_string_pretty(component)?);
        }
        Command::Context {
            component_type,
            description,
            variant,
            no_tokens,
            json,
            model,
        } => {
            let model = read_model(&model.path).await?;
            let mut request = GenerationRequest::new(component_type, description);
            if let Some(v) = variant {
                request = request.with_variant(v);
            }
            if no_tokens {
                request = request.without_tokens();
            }

            let context = brain_query::assemble_generation_context(&model, request)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&context)?);
            } else {
                println!("{}", context.render_prompt());
            }
        }
        Command::Validate { html, css, model } => {
            let model = read_model(&model.path).await?;
            let html = tokio::fs::read_to_string(&html)
                .await
                .with_context(|| format!("Failed to read {}", html.display()))?;
            let css = match css {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => String::new(),
            };

            let report = brain_query::validate(&model.constraints, &html, &css)?;
            let verdict = if report.valid {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            };
            println!("{} score {}/100", verdict, report.score);
            for issue in &report.issues {
                println!("  {} {}", "-".yellow(), issue.message);
                for occurrence in &issue.occurrences {
                    println!("      {}", occurrence.dimmed());
                }
                println!("    {} {}", "hint:".cyan(), issue.suggestion);
            }
        }
        Command::Serve {
            port,
            source,
            watch,
            walk,
            model,
        } => {
            let store = match &source {
                Some(dir) => {
                    let model = Ingestor::new(dir.clone())
                        .with_config(walk.config())
                        .run()
                        .await?;
                    ModelStore::new(model)
                }
                None => ModelStore::new(read_model(&model.path).await?),
            };

            let _watcher = match source {
                Some(dir) if watch => {
                    let ingestor = Ingestor::new(dir).with_config(walk.config());
                    Some(SourceWatcher::spawn(ingestor, store.clone())?)
                }
                _ => None,
            };

            server::serve(store, port).await?;
        }
    }
    Ok(())
}

async fn read_model(path: &Path) -> Result<DesignModel> {
    let model = load_model(path)
        .await
        .with_context(|| format!("Failed to load model from {}", path.display()))?;
    info!("Loaded {} components from {}", model.components.len(), path.display());
    Ok(model)
}

fn print_stats(model: &DesignModel) {
    let stats = model.stats();
    println!("{}", "Design model".bold());
    println!("  Version:       {}", model.metadata.version);
    println!("  Sources:       {}", model.metadata.sources.len());
    println!("  Components:    {}", stats.components.to_string().cyan());
    println!("  Color tokens:  {}", stats.color_tokens);
    println!("  Spacing:       {}", stats.spacing_tokens);
    println!("  Typography:    {}", stats.typography_tokens);
    println!("  Effects:       {}", stats.effect_tokens);
    println!("  Relationships: {}", stats.relationship_edges);

    let p = &model.philosophy;
    println!(
        "  Philosophy:    {:?} / {:?} / {:?} spacing / {:?} corners",
        p.aesthetic, p.color_scheme, p.spacing_density, p.corner_style
    );
}

fn print_component_line(component: &ComponentRecord) {
    println!(
        "{} {} {}",
        component.name.bold(),
        format!("[{}/{}]", component.component_type, component.category).dimmed(),
        component.id.dimmed()
    );
    println!("    {}", component.description);
}
