use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cnp_core::config::{DedupConfig, PipelineConfig, SourceConfig};
use cnp_core::{Publisher, Result};
use cnp_inference::models::{LanguageModel, ModelBackend};
use cnp_inference::{create_model, LlmRanker, LlmSummarizer, DEFAULT_MODEL_NAME, DEFAULT_OLLAMA_URL};
use cnp_pipeline::{Orchestrator, PipelineParts, Scheduler, Trigger};
use cnp_publish::{DryRunPublisher, TemplateComposer, XConfig, XPublisher};
use cnp_scrappers::scrapers::build_client;
use cnp_scrappers::SourceManager;
use cnp_storage::DedupStore;
use cnp_web::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod duration;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Crypto and NFT news pipeline", long_about = None)]
pub struct Cli {
    /// Publication history used for de-duplication
    #[arg(long, env = "POSTED_FILE", default_value = "posted.json", global = true)]
    posted_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct ModelArgs {
    #[arg(long, env = "CNP_MODEL", value_enum, default_value = "ollama")]
    model: ModelBackend,
    #[arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_OLLAMA_URL)]
    model_url: String,
    #[arg(long, env = "CNP_MODEL_NAME", default_value = DEFAULT_MODEL_NAME)]
    model_name: String,
    #[arg(long, env = "CNP_MODEL_API_KEY", hide_env_values = true)]
    model_api_key: Option<String>,
}

impl ModelArgs {
    fn build(&self) -> Result<Arc<dyn LanguageModel>> {
        create_model(&cnp_inference::Config {
            backend: self.model,
            base_url: self.model_url.clone(),
            model_name: self.model_name.clone(),
            api_key: self.model_api_key.clone(),
        })
    }
}

#[derive(clap::Args, Debug)]
struct PipelineArgs {
    #[command(flatten)]
    model: ModelArgs,
    #[arg(long, env = "IMAGE_FOLDER", default_value = "images")]
    image_folder: PathBuf,
    #[arg(long, env = "X_ACCESS_TOKEN", hide_env_values = true)]
    x_access_token: Option<String>,
    #[arg(long, env = "X_REFRESH_TOKEN", hide_env_values = true)]
    x_refresh_token: Option<String>,
    #[arg(long, env = "X_CLIENT_ID")]
    x_client_id: Option<String>,
    #[arg(long, env = "X_CLIENT_SECRET", hide_env_values = true)]
    x_client_secret: Option<String>,
    /// Compose and log posts without sending them
    #[arg(long, env = "CNP_DRY_RUN")]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a cycle now and then on every interval, with the monitor alongside
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Time between cycles (e.g. 1h, 30m, 1h15m30s)
        #[arg(long, env = "CNP_INTERVAL", default_value = "1h")]
        interval: HumanDuration,
        #[arg(long, env = "CNP_MONITOR_ADDR", default_value = "0.0.0.0:8080")]
        monitor_addr: SocketAddr,
    },
    /// Run a single cycle and exit
    Cycle {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Serve the health and metrics endpoints only
    Serve {
        #[command(flatten)]
        model: ModelArgs,
        #[arg(long, env = "CNP_MONITOR_ADDR", default_value = "0.0.0.0:8080")]
        monitor_addr: SocketAddr,
    },
    /// Print a summary of the publication history
    Stats,
}

fn create_publisher(args: &PipelineArgs) -> Result<Arc<dyn Publisher>> {
    if args.dry_run {
        info!("🐦 Dry run requested, posts will only be logged");
        return Ok(Arc::new(DryRunPublisher::new()));
    }
    let Some(access_token) = args.x_access_token.clone().filter(|t| !t.trim().is_empty()) else {
        warn!("🐦 No X_ACCESS_TOKEN configured, falling back to dry run");
        return Ok(Arc::new(DryRunPublisher::new()));
    };

    let mut config = XConfig::new(access_token);
    config.refresh_token = args.x_refresh_token.clone();
    config.client_id = args.x_client_id.clone();
    config.client_secret = args.x_client_secret.clone();
    Ok(Arc::new(XPublisher::new(config)?))
}

async fn create_orchestrator(args: &PipelineArgs, store: Arc<DedupStore>) -> Result<(Orchestrator, Arc<dyn LanguageModel>)> {
    let sources = Arc::new(SourceConfig::default());
    let manager = SourceManager::from_config(sources.clone())?;

    let model = args.model.build()?;
    if let Err(e) = model.health().await {
        warn!("🤖 Model backend {} not reachable yet: {}", model.name(), e);
    }

    let composer = TemplateComposer::new(build_client(&sources)?, sources.keywords.clone(), &args.image_folder);
    let parts = PipelineParts {
        sources: manager.sources().to_vec(),
        extractor: manager.extractor(),
        store,
        ranker: Arc::new(LlmRanker::new(model.clone())),
        summarizer: Arc::new(LlmSummarizer::new(model.clone())),
        composer: Arc::new(composer),
        publisher: create_publisher(args)?,
    };
    Ok((Orchestrator::new(parts, PipelineConfig::default()), model))
}

/// Cancel `token` on ctrl-c.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("🛑 Shutdown requested, finishing in-flight work");
                token.cancel();
            }
            Err(e) => error!("Failed to listen for ctrl-c: {}", e),
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let store = Arc::new(DedupStore::load(&cli.posted_file, DedupConfig::default()).await);
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Run {
            pipeline,
            interval,
            monitor_addr,
        } => {
            let (orchestrator, model) = create_orchestrator(&pipeline, store.clone()).await?;
            let scheduler = Arc::new(Scheduler::new(Arc::new(orchestrator), cancel.clone()));
            let state = AppState::new(store)
                .with_model(model)
                .with_scheduler(scheduler.clone());

            cancel_on_ctrl_c(cancel.clone());
            let monitor = tokio::spawn(cnp_web::serve(monitor_addr, state, cancel.clone()));
            scheduler.run(interval.0).await;

            match monitor.await {
                Ok(Err(e)) => error!("Monitor failed: {}", e),
                Err(e) => error!("Monitor task panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }
        Commands::Cycle { pipeline } => {
            let (orchestrator, _) = create_orchestrator(&pipeline, store).await?;
            let scheduler = Scheduler::new(Arc::new(orchestrator), cancel.clone());
            cancel_on_ctrl_c(cancel);
            if let Trigger::Started(report) = scheduler.trigger().await {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Commands::Serve { model, monitor_addr } => {
            let state = AppState::new(store).with_model(model.build()?);
            cancel_on_ctrl_c(cancel.clone());
            cnp_web::serve(monitor_addr, state, cancel).await?;
        }
        Commands::Stats => {
            let stats = store.stats().await;
            info!("💾 {} entries in {}", stats.entries, store.path().display());
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
