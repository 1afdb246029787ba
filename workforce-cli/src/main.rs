//! Workforce CLI - run tasks through the multi-agent workflow

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

use workforce_core::config::WorkforceConfig;
use workforce_core::llm::provider_from_config;
use workforce_core::pubsub::{EventKind, LocalPubSub};
use workforce_core::search::{NullSearch, SearchProvider, TavilySearch};
use workforce_core::service::TaskService;
use workforce_core::store::{InMemoryMessageStore, InMemoryTaskStore};
use workforce_core::task::TaskStatus;
use workforce_core::workflow::WorkflowEngine;

#[derive(Parser)]
#[command(name = "workforce")]
#[command(about = "Supervisor-coordinated multi-agent workflow engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one task through the workflow and print the deliverable
    Run {
        /// Task title
        #[arg(short, long)]
        title: String,

        /// Task description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Configuration file path (defaults to workforce.toml plus
        /// WORKFORCE_-prefixed environment variables)
        #[arg(short, long, env = "WORKFORCE_CONFIG_FILE")]
        config: Option<String>,

        /// Print only the deliverable, without progress messages
        #[arg(short, long)]
        quiet: bool,
    },
    /// Version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("workforce {}", env!("CARGO_PKG_VERSION"));
            println!("workforce-core {}", workforce_core::VERSION);
        }
        Commands::Run {
            title,
            description,
            config,
            quiet,
        } => {
            let config = match config {
                Some(path) => WorkforceConfig::from_file(path)?,
                None => WorkforceConfig::load()?,
            };
            let exit_code = run_task(config, &title, &description, quiet).await?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run_task(
    config: WorkforceConfig,
    title: &str,
    description: &str,
    quiet: bool,
) -> Result<i32> {
    let llm = provider_from_config(&config.llm)?;
    let search: Arc<dyn SearchProvider> = match (config.search.enabled, &config.search.api_key) {
        (true, Some(api_key)) => Arc::new(TavilySearch::new(api_key.clone())),
        _ => {
            if config.search.enabled {
                warn!("search enabled without an API key, running without search");
            }
            Arc::new(NullSearch)
        }
    };

    let tasks = Arc::new(InMemoryTaskStore::new());
    let messages = Arc::new(InMemoryMessageStore::new());
    let pubsub = Arc::new(LocalPubSub::new());

    let engine = WorkflowEngine::builder()
        .llm(llm)
        .search(search)
        .task_store(tasks.clone())
        .message_store(messages.clone())
        .pubsub(pubsub.clone())
        .config(config.workflow.clone())
        .max_search_results(config.search.max_results)
        .build()?;

    let service = TaskService::new(
        Arc::new(engine),
        tasks,
        messages,
        pubsub,
        config.workflow.max_concurrent_tasks,
    );

    let task = service.create_task(title, description).await?;
    let mut subscription = service.subscribe(&task.id).await?;

    let progress = tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            if quiet {
                if matches!(event.kind, EventKind::TaskCompleted | EventKind::Error) {
                    break;
                }
                continue;
            }
            match event.kind {
                EventKind::TaskStarted => eprintln!("[workflow] task started"),
                EventKind::AgentMessage => {
                    let role = event.payload["agent_role"].as_str().unwrap_or("agent");
                    let content = event.payload["content"].as_str().unwrap_or_default();
                    eprintln!("[{}] {}", role, content);
                }
                EventKind::TaskCompleted => {
                    eprintln!("[workflow] task completed");
                    break;
                }
                EventKind::Error => {
                    let error = event.payload["error"].as_str().unwrap_or("unknown error");
                    eprintln!("[workflow] task failed: {}", error);
                    break;
                }
            }
        }
    });

    let result = service.run_task(&task.id).await?;
    let _ = progress.await;

    let finished = service.get_task(&task.id).await?;
    if finished.status == TaskStatus::Completed {
        println!("{}", result);
        Ok(0)
    } else {
        // A failed run produced no deliverable; the result text is the
        // error description.
        eprintln!("task failed: {}", result);
        Ok(1)
    }
}
