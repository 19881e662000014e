//! DocuChat - Main CLI Entry Point

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use docuchat::agent::Orchestrator;
use docuchat::checkpoint::{CheckpointHandle, CheckpointLocation};
use docuchat::config::{RequestConfig, Settings};
use docuchat::conversations::{load_history, ConversationDb};
use docuchat::ingestion::{load_path, IngestionPipeline};
use docuchat::llm::ollama::HttpModelProvider;
use docuchat::retrieval::RetrieverFactory;
use docuchat::types::{DocumentInput, MessageRole};

#[derive(Parser)]
#[command(name = "docuchat", version, about = "Chat with your documents")]
struct Cli {
    /// Vector store provider (qdrant or memory)
    #[arg(long, global = true, default_value = "qdrant")]
    provider: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new conversation
    New {
        /// Conversation title
        #[arg(default_value = "New conversation")]
        title: String,
    },
    /// List conversations, most recently active first
    List,
    /// Rename a conversation
    Rename { thread_id: String, title: String },
    /// Delete a conversation (its documents and checkpoints are kept)
    Delete { thread_id: String },
    /// Show the message history of a conversation
    History { thread_id: String },
    /// Ingest documents into a conversation's scope
    Ingest {
        /// Files to ingest (PDF, JSON array, or plain text)
        files: Vec<PathBuf>,

        /// Conversation to scope the documents to
        #[arg(long)]
        thread: Option<String>,

        /// Make the documents visible to every conversation
        #[arg(long)]
        shared: bool,

        /// Fall back to the sample-docs file when no files are given
        #[arg(long)]
        sample: bool,
    },
    /// Ask a question within a conversation
    Chat {
        thread_id: String,
        query: String,

        /// Override the query model (provider/model-name)
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docuchat=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    let database = settings.database_path()?;
    let conversations = ConversationDb::open(&database)?;
    let checkpointer = CheckpointHandle::new(CheckpointLocation::Path(database));
    let retrievers = Arc::new(RetrieverFactory::new(settings.clone()));

    let result = run(cli, settings, conversations, checkpointer.clone(), retrievers).await;
    checkpointer.close().await;
    result
}

async fn run(
    cli: Cli,
    settings: Settings,
    conversations: ConversationDb,
    checkpointer: CheckpointHandle,
    retrievers: Arc<RetrieverFactory>,
) -> Result<()> {
    match cli.command {
        Commands::New { title } => {
            let conv = conversations.create(Some(&title), None)?;
            println!("{} {}", "Created".green(), conv.thread_id);
        }

        Commands::List => {
            let (listed, total) = conversations.list(100, 0, false)?;
            if listed.is_empty() {
                println!("No conversations yet. Start one with {}", "docuchat new".cyan());
                return Ok(());
            }
            for conv in &listed {
                println!(
                    "{}  {}  {}",
                    conv.thread_id.cyan(),
                    conv.updated_at.format("%Y-%m-%d %H:%M"),
                    conv.display_title()
                );
            }
            if total > listed.len() as i64 {
                println!("... and {} more", total - listed.len() as i64);
            }
        }

        Commands::Rename { thread_id, title } => {
            match conversations.update(&thread_id, &title)? {
                Some(conv) => println!("{} {}", "Renamed".green(), conv.display_title()),
                None => {
                    println!("{} conversation {} not found", "Error:".red(), thread_id);
                    std::process::exit(1);
                }
            }
        }

        Commands::Delete { thread_id } => {
            if conversations.soft_delete(&thread_id)? {
                println!("{} {}", "Deleted".green(), thread_id);
            } else {
                println!("Nothing to delete: {} was not found.", thread_id);
            }
        }

        Commands::History { thread_id } => {
            if conversations.get(&thread_id)?.is_none() {
                println!("{} conversation {} not found", "Error:".red(), thread_id);
                std::process::exit(1);
            }
            let history = load_history(&checkpointer, &thread_id).await;
            if history.is_empty() {
                println!("No messages in this conversation.");
                return Ok(());
            }
            for message in history {
                let label = match message.role {
                    MessageRole::User => "you".cyan(),
                    MessageRole::Assistant => "docuchat".green(),
                    MessageRole::System => "system".dimmed(),
                };
                println!("{}: {}", label, message.content);
            }
        }

        Commands::Ingest {
            files,
            thread,
            shared,
            sample,
        } => {
            let mut inputs: Vec<DocumentInput> = Vec::new();
            for file in &files {
                inputs.extend(load_path(file)?);
            }

            let mut config = RequestConfig::default()
                .with_value("retriever_provider", cli.provider.as_str())
                .with_value("use_sample_docs", sample);
            if let Some(thread_id) = &thread {
                config = config.with_thread_id(thread_id);
            }
            if shared {
                config = config.with_value("is_shared", true);
            }

            let pipeline = IngestionPipeline::new(retrievers);
            let report = pipeline.ingest(inputs, &config).await?;
            println!(
                "{} {} document(s) into scope {}",
                "Indexed".green(),
                report.indexed,
                report.scope.cyan()
            );
        }

        Commands::Chat {
            thread_id,
            query,
            model,
        } => {
            if conversations.get(&thread_id)?.is_none() {
                println!("{} conversation {} not found", "Error:".red(), thread_id);
                std::process::exit(1);
            }

            let models = Arc::new(HttpModelProvider::new(settings.endpoints.chat_url.clone()));
            let orchestrator =
                Orchestrator::new(models, retrievers).with_checkpointer(checkpointer);

            let mut config = RequestConfig::default()
                .with_thread_id(&thread_id)
                .with_value("retriever_provider", cli.provider.as_str());
            let model = model.or_else(|| settings.models.default.clone());
            if let Some(model) = model {
                config = config.with_value("query_model", model);
            }

            let state = orchestrator.run(&query, &config).await?;
            conversations.touch(&thread_id)?;

            match state.last_answer() {
                Some(answer) => println!("{}", answer),
                None => println!("{}", "No answer was produced.".yellow()),
            }
        }
    }

    Ok(())
}
