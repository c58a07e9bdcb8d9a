use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crm_pipeline::{
    handle_reorder, logging, storage::FileStore, ItemId, MoveEvent, PipelineConfig, PipelineItem,
    PipelineStore, Status,
};

#[derive(Parser)]
#[command(
    name = "crm-pipeline",
    version,
    about = "Inspect and reorder the CRM deal pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory holding the .pipeline store
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Pipeline config file (TOML); built-in stages are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty store
    Init,
    /// Add an item at the end of a column
    Add {
        /// Destination status
        status: String,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Print items grouped by column
    List {
        /// Only show this status
        #[arg(long)]
        status: Option<String>,
    },
    /// Move an item onto another item or a column
    Move {
        /// Id of the dragged item
        active: String,
        /// Id of the item or column it was dropped on
        over: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .await
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let store = FileStore::new(&cli.root);

    match cli.command {
        Commands::Init => {
            store.initialize().await?;
            println!("Initialized pipeline store in {}", cli.root.display());
        }
        Commands::Add { status, title } => {
            let pipeline = config.pipeline();
            let status = Status::from(status);
            if pipeline.column_for_status(&status).is_none() {
                anyhow::bail!("unknown status '{}'", status);
            }
            let mut item = PipelineItem::new(ItemId::generate(), status, 0);
            item.title = title;
            let item = store.insert_item(item).await?;
            println!("{}", item.id);
        }
        Commands::List { status } => {
            let items = store.list_items().await?;
            let pipeline = config.pipeline();
            for (column, column_items) in pipeline.board_view(&items) {
                if status.as_deref().is_some_and(|s| s != column.status.as_str()) {
                    continue;
                }
                println!("{} ({})", column.name, column_items.len());
                for item in column_items {
                    println!(
                        "  {:>3}  {}  {}",
                        item.effective_position(),
                        item.id,
                        item.title.as_deref().unwrap_or("")
                    );
                }
            }
        }
        Commands::Move { active, over } => {
            let items = store.list_items().await?;
            let outcome = handle_reorder(
                &items,
                &MoveEvent::new(active.as_str(), over),
                &config.pipeline(),
                &store,
                &config.reorder_options(),
            )
            .await
            .context("reorder failed; re-run `list` to see the stored order")?;

            if outcome.plan.is_noop() {
                println!("Nothing to move");
            } else {
                println!(
                    "Updated {} row(s) in {} write(s)",
                    outcome.plan.updates().len(),
                    outcome.chunks_written
                );
            }
        }
    }

    Ok(())
}
