use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use creative_ops::model::BulkAction;
use creative_ops::{config, db, roster, tags};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a roster import: resolve creators and link delivered creatives.
    Import {
        /// Newline-delimited roster export (tab- or comma-delimited columns)
        #[arg(long)]
        file: PathBuf,
    },
    /// Add or remove tags across every creative in a bunch.
    BulkTag {
        /// Bunch group name (creatives tagged `L1:<group>`)
        #[arg(long)]
        group: String,
        /// `add` or `remove`
        #[arg(long)]
        action: String,
        /// Tag names to apply
        #[arg(required = true)]
        tags: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    match args.command {
        Command::Import { file } => {
            let text = tokio::fs::read_to_string(&file).await?;
            let report = roster::run_import(&pool, &text, cfg.app.bulk_concurrency).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::BulkTag {
            group,
            action,
            tags: tag_names,
        } => {
            let Some(action) = BulkAction::parse(&action) else {
                bail!("unknown action {action:?}, expected add or remove");
            };
            let affected =
                tags::bulk_tag(&pool, &group, &tag_names, action, cfg.app.bulk_concurrency)
                    .await?;
            info!(group = %group, affected, "bulk tag done");
            println!("{affected}");
        }
    }

    Ok(())
}
