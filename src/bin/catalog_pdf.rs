//! catalog-pdf: export product catalogs to PDF, and manage a local catalog store.

use anyhow::{bail, Context};
use catalog_pdf::sink::{CommandShare, NoShare, ShareTarget};
use catalog_pdf::store::{CatalogStore, JsonFileStore};
use catalog_pdf::{Catalog, ExportConfig, Exporter};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "catalog-pdf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a catalog JSON file to PDF
    Export {
        /// Catalog JSON file
        catalog: PathBuf,

        /// TOML export configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory to write the PDF into (overrides the configured cache dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Program to open or share the PDF with once written, e.g. xdg-open
        #[arg(long)]
        share_with: Option<PathBuf>,
    },

    /// Check a catalog JSON file without exporting it
    Validate {
        /// Catalog JSON file
        catalog: PathBuf,
    },

    /// Manage the local catalog store
    Store {
        /// Store file
        #[arg(long, default_value = "catalogs.json")]
        db: PathBuf,

        #[command(subcommand)]
        command: StoreCommands,
    },
}

#[derive(Subcommand)]
enum StoreCommands {
    /// List stored catalogs, most recently updated first
    List,

    /// Insert or replace a catalog from a JSON file
    Save {
        catalog: PathBuf,

        /// Refresh the catalog's update time before saving
        #[arg(long)]
        touch: bool,
    },

    /// Remove a catalog by id
    Delete { id: String },

    /// Export a stored catalog by id
    Export {
        id: String,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Export {
            catalog,
            config,
            out_dir,
            share_with,
        } => {
            let catalog = read_catalog(&catalog)?;
            let share: Box<dyn ShareTarget> = match share_with {
                Some(program) => Box::new(CommandShare::new(program)),
                None => Box::new(NoShare),
            };
            export(&catalog, config.as_deref(), out_dir, share.as_ref()).await?;
        }
        Commands::Validate { catalog } => {
            let parsed = read_catalog(&catalog)?;
            parsed
                .validate()
                .with_context(|| format!("{} is not a valid catalog", catalog.display()))?;
            println!(
                "{}: ok ({} products)",
                catalog.display(),
                parsed.products.len()
            );
        }
        Commands::Store { db, command } => {
            let store = JsonFileStore::new(db);
            run_store(&store, command).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn read_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ExportConfig> {
    Ok(match path {
        Some(path) => ExportConfig::load(path)?,
        None => {
            let mut config = ExportConfig::default();
            config.apply_env_overrides();
            config
        }
    })
}

async fn export(
    catalog: &Catalog,
    config: Option<&Path>,
    out_dir: Option<PathBuf>,
    share: &dyn ShareTarget,
) -> anyhow::Result<()> {
    let mut config = load_config(config)?;
    if let Some(dir) = out_dir {
        config.cache_dir = dir;
    }

    let exporter = Exporter::new(config);
    let path = exporter
        .export_to_cache(catalog, share)
        .await
        .with_context(|| format!("failed to export catalog {}", catalog.name))?;
    info!(path = %path.display(), "export finished");
    println!("{}", path.display());
    Ok(())
}

async fn run_store(store: &JsonFileStore, command: StoreCommands) -> anyhow::Result<()> {
    match command {
        StoreCommands::List => {
            for catalog in store.load().await? {
                let summary = catalog.summary();
                println!(
                    "{}\t{}\t{} products\t{}",
                    summary.id, summary.name, summary.products_count, catalog.updated_at
                );
            }
        }
        StoreCommands::Save { catalog, touch } => {
            let mut parsed = read_catalog(&catalog)?;
            if touch {
                parsed.touch();
            }
            store
                .save(&parsed)
                .await
                .with_context(|| format!("failed to save {}", catalog.display()))?;
            println!("saved {}", parsed.id);
        }
        StoreCommands::Delete { id } => {
            store.delete(&id).await?;
            println!("deleted {id}");
        }
        StoreCommands::Export {
            id,
            config,
            out_dir,
        } => {
            let catalogs = store.load().await?;
            let Some(catalog) = catalogs.into_iter().find(|c| c.id == id) else {
                bail!("no catalog with id {id} in {}", store.path().display());
            };
            export(&catalog, config.as_deref(), out_dir, &NoShare).await?;
        }
    }
    Ok(())
}
