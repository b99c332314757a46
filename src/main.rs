use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bilregistret_cache::section::entry::now_millis;
use bilregistret_cache::{FileStore, KeyValueStore, SectionEntry, SectionStateManager, Settings};

#[derive(Parser)]
#[command(name = "bilreg-cache")]
#[command(about = "Inspect and edit persisted section state", long_about = None)]
struct Cli {
    /// Store file (overrides BILREG_STORE_PATH)
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cached entry for a section
    Show {
        /// Section key
        key: String,
    },

    /// Toggle a section open/closed
    Toggle {
        /// Section key
        key: String,

        /// Default open state when nothing valid is cached
        #[arg(long)]
        default_open: bool,
    },

    /// Forget a section's cached state
    Reset {
        /// Section key
        key: String,
    },

    /// List all cached sections
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "bilregistret_cache=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env().context("Invalid environment settings")?;
    if let Some(path) = cli.store {
        settings.store_path = path;
    }

    let store = Arc::new(
        FileStore::open(&settings.store_path)
            .await
            .with_context(|| format!("Failed to open store at {:?}", settings.store_path))?,
    );

    match cli.command {
        Commands::Show { key } => {
            print_entry(&settings, &key, store.get(&key).await?);
        }
        Commands::Toggle { key, default_open } => {
            let mut options = settings.section_options(key.as_str());
            options.default_state = default_open;

            let section = SectionStateManager::mount(store.clone(), options).await;
            section.wait_loaded().await;
            let is_open = section.toggle_state().await;
            println!("{}: {}", key, if is_open { "open" } else { "closed" });
        }
        Commands::Reset { key } => {
            let section = SectionStateManager::mount(store.clone(), settings.section_options(key.as_str())).await;
            section.wait_loaded().await;
            section.reset_state().await;
            println!("{}: reset", key);
        }
        Commands::List => {
            let keys = store.keys().await;
            if keys.is_empty() {
                println!("No cached sections in {:?}", store.path());
            }
            for key in keys {
                print_entry(&settings, &key, store.get(&key).await?);
            }
        }
    }

    Ok(())
}

fn print_entry(settings: &Settings, key: &str, raw: Option<String>) {
    let Some(raw) = raw else {
        println!("{}: not cached", key);
        return;
    };

    match SectionEntry::decode(&raw) {
        Ok(entry) => {
            let status = match entry.validate(
                settings.data_version.as_deref(),
                settings.section_ttl,
                now_millis(),
            ) {
                Ok(()) => "valid".to_string(),
                Err(reason) => reason.to_string(),
            };
            println!(
                "{}: {} (version {}, written {}, age {}s) [{}]",
                key,
                if entry.state { "open" } else { "closed" },
                entry.version,
                entry.timestamp,
                entry.age(now_millis()).as_secs(),
                status
            );
        }
        Err(e) => println!("{}: unreadable entry ({})", key, e),
    }
}
