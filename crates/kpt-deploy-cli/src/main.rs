//! kpt-deploy - Kptfile-aware kpt live deployer
//!
//! Usage:
//!   kpt-deploy deploy --image web=registry/web:v1   # Reconcile Kptfile, then kpt live apply
//!   kpt-deploy cleanup                              # Reconcile Kptfile, then kpt live destroy
//!   kpt-deploy reconcile                            # Only bring the Kptfile in line
//!   kpt-deploy status                               # Show the Kptfile inventory

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kpt_deploy_core::cancel::CancelToken;
use kpt_deploy_core::config::{ConfigStore, DeployerConfig, RunOptions};
use kpt_deploy_core::deploy::{Artifact, Deployer};
use kpt_deploy_core::events::MemoryEventSink;
use kpt_deploy_core::inventory::{InventoryAction, ReconcileReport};
use kpt_deploy_core::kptfile::{InventoryState, KptfileStore};

#[derive(Parser)]
#[command(name = "kpt-deploy")]
#[command(about = "Deploy kpt packages with a reconciled Kptfile inventory", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to kpt-deploy.toml (default: ./kpt-deploy.toml, then user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Package directory (overrides deploy.dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Kubernetes namespace for this run; wins over --inventory-namespace
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Namespace for the inventory object
    #[arg(long, global = true)]
    inventory_namespace: Option<String>,

    /// Inventory ID
    #[arg(long, global = true)]
    inventory_id: Option<String>,

    /// Inventory name
    #[arg(long, global = true)]
    inventory_name: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the Kptfile and run kpt live apply
    Deploy {
        /// Built image to track (NAME=TAG)
        #[arg(long = "image", value_name = "NAME=TAG")]
        images: Vec<String>,
    },

    /// Reconcile the Kptfile and run kpt live destroy
    #[command(alias = "destroy")]
    Cleanup,

    /// Only reconcile the Kptfile inventory
    Reconcile,

    /// Show the Kptfile inventory
    Status,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable output
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kpt_deploy=info,kpt_deploy_core=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let format = cli.global.format;
    let (config, options) = load_config(&cli.global)?;

    match cli.command {
        Commands::Deploy { images } => run_deploy(config, &options, &images, format),
        Commands::Cleanup => run_cleanup(config, &options),
        Commands::Reconcile => run_reconcile(config, &options, format),
        Commands::Status => run_status(config, &options, format),
    }
}

fn load_config(global: &GlobalArgs) -> Result<(DeployerConfig, RunOptions)> {
    let store = match &global.config {
        Some(path) => ConfigStore::from_path(path.clone()),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            ConfigStore::discover(&cwd)
        }
    };
    tracing::debug!(path = %store.config_path().display(), "Loading config");
    let config = store.load()?;

    let options = RunOptions {
        dir: global.dir.clone(),
        namespace: global.namespace.clone(),
        inventory_namespace: global.inventory_namespace.clone(),
        inventory_id: global.inventory_id.clone(),
        inventory_name: global.inventory_name.clone(),
    };
    Ok((config, options))
}

fn run_deploy(
    config: DeployerConfig,
    options: &RunOptions,
    images: &[String],
    format: OutputFormat,
) -> Result<()> {
    let builds = images
        .iter()
        .map(|spec| parse_image(spec))
        .collect::<Result<Vec<_>>>()?;

    let events = MemoryEventSink::new();
    let mut deployer =
        Deployer::from_config(config, options).with_event_sink(Box::new(events.clone()));
    let mut out = io::stderr();
    let namespaces = deployer.deploy(&mut out, &CancelToken::new(), &builds)?;

    match format {
        OutputFormat::Table => {
            println!(
                "{} Deployed {}",
                style("✓").green(),
                deployer.apply_dir().display()
            );
            if namespaces.is_empty() {
                println!("  namespaces: (none found)");
            } else {
                println!("  namespaces: {}", namespaces.join(", "));
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "dir": deployer.apply_dir(),
            "namespaces": namespaces,
            "images": deployer.pod_selector().iter().collect::<Vec<_>>(),
            "events": events.events(),
        }))?,
    }
    Ok(())
}

fn run_cleanup(config: DeployerConfig, options: &RunOptions) -> Result<()> {
    let deployer = Deployer::from_config(config, options);
    let mut out = io::stderr();
    deployer.cleanup(&mut out, &CancelToken::new())?;
    println!(
        "{} Destroyed resources from {}",
        style("✓").green(),
        deployer.apply_dir().display()
    );
    Ok(())
}

fn run_reconcile(config: DeployerConfig, options: &RunOptions, format: OutputFormat) -> Result<()> {
    let events = MemoryEventSink::new();
    let deployer =
        Deployer::from_config(config, options).with_event_sink(Box::new(events.clone()));
    let mut out = io::stderr();
    let report = deployer.reconcile(&mut out, &CancelToken::new())?;

    match format {
        OutputFormat::Table => print_report(&report),
        OutputFormat::Json => print_json(&serde_json::json!({
            "report": report,
            "events": events.events(),
        }))?,
    }
    Ok(())
}

fn run_status(config: DeployerConfig, options: &RunOptions, format: OutputFormat) -> Result<()> {
    let mut deploy = config.deploy;
    options.apply_to(&mut deploy);
    let store = KptfileStore::for_dir(&deploy.dir);

    if !store.exists() {
        match format {
            OutputFormat::Table => println!("{}: no Kptfile", store.path().display()),
            OutputFormat::Json => print_json(&serde_json::json!({
                "path": store.path(),
                "exists": false,
            }))?,
        }
        return Ok(());
    }

    let kptfile = store.read()?;
    match (format, kptfile.inventory_state()) {
        (OutputFormat::Table, InventoryState::Uninitialized) => {
            println!(
                "{}: {}",
                store.path().display(),
                style("inventory uninitialized").yellow()
            );
        }
        (OutputFormat::Table, InventoryState::Initialized(inventory)) => {
            println!("{}", store.path().display());
            println!("  name:        {}", inventory.name);
            println!("  inventoryID: {}", inventory.inventory_id);
            println!("  namespace:   {}", inventory.namespace);
        }
        (OutputFormat::Json, state) => {
            let inventory = match state {
                InventoryState::Initialized(inventory) => serde_json::json!({
                    "name": inventory.name,
                    "inventory_id": inventory.inventory_id,
                    "namespace": inventory.namespace,
                }),
                InventoryState::Uninitialized => serde_json::Value::Null,
            };
            print_json(&serde_json::json!({
                "path": store.path(),
                "exists": true,
                "inventory": inventory,
            }))?;
        }
    }
    Ok(())
}

fn print_report(report: &ReconcileReport) {
    if report.package_created {
        println!("{} Created Kptfile", style("+").green());
    }
    match &report.action {
        InventoryAction::LiveInit => {
            println!("{} Initialized inventory", style("+").green());
        }
        InventoryAction::Merged { changes } => {
            for change in changes {
                println!(
                    "{} {}: {} -> {}",
                    style("~").yellow(),
                    change.field,
                    change.old,
                    change.new
                );
            }
        }
        InventoryAction::Unchanged => println!("Kptfile inventory up to date"),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).context("Failed to write JSON")?;
    writeln!(handle)?;
    Ok(())
}

fn parse_image(spec: &str) -> Result<Artifact> {
    let (name, tag) = spec
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid image '{}': expected NAME=TAG", spec))?;
    if name.is_empty() || tag.is_empty() {
        anyhow::bail!("Invalid image '{}': expected NAME=TAG", spec);
    }
    Ok(Artifact::new(name, tag))
}
