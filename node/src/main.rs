use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use pulse_config::config::Config;
use pulse_core::NetworkType;
use pulse_core::checkpoint::json::write_checkpoints_json;
use pulse_node::{ChainContext, DohTxtResolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio::time::{Duration, interval};

const MIN_REFRESH_INTERVAL_SECS: u64 = 60;

#[derive(Parser)]
#[command(name = "pulse-node")]
#[command(about = "Pulse node checkpoint service", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.pulse/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// mainnet, testnet or stagenet
    #[arg(long)]
    network: Option<String>,

    /// Checkpoint override file
    #[arg(long)]
    checkpoints_file: Option<PathBuf>,

    /// Also load checkpoints from DNS TXT records
    #[arg(long)]
    enable_dns_checkpoints: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load checkpoints and keep them refreshed until ctrl-c (default)
    Run,
    /// Print the loaded checkpoints
    Show,
    /// Write the loaded checkpoints to a JSON override file
    Export { path: PathBuf },
    /// Check a block hash against the loaded checkpoints
    Check { height: u64, hash: String },
    /// View or change the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    View,
    Set { key: String, value: String },
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        log::error!("{:#}", e);
        eprintln!("pulse-node: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut cfg = Config::load_from(&config_path)
        .with_context(|| format!("failed to read configuration {:?}", config_path))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cfg.log_level))
        .init();

    if let Some(Commands::Config { subcommand }) = &cli.command {
        return run_config_command(subcommand, &mut cfg, &config_path);
    }

    let network: NetworkType = cli
        .network
        .as_deref()
        .unwrap_or(&cfg.network)
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let checkpoints_file = cli
        .checkpoints_file
        .clone()
        .unwrap_or_else(|| cfg.checkpoints_file_resolved());
    let use_dns = cli.enable_dns_checkpoints || cfg.enable_dns_checkpoints;

    log::info!("Pulse node starting on {}", network);

    let ctx = Arc::new(ChainContext::new(network, checkpoints_file, use_dns)?);
    let resolver = Arc::new(DohTxtResolver::new(cfg.doh_endpoint.clone()));

    // a failed startup load must stop the node
    load_checkpoints(ctx.clone(), resolver.clone())
        .await
        .context("startup checkpoint load failed")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => serve(ctx, resolver, cfg.dns_refresh_interval_secs).await,
        Commands::Show => {
            show_checkpoints(&ctx);
            Ok(())
        }
        Commands::Export { path } => {
            write_checkpoints_json(&ctx.checkpoints.snapshot(), &path)?;
            println!("Wrote {} checkpoints to {:?}", ctx.checkpoints.len(), path);
            Ok(())
        }
        Commands::Check { height, hash } => {
            let check = ctx.validate_block(height, &hash)?;
            if check.is_checkpoint {
                println!("Block {} at height {} matches checkpoint", hash, height);
            } else {
                println!("No checkpoint at height {}", height);
            }
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn run_config_command(
    subcommand: &ConfigCommands,
    cfg: &mut Config,
    config_path: &Path,
) -> Result<()> {
    match subcommand {
        ConfigCommands::View => println!("{}", cfg.view()),
        ConfigCommands::Set { key, value } => {
            cfg.set_value(key, value).map_err(|e| anyhow!(e))?;
            cfg.save_to(config_path)?;
            println!("{} = {} Set successfully.", key, value);
        }
        ConfigCommands::Init => {
            Config::default().save_to(config_path)?;
            println!("Default configuration file has been created: {:?}", config_path);
        }
    }
    Ok(())
}

async fn load_checkpoints(ctx: Arc<ChainContext>, resolver: Arc<DohTxtResolver>) -> Result<()> {
    tokio::task::spawn_blocking(move || ctx.load_new_checkpoints(&*resolver)).await?
}

/// Keep the registry alive until ctrl-c, refreshing DNS checkpoints if enabled.
async fn serve(
    ctx: Arc<ChainContext>,
    resolver: Arc<DohTxtResolver>,
    refresh_secs: u64,
) -> Result<()> {
    if ctx.use_dns_checkpoints {
        let ctx = ctx.clone();
        let period = Duration::from_secs(refresh_secs.max(MIN_REFRESH_INTERVAL_SECS));
        tokio::spawn(async move {
            let mut ticker = interval(period);
            // the first tick fires immediately; startup already loaded
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = load_checkpoints(ctx.clone(), resolver.clone()).await {
                    // keep serving the last good registry
                    log::warn!("Checkpoint refresh failed: {:#}", e);
                }
            }
        });
    }

    log::info!(
        "Checkpoint zone ends at height {:?}; waiting for ctrl-c",
        ctx.checkpoints.max_height()
    );
    signal::ctrl_c().await?;
    log::info!("Shutting down");
    Ok(())
}

fn show_checkpoints(ctx: &ChainContext) {
    let cp = ctx.checkpoints.read();
    println!("Network: {}", ctx.network);
    println!("Checkpoints: {} (max height {:?})", cp.len(), cp.max_height());
    if let Some(ts) = *ctx.last_checkpoint_update.lock() {
        println!("Last update: {}", ts);
    }
    for (height, hash) in cp.points() {
        match cp.difficulty_at(*height) {
            Some(difficulty) => println!("{:>10}  {}  {}", height, hash, difficulty),
            None => println!("{:>10}  {}", height, hash),
        }
    }
}
