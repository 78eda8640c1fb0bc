//! TIPSTER — Autonomous virtual-football betting agent
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores state from disk (or creates fresh), and runs the main
//! scan→evaluate→act loop with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use tipster::config::AppConfig;
use tipster::engine::{Orchestrator, Scheduler};
use tipster::notify::{LogNotifier, Notifier, TelegramNotifier};
use tipster::server::spawn_server;
use tipster::site::paper::paper_site;
use tipster::storage::StateStore;
use tipster::strategy::Gatekeeper;

const BANNER: &str = r#"
 _____ ___ ____  ____ _____ _____ ____
|_   _|_ _|  _ \/ ___|_   _| ____|  _ \
  | |  | || |_) \___ \ | | |  _| | |_) |
  | |  | ||  __/ ___) || | | |___|  _ <
  |_| |___|_|   |____/ |_| |_____|_| \_\

  Virtual Football Betting Agent
  v0.1.0 — Autonomous Agent
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML, then env overrides
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging(&cfg);

    // Print startup banner
    println!("{BANNER}");
    info!(
        scan_interval_min = cfg.agent.scan_interval_min,
        dry_run = cfg.agent.dry_run,
        max_bets_per_day = cfg.risk.max_bets_per_day,
        max_daily_loss = %cfg.risk.max_daily_loss,
        "TIPSTER starting up"
    );

    // -- Wire collaborators ----------------------------------------------

    let store = StateStore::new(cfg.storage.state_path.clone());

    let credentials = cfg.site_credentials();
    if credentials.is_none() {
        warn!("Site credentials not set — every cycle will fail at login");
    }
    let (observer, executor) = paper_site(
        cfg.site.paper_seed,
        cfg.site.opening_balance,
        credentials,
        cfg.agent.dry_run,
    );

    let notifier: Box<dyn Notifier> = match cfg.telegram() {
        Some(settings) => {
            info!("Telegram notifications enabled");
            Box::new(TelegramNotifier::new(settings)?)
        }
        None => {
            info!("No Telegram token configured — notifications go to the log");
            Box::new(LogNotifier)
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(
        Box::new(observer),
        Box::new(executor),
        notifier,
        Gatekeeper::new(cfg.risk.clone()),
        store,
    ));

    // -- Status server ----------------------------------------------------

    spawn_server(orchestrator.shared_state(), cfg.server.port)?;

    // -- Main loop ---------------------------------------------------------

    info!(
        interval_min = cfg.agent.scan_interval_min,
        "Entering main loop. Press Ctrl+C to stop."
    );

    let scheduler = Scheduler::new(cfg.scan_interval());
    scheduler
        .run(Arc::clone(&orchestrator), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    info!(
        cycles = orchestrator.cycles_run(),
        "TIPSTER shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging(cfg: &AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if cfg.agent.debug {
        "tipster=debug"
    } else {
        "tipster=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json_logging = std::env::var("TIPSTER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
