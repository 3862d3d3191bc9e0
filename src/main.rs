use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use agora::config::AppConfig;
use agora::generator::{DecisionGenerator, GroqClient, GroqConfig, ScriptedGenerator};
use agora::persistence::{FileLedgerSink, LedgerSink, NullSink};
use agora::roles::builtin_roster;
use agora::simulation::MarketSimulation;
use agora::TradingAgent;

/// LLM-driven single-commodity bulletin-board market simulation
#[derive(Debug, Parser)]
#[command(name = "agora", version, about)]
struct Cli {
    /// Number of market ticks to run (overrides config)
    #[arg(long)]
    ticks: Option<u32>,

    /// Directory holding default.toml / <env>.toml
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Run without the completion service: every agent waits out its turns
    #[arg(long)]
    offline: bool,

    /// Seed for the tick-order shuffle (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Cap on how many roster agents participate (overrides config)
    #[arg(long)]
    agents: Option<usize>,
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},agora=debug", config.logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config_dir)?;
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("config error: {error}");
        }
        anyhow::bail!("invalid configuration ({} errors)", errors.len());
    }

    init_logging(&config);

    let generator: Arc<dyn DecisionGenerator> = if cli.offline {
        info!("offline mode: agents will wait out every turn");
        Arc::new(ScriptedGenerator::default())
    } else {
        let groq = GroqClient::new(GroqConfig {
            api_key: config.generator.api_key.clone(),
            base_url: config.generator.base_url.clone(),
            model: config.generator.model.clone(),
            timeout_secs: config.generator.timeout_secs,
        })?;
        if !groq.is_configured() {
            warn!("no API key configured; every generator call will fail safe to wait");
        }
        Arc::new(groq)
    };

    let mut roster = builtin_roster();
    if let Some(limit) = cli.agents.or(config.simulation.agent_limit) {
        roster.truncate(limit);
    }
    info!("initializing {} agents", roster.len());

    let agents: Vec<TradingAgent> = roster
        .iter()
        .map(|role| TradingAgent::from_role(role, Arc::clone(&generator)))
        .collect();

    let sink: Box<dyn LedgerSink> = if config.persistence.enabled {
        Box::new(FileLedgerSink::new(&config.persistence.log_dir)?)
    } else {
        Box::new(NullSink)
    };

    let turn_delay = if cli.offline {
        Duration::ZERO
    } else {
        Duration::from_millis(config.simulation.turn_delay_ms)
    };

    let mut simulation = MarketSimulation::new(
        agents,
        sink,
        cli.seed.or(config.simulation.seed),
        turn_delay,
    );

    let ticks = cli.ticks.unwrap_or(config.simulation.ticks);
    simulation.run(ticks).await;

    info!(
        "done — trade ledger holds {} trades",
        simulation.market().trade_history().len()
    );
    Ok(())
}
