//! Tick orchestration — one pass in which every agent takes exactly one turn
//!
//! Turn order is shuffled each tick for fairness, then turns run strictly
//! sequentially: one agent's whole perceive → decide → validate → execute →
//! remember cycle completes before the next begins. After every tick the
//! new slice of trade history and a fresh board snapshot go to the ledger
//! sink; sink failures are logged and never stop the simulation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Duration;
use tracing::{info, warn};

use crate::agent::TradingAgent;
use crate::market::Market;
use crate::persistence::LedgerSink;

pub struct MarketSimulation {
    market: Market,
    agents: Vec<TradingAgent>,
    sink: Box<dyn LedgerSink>,
    rng: StdRng,
    /// Pause between turns, to respect completion-service rate limits
    turn_delay: Duration,
    /// How much of the trade history has already been flushed to the sink
    persisted_trades: usize,
}

impl MarketSimulation {
    pub fn new(
        agents: Vec<TradingAgent>,
        sink: Box<dyn LedgerSink>,
        seed: Option<u64>,
        turn_delay: Duration,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            market: Market::new(),
            agents,
            sink,
            rng,
            turn_delay,
            persisted_trades: 0,
        }
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn agents(&self) -> &[TradingAgent] {
        &self.agents
    }

    /// Run one full tick: every agent takes exactly one turn, in shuffled
    /// order, then the ledger sink is flushed.
    pub async fn run_tick(&mut self, tick_number: u32) {
        info!(tick = tick_number, "market tick starting");

        self.agents.shuffle(&mut self.rng);

        for agent in &mut self.agents {
            agent.step(&mut self.market).await;
            if !self.turn_delay.is_zero() {
                tokio::time::sleep(self.turn_delay).await;
            }
        }

        self.flush();
        info!(
            tick = tick_number,
            trades = self.market.trade_history().len(),
            open_offers = self.market.open_offer_count(),
            "market tick complete"
        );
    }

    /// Run the full simulation
    pub async fn run(&mut self, total_ticks: u32) {
        for tick in 1..=total_ticks {
            self.run_tick(tick).await;
        }
        info!(
            total_trades = self.market.trade_history().len(),
            "simulation complete"
        );
    }

    /// Best-effort persistence of anything new since the last flush
    fn flush(&mut self) {
        let history = self.market.trade_history();
        for trade in &history[self.persisted_trades..] {
            if let Err(err) = self.sink.record_trade(trade) {
                warn!("failed to persist trade: {}", err);
            }
        }
        self.persisted_trades = history.len();

        if let Err(err) = self.sink.snapshot_offers(&self.market.open_offers()) {
            warn!("failed to persist offers snapshot: {}", err);
        }
    }
}
