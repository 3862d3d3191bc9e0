pub mod agent;
pub mod config;
pub mod decision;
pub mod error;
pub mod generator;
pub mod market;
pub mod memory;
pub mod persistence;
pub mod roles;
pub mod simulation;

pub use agent::TradingAgent;
pub use config::AppConfig;
pub use decision::{Command, Decision, RawDecision};
pub use error::{AgoraError, MarketError, Result};
pub use generator::{AgentView, DecisionGenerator, GroqClient, GroqConfig, ScriptedGenerator};
pub use market::{Market, Offer, PostOutcome, TradeRecord};
pub use memory::{MemoryEntry, MemoryStream};
pub use persistence::{FileLedgerSink, LedgerSink, NullSink};
pub use roles::{builtin_roster, AgentRole};
pub use simulation::MarketSimulation;
