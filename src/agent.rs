//! Agent execution controller
//!
//! Owns an agent's private state (budget, inventory, episodic memory) and
//! drives the perceive → decide → validate → execute → remember turn.
//! Private state changes only after the market confirms success.
//!
//! Failure containment, in order of distance from the agent:
//! - generator failure (network, quota) degrades to a synthetic wait — the
//!   agent completes its turn and the tick continues;
//! - unparseable decision text makes the turn a no-op;
//! - coercion and precondition failures reject the single command and
//!   leave all state untouched.
//! Nothing raised inside one agent's turn can abort another agent's turn.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::decision::{self, Command, Decision};
use crate::error::AgoraError;
use crate::generator::{AgentView, DecisionGenerator};
use crate::market::{Market, PostOutcome};
use crate::memory::MemoryStream;
use crate::roles::AgentRole;

/// How many memories to surface into the decision prompt
const PROMPT_MEMORY_LIMIT: usize = 2;

/// One autonomous market participant
pub struct TradingAgent {
    pub name: String,
    /// Free-text persona, used only as generator context
    pub role: String,
    /// May go negative — no credit check is enforced
    pub budget: Decimal,
    /// item -> non-negative count
    pub inventory: HashMap<String, i64>,
    pub memory: MemoryStream,
    generator: Arc<dyn DecisionGenerator>,
}

impl TradingAgent {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        budget: Decimal,
        generator: Arc<dyn DecisionGenerator>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            budget,
            inventory: HashMap::new(),
            memory: MemoryStream::default(),
            generator,
        }
    }

    pub fn from_role(role: &AgentRole, generator: Arc<dyn DecisionGenerator>) -> Self {
        let mut agent = Self::new(&role.name, &role.role, role.budget, generator);
        agent.inventory = role.inventory.clone();
        agent
    }

    pub fn with_inventory(mut self, inventory: HashMap<String, i64>) -> Self {
        self.inventory = inventory;
        self
    }

    /// Snapshot of everything this agent perceives at the start of a turn
    fn perceive(&self, market: &Market) -> AgentView {
        let mut inventory: Vec<(String, i64)> = self
            .inventory
            .iter()
            .map(|(item, count)| (item.clone(), *count))
            .collect();
        inventory.sort();

        AgentView {
            name: self.name.clone(),
            role: self.role.clone(),
            budget: self.budget,
            inventory,
            recent_memories: self.memory.retrieve_relevant(None, PROMPT_MEMORY_LIMIT),
            open_offers: market.open_offers(),
        }
    }

    /// One complete turn: perceive, decide, validate, execute, remember.
    ///
    /// Never returns an error and never panics on untrusted decision
    /// content — every failure mode is absorbed here.
    pub async fn step(&mut self, market: &mut Market) {
        let view = self.perceive(market);

        let decision = match self.generator.generate(&view).await {
            Ok(raw_text) => match decision::validate_text(&raw_text) {
                Ok(decision) => decision,
                Err(AgoraError::Parse(msg)) => {
                    warn!(agent = %self.name, "decision parse error: {}", msg);
                    return;
                }
                Err(err) => {
                    // Coercion or validation failure: reject the command,
                    // touch nothing
                    warn!(agent = %self.name, "decision rejected: {}", err);
                    return;
                }
            },
            Err(err) => {
                warn!(agent = %self.name, "generator failed, waiting this turn: {}", err);
                Decision::wait(format!("Decision service error: {err}"))
            }
        };

        info!(agent = %self.name, "thinking: {}", decision.reasoning);

        match decision.command {
            Command::Buy { offer_id, quantity } => self.handle_buy(market, offer_id, quantity),
            Command::Post {
                item,
                price,
                quantity,
            } => self.handle_post(market, &item, price, quantity),
            Command::Wait => self.handle_wait(),
        }
    }

    /// Buy the full offer behind `offer_id`. The requested `quantity` is
    /// informational only; the market always transfers the posted quantity.
    fn handle_buy(&mut self, market: &mut Market, offer_id: u64, _quantity: Option<i64>) {
        match market.execute_trade(&self.name, offer_id) {
            Ok(trade) => {
                let total_cost = trade.price * Decimal::from(trade.quantity);
                self.budget -= total_cost;
                *self.inventory.entry(trade.item.clone()).or_insert(0) += trade.quantity;

                self.memory.add_with_metadata(
                    format!(
                        "Bought {} {} from {} for ${:.2}. Budget is now ${:.2}.",
                        trade.quantity, trade.item, trade.seller, total_cost, self.budget
                    ),
                    7,
                    HashMap::from([
                        ("partner".to_string(), trade.seller.clone()),
                        ("type".to_string(), "trade_success".to_string()),
                    ]),
                );
                info!(
                    agent = %self.name,
                    "trade success: bought {} {} for ${:.2}",
                    trade.quantity, trade.item, total_cost
                );
            }
            Err(err) => {
                self.memory.add(
                    format!("Attempted to buy offer {} but failed: {}", offer_id, err),
                    4,
                );
                warn!(agent = %self.name, "trade failed: {}", err);
            }
        }
    }

    /// Post `quantity` units of `item` at `price` each. Inventory must
    /// cover the posting; on success the market listing and the local
    /// decrement commit together.
    fn handle_post(&mut self, market: &mut Market, item: &str, price: Decimal, quantity: i64) {
        let available = self.inventory.get(item).copied().unwrap_or(0);
        if available == 0 && !self.inventory.contains_key(item) {
            warn!(agent = %self.name, "cannot post {}: not in inventory", item);
            return;
        }
        if quantity > available {
            warn!(
                agent = %self.name,
                "cannot post {} {}: only have {}", quantity, item, available
            );
            return;
        }

        match market.post_offer(&self.name, item, price, Decimal::from(quantity)) {
            PostOutcome::Posted { offer_id } => {
                *self.inventory.entry(item.to_string()).or_insert(0) -= quantity;
                self.memory.add(
                    format!("Posted an offer to sell {} {} for ${:.2} each.", quantity, item, price),
                    3,
                );
                info!(
                    agent = %self.name,
                    "posted offer {}: {} {} @ ${:.2} each", offer_id, quantity, item, price
                );
            }
            // The validator guarantees quantity > 0, so the ledger has no
            // remaining reason to reject; log it if it ever happens.
            PostOutcome::Rejected { reason } => {
                warn!(agent = %self.name, "market rejected post: {}", reason);
            }
        }
    }

    fn handle_wait(&mut self) {
        self.memory.add("Decided to observe the market and wait.", 1);
        info!(agent = %self.name, "decided to wait");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{MockDecisionGenerator, ScriptedGenerator};
    use rust_decimal_macros::dec;

    fn scripted(decisions: &[&str]) -> Arc<dyn DecisionGenerator> {
        Arc::new(ScriptedGenerator::new(
            decisions.iter().map(|s| s.to_string()),
        ))
    }

    #[tokio::test]
    async fn test_buy_debits_budget_and_credits_inventory() {
        let mut market = Market::new();
        let offer_id = market
            .post_offer("Seller", "Wood", dec!(5.0), dec!(10))
            .offer_id()
            .unwrap();

        let decision = format!(
            r#"{{"reasoning": "cheap", "command": "buy", "params": {{"offer_id": {offer_id}}}}}"#
        );
        let mut buyer =
            TradingAgent::new("Buyer", "a builder", dec!(100.0), scripted(&[decision.as_str()]));
        buyer.step(&mut market).await;

        assert_eq!(buyer.budget, dec!(50.0));
        assert_eq!(buyer.inventory.get("Wood"), Some(&10));
        assert_eq!(market.trade_history().len(), 1);
        // Success is remembered with the seller as partner
        let recalled = buyer.memory.retrieve_relevant(Some("Seller"), 1);
        assert!(recalled[0].contains("Bought 10 Wood"));
    }

    #[tokio::test]
    async fn test_buy_may_drive_budget_negative() {
        // No credit check: a 150.0 trade against a 100.0 budget succeeds
        let mut market = Market::new();
        let offer_id = market
            .post_offer("S", "Wood", dec!(15.0), dec!(10))
            .offer_id()
            .unwrap();

        let decision = format!(
            r#"{{"reasoning": "need it", "command": "buy", "params": {{"offer_id": {offer_id}}}}}"#
        );
        let mut buyer =
            TradingAgent::new("Buyer", "urgent", dec!(100.0), scripted(&[decision.as_str()]));
        buyer.step(&mut market).await;

        assert_eq!(buyer.budget, dec!(-50.0));
        assert_eq!(buyer.inventory.get("Wood"), Some(&10));
    }

    #[tokio::test]
    async fn test_failed_buy_leaves_state_and_remembers_failure() {
        let mut market = Market::new();
        let decision =
            r#"{"reasoning": "stale id", "command": "buy", "params": {"offer_id": 999}}"#;
        let mut buyer = TradingAgent::new("Buyer", "hopeful", dec!(100.0), scripted(&[decision]));
        buyer.step(&mut market).await;

        assert_eq!(buyer.budget, dec!(100.0));
        assert!(buyer.inventory.is_empty());
        let recalled = buyer.memory.retrieve_relevant(None, 1);
        assert!(recalled[0].contains("failed"));
    }

    #[tokio::test]
    async fn test_post_decrements_inventory_at_post_time() {
        let mut market = Market::new();
        let decision = r#"{"reasoning": "sell", "command": "post",
            "params": {"item": "Wood", "price": 5.0, "qty": 10}}"#;
        let mut seller = TradingAgent::new("Seller", "lumberjack", dec!(30.0), scripted(&[decision]))
            .with_inventory(HashMap::from([("Wood".to_string(), 50)]));
        seller.step(&mut market).await;

        assert_eq!(seller.inventory.get("Wood"), Some(&40));
        assert_eq!(market.open_offer_count(), 1);
        assert_eq!(seller.budget, dec!(30.0));
    }

    #[tokio::test]
    async fn test_post_beyond_inventory_is_rejected_untouched() {
        let mut market = Market::new();
        let decision = r#"{"reasoning": "overreach", "command": "post",
            "params": {"item": "Wood", "price": 5.0, "qty": 15}}"#;
        let mut seller = TradingAgent::new("Seller", "optimist", dec!(30.0), scripted(&[decision]))
            .with_inventory(HashMap::from([("Wood".to_string(), 10)]));
        seller.step(&mut market).await;

        assert_eq!(seller.inventory.get("Wood"), Some(&10));
        assert_eq!(market.open_offer_count(), 0);
        assert!(seller.memory.is_empty());
    }

    #[tokio::test]
    async fn test_post_unknown_item_is_rejected() {
        let mut market = Market::new();
        let decision = r#"{"reasoning": "phantom goods", "command": "post",
            "params": {"item": "Stone", "price": 5.0, "qty": 1}}"#;
        let mut seller =
            TradingAgent::new("Seller", "confused", dec!(30.0), scripted(&[decision]));
        seller.step(&mut market).await;

        assert_eq!(market.open_offer_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_records_passive_observation() {
        let mut market = Market::new();
        let decision = r#"{"reasoning": "nothing good", "command": "wait", "params": {}}"#;
        let mut agent = TradingAgent::new("Watcher", "patient", dec!(10.0), scripted(&[decision]));
        agent.step(&mut market).await;

        assert_eq!(agent.memory.len(), 1);
        assert!(agent.memory.entries()[0].content.contains("observe"));
        assert_eq!(agent.memory.entries()[0].importance, 1);
    }

    #[tokio::test]
    async fn test_unparseable_decision_is_a_no_op_turn() {
        let mut market = Market::new();
        let mut agent = TradingAgent::new(
            "Rambler",
            "verbose",
            dec!(10.0),
            scripted(&["I simply cannot decide today"]),
        );
        agent.step(&mut market).await;

        assert!(agent.memory.is_empty());
        assert_eq!(agent.budget, dec!(10.0));
    }

    #[tokio::test]
    async fn test_coercion_failure_rejects_command_without_memory() {
        let mut market = Market::new();
        market.post_offer("S", "Wood", dec!(1), dec!(1));
        let decision =
            r#"{"reasoning": "typo", "command": "buy", "params": {"offer_id": "abc"}}"#;
        let mut agent = TradingAgent::new("Clumsy", "typist", dec!(10.0), scripted(&[decision]));
        agent.step(&mut market).await;

        assert!(agent.memory.is_empty());
        assert_eq!(market.open_offer_count(), 1);
    }

    #[tokio::test]
    async fn test_generator_failure_degrades_to_wait() {
        let mut generator = MockDecisionGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(AgoraError::Service("connection reset".to_string())));

        let mut market = Market::new();
        let mut agent =
            TradingAgent::new("Unlucky", "offline", dec!(10.0), Arc::new(generator));
        agent.step(&mut market).await;

        // The turn completes as a wait rather than aborting the tick
        assert_eq!(agent.memory.len(), 1);
        assert_eq!(agent.memory.entries()[0].importance, 1);
        assert_eq!(agent.budget, dec!(10.0));
    }
}
