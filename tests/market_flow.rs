//! End-to-end simulation flow: scripted decisions through the full
//! perceive/decide/validate/execute/remember pipeline, with the file
//! ledger sink producing the artifacts analytics consume.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use agora::generator::ScriptedGenerator;
use agora::persistence::{FileLedgerSink, NullSink};
use agora::simulation::MarketSimulation;
use agora::{Offer, TradingAgent};

fn scripted_agent(name: &str, budget: rust_decimal::Decimal, decisions: &[&str]) -> TradingAgent {
    TradingAgent::new(
        name,
        "integration test persona",
        budget,
        Arc::new(ScriptedGenerator::new(
            decisions.iter().map(|s| s.to_string()),
        )),
    )
}

fn temp_log_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("agora-flow-{}-{}", tag, std::process::id()))
}

#[tokio::test]
async fn overspending_buyer_goes_negative_without_credit_check() {
    // Budget 100.0 against an offer of 10 Wood at 15.0 each: the trade
    // succeeds and the buyer lands at -50.0.
    let seller = scripted_agent(
        "S",
        dec!(0.0),
        &[r#"{"reasoning": "sell all", "command": "post",
            "params": {"item": "Wood", "price": 15.0, "qty": 10}}"#],
    )
    .with_inventory(HashMap::from([("Wood".to_string(), 10)]));

    let buyer = scripted_agent(
        "B",
        dec!(100.0),
        &[
            r#"{"reasoning": "wait for stock", "command": "wait", "params": {}}"#,
            r#"{"reasoning": "buy whatever it costs", "command": "buy",
                "params": {"offer_id": 1}}"#,
        ],
    );

    let mut sim = MarketSimulation::new(
        vec![seller, buyer],
        Box::new(NullSink),
        Some(42),
        Duration::ZERO,
    );
    sim.run(2).await;

    let buyer = sim.agents().iter().find(|a| a.name == "B").unwrap();
    assert_eq!(buyer.budget, dec!(-50.0));
    assert_eq!(buyer.inventory.get("Wood"), Some(&10));

    // The seller's inventory was already decremented at post time
    let seller = sim.agents().iter().find(|a| a.name == "S").unwrap();
    assert_eq!(seller.inventory.get("Wood"), Some(&0));

    let history = sim.market().trade_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].quantity, 10);
    assert_eq!(history[0].price, dec!(15.0));
}

#[tokio::test]
async fn ledger_sink_receives_trades_and_board_snapshot() {
    let dir = temp_log_dir("sink");
    let _ = fs::remove_dir_all(&dir);
    let sink = FileLedgerSink::new(&dir).unwrap();

    let seller = scripted_agent(
        "Old_Tom",
        dec!(30.0),
        &[
            r#"{"reasoning": "first lot", "command": "post",
                "params": {"item": "Wood", "price": 5.0, "qty": 10}}"#,
            r#"{"reasoning": "second lot", "command": "post",
                "params": {"item": "Wood", "price": 6.0, "qty": 5}}"#,
        ],
    )
    .with_inventory(HashMap::from([("Wood".to_string(), 50)]));

    let buyer = scripted_agent(
        "Mark",
        dec!(500.0),
        &[
            r#"{"reasoning": "nothing yet", "command": "wait", "params": {}}"#,
            r#"{"reasoning": "take the cheap one", "command": "buy",
                "params": {"offer_id": 1, "quantity": 10}}"#,
        ],
    );

    let mut sim = MarketSimulation::new(
        vec![seller, buyer],
        Box::new(sink),
        Some(3),
        Duration::ZERO,
    );
    sim.run(2).await;

    // CSV: header plus exactly one trade row
    let ledger = fs::read_to_string(dir.join("transaction_ledger.csv")).unwrap();
    let lines: Vec<_> = ledger.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "timestamp,seller,buyer,item,price,quantity");
    assert!(lines[1].contains("Old_Tom,Mark,Wood,5.0,10"));

    // JSON snapshot: the second posting is still on the board
    let snapshot = fs::read_to_string(dir.join("active_offers.json")).unwrap();
    let offers: Vec<Offer> = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].offer_id, 2);
    assert_eq!(offers[0].quantity, 5);

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn malformed_and_failing_turns_never_stop_the_tick() {
    // Three agents: one emits garbage, one targets a stale offer, one
    // trades normally. The tick completes and the good trade lands.
    let rambler = scripted_agent("Rambler", dec!(10.0), &["no json here, sorry"]);
    let stale = scripted_agent(
        "Stale",
        dec!(10.0),
        &[r#"{"reasoning": "old tip", "command": "buy", "params": {"offer_id": 777}}"#],
    );
    let seller = scripted_agent(
        "Seller",
        dec!(0.0),
        &[r#"{"reasoning": "sell", "command": "post",
            "params": {"item": "Wood", "price": "2.0", "qty": "3.6"}}"#],
    )
    .with_inventory(HashMap::from([("Wood".to_string(), 10)]));

    let mut sim = MarketSimulation::new(
        vec![rambler, stale, seller],
        Box::new(NullSink),
        Some(9),
        Duration::ZERO,
    );
    sim.run(1).await;

    // "3.6" rounds half-away-from-zero to 4 posted units
    assert_eq!(sim.market().open_offer_count(), 1);
    assert_eq!(sim.market().open_offers()[0].quantity, 4);

    let seller = sim.agents().iter().find(|a| a.name == "Seller").unwrap();
    assert_eq!(seller.inventory.get("Wood"), Some(&6));

    // The stale buyer remembered the failure; the rambler's turn was a no-op
    let stale = sim.agents().iter().find(|a| a.name == "Stale").unwrap();
    assert_eq!(stale.memory.len(), 1);
    let rambler = sim.agents().iter().find(|a| a.name == "Rambler").unwrap();
    assert!(rambler.memory.is_empty());
}
