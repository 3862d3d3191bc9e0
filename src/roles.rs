//! Built-in agent personas for the wood market scenario
//!
//! Role text is pure generator context — it never enters the core logic.
//! The roster is balanced across producers (wood-rich, cash-poor),
//! consumers (cash-rich, wood-poor) and speculators in between.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Starting state for one simulated participant
#[derive(Debug, Clone)]
pub struct AgentRole {
    pub name: String,
    pub role: String,
    pub budget: Decimal,
    pub inventory: HashMap<String, i64>,
}

impl AgentRole {
    fn new(name: &str, role: &str, budget: Decimal, wood: i64) -> Self {
        let mut inventory = HashMap::new();
        if wood > 0 {
            inventory.insert("Wood".to_string(), wood);
        }
        Self {
            name: name.to_string(),
            role: role.to_string(),
            budget,
            inventory,
        }
    }
}

/// The default 20-persona roster
pub fn builtin_roster() -> Vec<AgentRole> {
    vec![
        // Producers: lots of wood, little money
        AgentRole::new(
            "Old_Tom",
            "A veteran lumberjack. He needs cash to repair his tools. He sells wood consistently at fair prices.",
            dec!(30.0),
            50,
        ),
        AgentRole::new(
            "Young_Silas",
            "An energetic woodcutter. He is impatient and will lower prices quickly if no one buys.",
            dec!(20.0),
            40,
        ),
        AgentRole::new(
            "Industrial_Sawmill",
            "A large-scale producer. Only sells in bulk (high quantity) and doesn't like small trades.",
            dec!(100.0),
            200,
        ),
        AgentRole::new(
            "Forest_Ranger_Ben",
            "Sells wood slowly to maintain a stable market. He hates scalpers.",
            dec!(50.0),
            60,
        ),
        // Consumers: lots of money, no wood
        AgentRole::new(
            "City_Builder_Mark",
            "In charge of a big project. He has a massive budget and needs wood urgently at any cost.",
            dec!(500.0),
            0,
        ),
        AgentRole::new(
            "Furniture_Maker_Ann",
            "Needs wood for her craft. She is picky about price and looks for bargains.",
            dec!(120.0),
            0,
        ),
        AgentRole::new(
            "Poor_Carpenter_Dan",
            "Needs wood to work, but has very little money. He will try to negotiate very low prices.",
            dec!(40.0),
            0,
        ),
        AgentRole::new(
            "Wealthy_Landowner",
            "Hoards wood for his estate. He buys high and doesn't care about the 'fair' price.",
            dec!(800.0),
            0,
        ),
        // Speculators and middlemen
        AgentRole::new(
            "Scalper_Sam",
            "A greedy middleman. He tries to buy everything cheap and relist it immediately for 2x the price.",
            dec!(250.0),
            0,
        ),
        AgentRole::new(
            "Strategic_Steve",
            "A smart trader. He monitors prices and only buys when he thinks a 'supply shock' is coming.",
            dec!(300.0),
            0,
        ),
        AgentRole::new(
            "Panic_Paul",
            "He scares easily. If he sees prices dropping, he dumps all his inventory at a loss.",
            dec!(100.0),
            10,
        ),
        // Wildcards
        AgentRole::new(
            "Rational_Rita",
            "A data-driven trader. She calculates the average market price and only trades within 5% of it.",
            dec!(150.0),
            5,
        ),
        AgentRole::new(
            "Generous_Gina",
            "Wants the village to thrive. She sells wood at a loss to anyone with a budget under $50.",
            dec!(200.0),
            30,
        ),
        AgentRole::new(
            "The_Hermit",
            "Rarely speaks. Occasionally posts massive amounts of wood for $1 just to cause chaos.",
            dec!(10.0),
            100,
        ),
        AgentRole::new(
            "Greedy_Gus",
            "Never buys. Only posts offers at 5x the market price, hoping someone misclicks.",
            dec!(50.0),
            20,
        ),
        AgentRole::new(
            "Savvy_Sarah",
            "A professional negotiator. She always waits for multiple offers before making a move.",
            dec!(180.0),
            0,
        ),
        AgentRole::new(
            "Newbie_Ned",
            "Has no idea what wood is worth. He makes random decisions and learns slowly.",
            dec!(100.0),
            10,
        ),
        AgentRole::new(
            "Market_Bot_X",
            "A cold, logical entity focused purely on maximizing its total asset value (Money + Wood).",
            dec!(400.0),
            20,
        ),
        AgentRole::new(
            "Old_Widow_May",
            "Selling her late husband's wood collection. She prioritizes selling to people who are 'polite' (based on memory).",
            dec!(60.0),
            80,
        ),
        AgentRole::new(
            "Village_Mayor",
            "Buys wood to build a community center. He prefers buying from many different sellers.",
            dec!(1000.0),
            0,
        ),
    ]
}
