//! Decision validation and type coercion
//!
//! The boundary between untrusted LLM output and state mutation. Raw text
//! comes in; exactly one of a closed set of commands comes out, or a
//! diagnostic rejection. Nothing downstream ever sees raw external data.
//!
//! The coercion contract is deliberately forgiving about representation
//! (numeric strings, floats where integers are expected) and strict about
//! meaning: a value that cannot be interpreted at all is a typed
//! `Coercion` error carrying the parameter name, the offending raw value,
//! and its origin type.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AgoraError, Result};

/// Decision object shape the generator is asked to produce
#[derive(Debug, Clone, Deserialize)]
pub struct RawDecision {
    /// Diagnostic only — never used in logic
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Validated command, the only thing the execution controller accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Buy {
        offer_id: u64,
        /// Informational only — the market always transfers the offer's
        /// full posted quantity
        quantity: Option<i64>,
    },
    Post {
        item: String,
        price: Decimal,
        quantity: i64,
    },
    Wait,
}

/// A validated decision: reasoning retained for logging, command for execution
#[derive(Debug, Clone)]
pub struct Decision {
    pub reasoning: String,
    pub command: Command,
}

impl Decision {
    /// Synthetic fallback used when the generator call itself fails
    pub fn wait(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            command: Command::Wait,
        }
    }
}

/// Extract the JSON object from generator output that may be wrapped in
/// markdown code fences or surrounding prose.
pub fn extract_json(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        if let Some(end) = text[start + 7..].find("```") {
            return text[start + 7..start + 7 + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        if let Some(end) = text[start + 3..].find("```") {
            let content = text[start + 3..start + 3 + end].trim();
            if let Some(newline) = content.find('\n') {
                return content[newline + 1..].trim();
            }
            return content;
        }
    }

    if let Some(start) = text.find('{') {
        if let Some(end) = text.rfind('}') {
            return &text[start..=end];
        }
    }

    text.trim()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coercion_error(param: &str, value: &Value) -> AgoraError {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    AgoraError::Coercion {
        param: param.to_string(),
        raw,
        kind: json_type_name(value).to_string(),
    }
}

/// True when a value means "nothing was provided": JSON null, the empty
/// string, or the literal string "null".
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.is_empty() || trimmed == "null"
        }
        _ => false,
    }
}

/// Coerce a parameter to a decimal. Absent values are `Ok(None)`, not errors.
pub fn coerce_decimal(value: Option<&Value>, param: &str) -> Result<Option<Decimal>> {
    let Some(value) = value else { return Ok(None) };
    if is_absent(value) {
        return Ok(None);
    }

    match value {
        Value::Number(n) => {
            // f64 path covers numbers Decimal::from_* can't take directly
            n.as_i64()
                .map(Decimal::from)
                .or_else(|| n.as_f64().and_then(Decimal::from_f64_retain))
                .map(Some)
                .ok_or_else(|| coercion_error(param, value))
        }
        Value::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|_| coercion_error(param, value)),
        _ => Err(coercion_error(param, value)),
    }
}

/// Coerce a parameter to an integer, rounding half away from zero.
///
/// Accepts "5.7" (rounds to 6) because generators routinely emit fractional
/// quantities; the integer invariant is enforced here, once, rather than
/// scattered across callers.
pub fn coerce_int(value: Option<&Value>, param: &str) -> Result<Option<i64>> {
    let Some(decimal) = coerce_decimal(value, param)? else {
        return Ok(None);
    };
    decimal
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .map(Some)
        .ok_or_else(|| coercion_error(param, value.unwrap_or(&Value::Null)))
}

/// Coerce a parameter to a trimmed string. Empty-after-trim is absent.
pub fn coerce_str(value: Option<&Value>, param: &str) -> Result<Option<String>> {
    let Some(value) = value else { return Ok(None) };
    if is_absent(value) {
        return Ok(None);
    }

    match value {
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(coercion_error(param, value)),
    }
}

/// Parse raw generator output into a `RawDecision`.
pub fn parse_raw(text: &str) -> Result<RawDecision> {
    let json = extract_json(text);
    serde_json::from_str(json).map_err(|e| {
        AgoraError::Parse(format!(
            "not a valid decision object: {} (raw: {})",
            e,
            json.chars().take(200).collect::<String>()
        ))
    })
}

/// Validate a raw decision into a well-typed command.
///
/// Command matching is substring-based and case-insensitive, tolerating
/// phrasing like "I will buy offer 3". Priority is fixed: "buy" is checked
/// before "post", so a string containing both resolves to buy.
pub fn validate(raw: RawDecision) -> Result<Decision> {
    let command_text = raw.command.to_lowercase();

    let command = if command_text.contains("buy") {
        validate_buy(&raw.params)?
    } else if command_text.contains("post") {
        validate_post(&raw.params)?
    } else {
        Command::Wait
    };

    Ok(Decision {
        reasoning: if raw.reasoning.is_empty() {
            "No reason provided.".to_string()
        } else {
            raw.reasoning
        },
        command,
    })
}

/// Parse and validate in one step.
pub fn validate_text(text: &str) -> Result<Decision> {
    validate(parse_raw(text)?)
}

fn validate_buy(params: &Map<String, Value>) -> Result<Command> {
    let offer_id = coerce_int(params.get("offer_id"), "offer_id")?
        .ok_or_else(|| AgoraError::Validation("buy requires an offer_id".to_string()))?;
    let offer_id = u64::try_from(offer_id)
        .map_err(|_| AgoraError::Validation(format!("offer_id must be positive: {offer_id}")))?;

    // Optional: absent means "buy the entire offer"
    let quantity = coerce_int(params.get("quantity"), "quantity")?;

    Ok(Command::Buy { offer_id, quantity })
}

fn validate_post(params: &Map<String, Value>) -> Result<Command> {
    let item = coerce_str(params.get("item"), "item")?;
    let price = coerce_decimal(params.get("price"), "price")?;
    // The original prompt asks for "qty" on post but models sometimes send
    // "quantity" — accept either, preferring the documented key.
    let quantity = match coerce_int(params.get("qty"), "qty")? {
        Some(q) => Some(q),
        None => coerce_int(params.get("quantity"), "quantity")?,
    };

    let mut missing = Vec::new();
    if item.is_none() {
        missing.push("item");
    }
    if !price.is_some_and(|p| p > Decimal::ZERO) {
        missing.push("price (must be > 0)");
    }
    if !quantity.is_some_and(|q| q > 0) {
        missing.push("qty (must be integer > 0)");
    }
    if !missing.is_empty() {
        return Err(AgoraError::Validation(format!(
            "missing or invalid parameters: {}",
            missing.join(", ")
        )));
    }

    Ok(Command::Post {
        item: item.unwrap_or_default(),
        price: price.unwrap_or_default(),
        quantity: quantity.unwrap_or_default(),
    })
}
