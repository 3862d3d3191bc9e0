//! Offer ledger and market state — the shared bulletin board
//!
//! Holds the open sell offers and the append-only trade history. Mutation
//! goes through exactly two entry points, `post_offer` and `execute_trade`;
//! everything else is a read-only snapshot. Turns are strictly sequential,
//! so no synchronization is needed here — callers hold `&mut Market` for
//! the duration of a turn.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// A single sell listing on the bulletin board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Unique, monotonically assigned identity — never reused
    pub offer_id: u64,
    /// Owning seller
    pub seller: String,
    /// Commodity name
    pub item: String,
    /// Per-unit price
    pub price: Decimal,
    /// Whole units for sale — always a positive integer at rest
    pub quantity: i64,
    /// When the offer was posted
    pub created_at: DateTime<Utc>,
}

/// Immutable log entry created when a buy consumes an offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub seller: String,
    pub buyer: String,
    pub item: String,
    pub price: Decimal,
    pub quantity: i64,
}

/// Outcome of a `post_offer` attempt.
///
/// Rejection is a value rather than an error so automated callers can
/// branch on it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Posted { offer_id: u64 },
    Rejected { reason: String },
}

impl PostOutcome {
    pub fn offer_id(&self) -> Option<u64> {
        match self {
            PostOutcome::Posted { offer_id } => Some(*offer_id),
            PostOutcome::Rejected { .. } => None,
        }
    }
}

/// Round a posted quantity to the nearest whole unit, half away from zero.
///
/// `10.5` rounds to 11, `-0.5` to -1. Banker's rounding (the `Decimal`
/// default) would turn `10.5` into 10, which is not what sellers expect.
pub fn round_quantity(quantity: Decimal) -> i64 {
    quantity
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// The shared market state: open offers plus append-only trade history
#[derive(Debug, Default)]
pub struct Market {
    offers: Vec<Offer>,
    history: Vec<TradeRecord>,
    next_offer_id: u64,
}

impl Market {
    pub fn new() -> Self {
        Self::default()
    }

    /// List something for sale.
    ///
    /// The quantity is rounded half-away-from-zero to a whole number of
    /// units; a quantity that rounds to zero or below is rejected and no
    /// offer is created.
    ///
    /// The id counter advances on every attempt, including rejected ones,
    /// so the id sequence may contain gaps. Downstream consumers of the
    /// ledger must match trades to offers by id, never by position.
    pub fn post_offer(
        &mut self,
        seller: &str,
        item: &str,
        price: Decimal,
        quantity: Decimal,
    ) -> PostOutcome {
        self.next_offer_id += 1;
        let offer_id = self.next_offer_id;

        let quantity = round_quantity(quantity);
        if quantity <= 0 {
            return PostOutcome::Rejected {
                reason: format!("quantity rounds to {} — must be a positive whole number", quantity),
            };
        }

        self.offers.push(Offer {
            offer_id,
            seller: seller.to_string(),
            item: item.to_string(),
            price,
            quantity,
            created_at: Utc::now(),
        });

        PostOutcome::Posted { offer_id }
    }

    /// Consume an open offer in its entirety on behalf of `buyer`.
    ///
    /// Matching is by exact offer id only — a stale id fails cleanly with
    /// `OfferNotFound` instead of accidentally matching another offer for
    /// the same item. On success the offer leaves the open set and a trade
    /// record is appended to history; on failure nothing changes, and the
    /// same stale id fails identically on every retry.
    pub fn execute_trade(
        &mut self,
        buyer: &str,
        offer_id: u64,
    ) -> std::result::Result<TradeRecord, MarketError> {
        let pos = self
            .offers
            .iter()
            .position(|o| o.offer_id == offer_id)
            .ok_or(MarketError::OfferNotFound { offer_id })?;

        let offer = self.offers.remove(pos);
        let record = TradeRecord {
            timestamp: Utc::now(),
            seller: offer.seller,
            buyer: buyer.to_string(),
            item: offer.item,
            price: offer.price,
            quantity: offer.quantity,
        };
        self.history.push(record.clone());
        Ok(record)
    }

    /// Snapshot of the current board, oldest offer first.
    ///
    /// Returns owned clones — there is no way to mutate the open set
    /// except through `post_offer` / `execute_trade`.
    pub fn open_offers(&self) -> Vec<Offer> {
        self.offers.clone()
    }

    pub fn open_offer_count(&self) -> usize {
        self.offers.len()
    }

    /// Read-only view of the append-only trade history
    pub fn trade_history(&self) -> &[TradeRecord] {
        &self.history
    }
}
