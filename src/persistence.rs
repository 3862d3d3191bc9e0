//! Ledger sinks — best-effort persistence of trades and board snapshots
//!
//! The market core guarantees nothing about durability; sinks exist so the
//! out-of-scope analytics can consume a trade table and an offers snapshot.
//! Sink errors are surfaced to the caller, which logs and moves on — a
//! failed write never costs anyone a turn.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::market::{Offer, TradeRecord};

/// Destination for persisted market artifacts
pub trait LedgerSink: Send {
    /// Append one trade to the durable trade table
    fn record_trade(&mut self, trade: &TradeRecord) -> Result<()>;

    /// Replace the persisted snapshot of the open board
    fn snapshot_offers(&mut self, offers: &[Offer]) -> Result<()>;
}

/// Sink that discards everything (tests, offline runs)
#[derive(Debug, Default)]
pub struct NullSink;

impl LedgerSink for NullSink {
    fn record_trade(&mut self, _trade: &TradeRecord) -> Result<()> {
        Ok(())
    }

    fn snapshot_offers(&mut self, _offers: &[Offer]) -> Result<()> {
        Ok(())
    }
}

/// File-backed sink: CSV trade ledger plus a JSON snapshot of open offers.
///
/// Column layout matches what the analytics side expects:
/// `timestamp,seller,buyer,item,price,quantity`.
pub struct FileLedgerSink {
    ledger_path: PathBuf,
    offers_path: PathBuf,
}

impl FileLedgerSink {
    /// Create the log directory (if needed) and the ledger header (if the
    /// ledger does not exist yet).
    pub fn new(log_dir: impl AsRef<Path>) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let ledger_path = log_dir.join("transaction_ledger.csv");
        let offers_path = log_dir.join("active_offers.json");

        if !ledger_path.exists() {
            let mut file = File::create(&ledger_path)?;
            writeln!(file, "timestamp,seller,buyer,item,price,quantity")?;
        }

        Ok(Self {
            ledger_path,
            offers_path,
        })
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    pub fn offers_path(&self) -> &Path {
        &self.offers_path
    }
}

/// Quote a CSV field only when it needs quoting
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl LedgerSink for FileLedgerSink {
    fn record_trade(&mut self, trade: &TradeRecord) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.ledger_path)?;
        writeln!(
            file,
            "{},{},{},{},{},{}",
            trade.timestamp.to_rfc3339(),
            csv_field(&trade.seller),
            csv_field(&trade.buyer),
            csv_field(&trade.item),
            trade.price,
            trade.quantity
        )?;
        Ok(())
    }

    fn snapshot_offers(&mut self, offers: &[Offer]) -> Result<()> {
        let json = serde_json::to_string_pretty(offers)?;
        fs::write(&self.offers_path, json)?;
        Ok(())
    }
}
