//! Trade entity and the payload accepted when creating or updating one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

const MAX_SYMBOL_LENGTH: usize = 10;
const MAX_NOTES_LENGTH: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: u64,
    pub symbol: String,
    pub quantity: i64,
    pub price: f64,
    #[serde(rename = "type")]
    pub trade_type: String,
    pub status: String,
    pub trade_date: NaiveDate,
    pub settlement_date: NaiveDate,
    pub counterparty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Request body for POST and PUT on `/api/v1/trades`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeInput {
    #[serde(default)]
    pub symbol: String,
    pub quantity: i64,
    pub price: f64,
    #[serde(rename = "type", default)]
    pub trade_type: String,
    #[serde(default)]
    pub status: String,
    pub trade_date: NaiveDate,
    pub settlement_date: NaiveDate,
    #[serde(default)]
    pub counterparty: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TradeInput {
    /// Checks every field and reports all violations at once.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Vec::new();

        let symbol_len = self.symbol.trim().chars().count();
        if symbol_len == 0 {
            violations.push("Symbol is required".to_string());
        } else if symbol_len > MAX_SYMBOL_LENGTH {
            violations.push(format!(
                "Symbol must be between 1 and {} characters",
                MAX_SYMBOL_LENGTH
            ));
        }
        if self.quantity <= 0 {
            violations.push("Quantity must be positive".to_string());
        }
        if self.price.is_nan() || self.price <= 0.0 {
            violations.push("Price must be positive".to_string());
        }
        if self.trade_type.trim().is_empty() {
            violations.push("Type is required".to_string());
        }
        if self.status.trim().is_empty() {
            violations.push("Status is required".to_string());
        }
        if self.counterparty.trim().is_empty() {
            violations.push("Counterparty is required".to_string());
        }
        if self.settlement_date < self.trade_date {
            violations.push("Settlement date cannot be before trade date".to_string());
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > MAX_NOTES_LENGTH {
                violations.push(format!(
                    "Notes cannot exceed {} characters",
                    MAX_NOTES_LENGTH
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(violations.join("; ")))
        }
    }

    pub fn into_trade(self, id: u64) -> Trade {
        Trade {
            id,
            symbol: self.symbol,
            quantity: self.quantity,
            price: self.price,
            trade_type: self.trade_type,
            status: self.status,
            trade_date: self.trade_date,
            settlement_date: self.settlement_date,
            counterparty: self.counterparty,
            notes: self.notes,
        }
    }
}
