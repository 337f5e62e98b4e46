//! Payments attached to an order and the refund arithmetic around them.
//!
//! Amounts travel as decimal currency units on the wire and are converted to
//! integer cents before any comparison, so `remaining` never drifts by a
//! float ulp.

use std::fmt;

use adm_reconcile::Record;
use serde::{Deserialize, Serialize};

use crate::orders::{amount_from_value, lenient_amount, lenient_opt_amount, lenient_string, AuxField};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPayment {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub provider: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub out_trade_no: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_amount")]
    pub refunded_amount: Option<f64>,
    #[serde(default)]
    pub refunded_at: Option<String>,
    #[serde(default, skip_serializing_if = "AuxField::is_absent")]
    pub metadata: AuxField,
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: String,
}

impl Record for AdminPayment {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }
}

impl AdminPayment {
    pub fn amount_cents(&self) -> i64 {
        to_cents(self.amount)
    }

    /// `refundedAmount` when set and non-zero, else `metadata.refundTotal`.
    pub fn refunded_cents(&self) -> i64 {
        let direct = self.refunded_amount.map(to_cents).unwrap_or(0);
        if direct != 0 {
            return direct;
        }
        self.metadata
            .get("refundTotal")
            .and_then(amount_from_value)
            .map(to_cents)
            .unwrap_or(0)
    }

    /// Never negative.
    pub fn remaining_refundable_cents(&self) -> i64 {
        self.amount_cents()
            .saturating_sub(self.refunded_cents())
            .max(0)
    }
}

/// `GET /admin/payments/{id}/refund-status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundStatus {
    pub payment_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub original_amount: f64,
    #[serde(default, deserialize_with = "lenient_opt_amount")]
    pub refunded_amount: Option<f64>,
    #[serde(default)]
    pub refunded_at: Option<String>,
    #[serde(default)]
    pub is_fully_refunded: bool,
    #[serde(default)]
    pub is_partially_refunded: bool,
    #[serde(default, skip_serializing_if = "AuxField::is_absent")]
    pub refund_info: AuxField,
}

impl RefundStatus {
    pub fn summary(&self) -> String {
        format!(
            "status={} refunded={} / {}",
            self.status,
            format_cents(self.refunded_amount.map(to_cents).unwrap_or(0)),
            format_cents(to_cents(self.original_amount))
        )
    }
}

/// Body of `POST /admin/payments/{id}/refund`. No amount = refund the rest.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RefundRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RefundRequest {
    pub fn new(amount_cents: Option<i64>, reason: Option<&str>) -> Self {
        Self {
            amount: amount_cents.map(from_cents),
            reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Refund validation
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefundError {
    /// Nothing left to refund on this payment.
    NotRefundable,
    /// Not a positive number.
    InvalidAmount(String),
    ExceedsRemaining { requested: i64, remaining: i64 },
}

impl fmt::Display for RefundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefundError::NotRefundable => write!(f, "payment has no refundable balance"),
            RefundError::InvalidAmount(raw) => write!(f, "invalid refund amount: '{raw}'"),
            RefundError::ExceedsRemaining {
                requested,
                remaining,
            } => write!(
                f,
                "refund amount {} exceeds remaining refundable {}",
                format_cents(*requested),
                format_cents(*remaining)
            ),
        }
    }
}

impl std::error::Error for RefundError {}

/// Parse operator input. Blank means "no amount" (full refund).
pub fn parse_refund_amount(raw: &str) -> Result<Option<i64>, RefundError> {
    let t = raw.trim();
    if t.is_empty() {
        return Ok(None);
    }
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(Some(to_cents(v))),
        _ => Err(RefundError::InvalidAmount(t.to_string())),
    }
}

/// Check a requested amount against the remaining balance.
pub fn validate_refund_amount(
    requested: Option<i64>,
    remaining: i64,
) -> Result<Option<i64>, RefundError> {
    if remaining <= 0 {
        return Err(RefundError::NotRefundable);
    }
    match requested {
        None => Ok(None),
        Some(c) if c <= 0 => Err(RefundError::InvalidAmount(format_cents(c))),
        Some(c) if c > remaining => Err(RefundError::ExceedsRemaining {
            requested: c,
            remaining,
        }),
        Some(c) => Ok(Some(c)),
    }
}

/// Pre-filled amount: a preset clamped into `0..=remaining`, or the whole
/// remaining balance. `None` when the result would be zero.
pub fn default_refund_cents(remaining: i64, preset: Option<i64>) -> Option<i64> {
    let v = match preset {
        Some(p) => p.clamp(0, remaining.max(0)),
        None => remaining,
    };
    (v > 0).then_some(v)
}

pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// `1234` → `"12.34"`, `-5` → `"-0.05"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
