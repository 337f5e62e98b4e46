//! Order records as served by `GET /admin/orders` and `GET /admin/orders/{id}`.

use adm_reconcile::Record;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::AdminPayment;

// ---------------------------------------------------------------------------
// Auxiliary fields
// ---------------------------------------------------------------------------

/// A free-form auxiliary field (`metadata`, `refundInfo`).
///
/// The backend sometimes sends these as real JSON and sometimes as a string
/// holding serialized JSON. Decoding never fails: a string that parses as a
/// JSON object or array becomes [`AuxField::Json`], anything else is kept
/// verbatim as [`AuxField::Raw`] for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum AuxField {
    #[default]
    Absent,
    Json(Value),
    Raw(String),
}

impl From<Value> for AuxField {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => AuxField::Absent,
            Value::String(s) => match serde_json::from_str::<Value>(&s) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => AuxField::Json(parsed),
                _ => AuxField::Raw(s),
            },
            other => AuxField::Json(other),
        }
    }
}

impl From<AuxField> for Value {
    fn from(f: AuxField) -> Self {
        match f {
            AuxField::Absent => Value::Null,
            AuxField::Json(v) => v,
            AuxField::Raw(s) => Value::String(s),
        }
    }
}

impl AuxField {
    pub fn is_absent(&self) -> bool {
        matches!(self, AuxField::Absent)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            AuxField::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Top-level key lookup; `None` for raw or absent fields.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json()?.get(key)
    }

    /// Text suitable for a detail pane.
    pub fn display(&self) -> String {
        match self {
            AuxField::Absent => String::new(),
            AuxField::Json(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
            AuxField::Raw(s) => s.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient amounts
// ---------------------------------------------------------------------------

/// Decimal columns arrive either as JSON numbers or as numeric strings.
pub(crate) fn lenient_amount<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_amount(d)?.unwrap_or(0.0))
}

pub(crate) fn lenient_opt_amount<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(amount_from_value))
}

/// Display-only text column. `null` (or a non-string scalar) decodes as empty
/// instead of failing the whole page.
pub(crate) fn lenient_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Integer column sent as a number or numeric string; anything else is `None`.
pub(crate) fn lenient_opt_i64<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// Number, or a string that parses as one. Anything else is `None`.
pub(crate) fn amount_from_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrder {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub delivery_address: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub budget_amount: f64,
    #[serde(default)]
    pub arrival_image_url: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub user_sequence: Option<i64>,
    #[serde(default)]
    pub delivery_time: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<String>,
    #[serde(default)]
    pub food_preferences: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default, skip_serializing_if = "AuxField::is_absent")]
    pub metadata: AuxField,
}

impl AdminOrder {
    /// Completed, cancelled, or delivered (arrival photo bound).
    pub fn is_finished(&self) -> bool {
        self.status == "completed"
            || self.status == "cancelled"
            || self
                .arrival_image_url
                .as_deref()
                .is_some_and(|u| !u.is_empty())
    }
}

impl Record for AdminOrder {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }
}

// ---------------------------------------------------------------------------
// Order detail
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFeedback {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
}

/// `GET /admin/orders/{id}`: the list row plus payments, feedback and the
/// arrival-image provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderDetail {
    #[serde(flatten)]
    pub order: AdminOrder,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub budget_currency: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub arrival_image_source: Option<String>,
    #[serde(default)]
    pub arrival_image_taken_at: Option<String>,
    #[serde(default)]
    pub arrival_image_imported_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty_vec")]
    pub payments: Vec<AdminPayment>,
    #[serde(default, deserialize_with = "null_as_empty_vec")]
    pub feedbacks: Vec<OrderFeedback>,
}

impl AdminOrderDetail {
    /// Payments newest first.
    pub fn payments_newest_first(&self) -> Vec<&AdminPayment> {
        let mut v: Vec<&AdminPayment> = self.payments.iter().collect();
        v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        v
    }

    pub fn has_refundable_payment(&self) -> bool {
        self.payments
            .iter()
            .any(|p| p.remaining_refundable_cents() > 0)
    }
}

fn null_as_empty_vec<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}
