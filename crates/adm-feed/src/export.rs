//! CSV export of an order list, in the order given (newest first when fed a
//! reconciler view).

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::payments::{format_cents, to_cents};
use crate::AdminOrder;

pub const ORDER_CSV_HEADER: [&str; 6] = [
    "order_number",
    "status",
    "created_at",
    "delivery_address",
    "budget_amount",
    "arrival_image_url",
];

/// `orders_<epoch millis>.csv`
pub fn default_export_file_name(now: DateTime<Utc>) -> String {
    format!("orders_{}.csv", now.timestamp_millis())
}

/// Write `orders` as CSV. Every cell is quoted; embedded quotes are doubled
/// and line breaks in addresses become spaces. Returns the row count.
pub fn write_orders_csv<W: Write>(orders: &[AdminOrder], out: W) -> Result<usize> {
    let mut w = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(out);

    w.write_record(ORDER_CSV_HEADER)
        .context("csv header write failed")?;

    for o in orders {
        let amount = format_cents(to_cents(o.budget_amount));
        w.write_record([
            o.order_number.as_str(),
            o.status.as_str(),
            format_timestamp(&o.created_at).as_str(),
            single_line(&o.delivery_address).as_str(),
            amount.as_str(),
            o.arrival_image_url.as_deref().unwrap_or(""),
        ])
        .with_context(|| format!("csv row write failed for order {}", o.id))?;
    }

    w.flush().context("csv flush failed")?;
    Ok(orders.len())
}

/// RFC 3339 → `YYYY-MM-DD HH:MM:SS` (UTC). Unparseable input is kept as-is.
fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_uses_epoch_millis() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(default_export_file_name(now), "orders_1717200000000.csv");
    }

    #[test]
    fn timestamp_is_normalised_to_utc() {
        assert_eq!(
            format_timestamp("2024-06-01T18:30:00+08:00"),
            "2024-06-01 10:30:00"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
