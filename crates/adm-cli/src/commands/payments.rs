use adm_feed::payments::{format_cents, parse_refund_amount, validate_refund_amount};
use adm_feed::{AdminPayment, RefundRequest};
use anyhow::{bail, Result};
use tracing::info;

use super::connect;

pub async fn list(config_paths: &[String], order_id: &str) -> Result<()> {
    let (_, client) = connect(config_paths)?;
    let payments = client.list_payments_by_order(order_id).await?;
    if payments.is_empty() {
        println!("no payments for order {order_id}");
        return Ok(());
    }
    for p in &payments {
        println!("{}", payment_line(p));
    }
    Ok(())
}

/// Validates the amount against the remaining refundable balance before
/// anything is sent; `--yes` is required to actually submit.
pub async fn refund(
    config_paths: &[String],
    order_id: &str,
    payment_id: &str,
    amount: Option<&str>,
    reason: Option<&str>,
    yes: bool,
) -> Result<()> {
    let requested = parse_refund_amount(amount.unwrap_or(""))?;

    let (_, client) = connect(config_paths)?;
    let payments = client.list_payments_by_order(order_id).await?;
    let Some(payment) = payments.iter().find(|p| p.id == payment_id) else {
        bail!("payment {payment_id} not found on order {order_id}");
    };

    let remaining = payment.remaining_refundable_cents();
    let cents = validate_refund_amount(requested, remaining)?;
    let shown = format_cents(cents.unwrap_or(remaining));

    if !yes {
        bail!(
            "refund of {} {} on payment {} requires --yes",
            shown,
            payment.currency,
            payment_id
        );
    }

    let message = client
        .refund_payment(payment_id, &RefundRequest::new(cents, reason))
        .await?;
    info!(payment_id, amount = %shown, "refund submitted");
    println!("{message}");
    Ok(())
}

pub async fn refund_status(config_paths: &[String], payment_id: &str) -> Result<()> {
    let (_, client) = connect(config_paths)?;
    let status = client.refund_status(payment_id).await?;
    println!("payment_id={} {}", status.payment_id, status.summary());
    Ok(())
}

pub async fn sync(config_paths: &[String], payment_id: &str) -> Result<()> {
    let (_, client) = connect(config_paths)?;
    client.sync_payment_status(payment_id).await?;
    println!("payment_id={payment_id} synced");
    Ok(())
}

pub(crate) fn payment_line(p: &AdminPayment) -> String {
    format!(
        "{}\t{}\t{}\t{} {}\trefunded={}\tremaining={}",
        p.id,
        p.provider,
        p.status,
        format_cents(p.amount_cents()),
        p.currency,
        format_cents(p.refunded_cents()),
        format_cents(p.remaining_refundable_cents())
    )
}
