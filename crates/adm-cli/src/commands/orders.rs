use std::path::PathBuf;
use std::time::Duration;

use adm_feed::export::{default_export_file_name, write_orders_csv};
use adm_feed::payments::{format_cents, to_cents};
use adm_feed::{AdminOrder, ListQuery};
use adm_reconcile::{ApplyOutcome, Cursor, ListView};
use adm_runtime::{spawn_poller, OrdersSession, PollEvent, PollerConfig};
use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::payments::payment_line;
use super::{connect, filter_from_arg};

pub async fn list(
    config_paths: &[String],
    status: Option<String>,
    since: Option<String>,
) -> Result<()> {
    let (settings, client) = connect(config_paths)?;
    let query = ListQuery {
        filter: filter_from_arg(status),
        since: since.map(Cursor::new).unwrap_or_default(),
        limit: settings.page_limit,
    };

    let page = client.fetch_orders(&query).await?;
    for o in &page.items {
        println!("{}", order_line(o));
    }
    println!(
        "rows={} next_since={} total={}",
        page.items.len(),
        page.next_cursor.as_deref().unwrap_or("-"),
        page.total.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
    );
    Ok(())
}

pub async fn watch(
    config_paths: &[String],
    status: Option<String>,
    interval_secs: Option<u64>,
    max_updates: u64,
) -> Result<()> {
    let (settings, client) = connect(config_paths)?;
    let interval = Duration::from_secs(interval_secs.unwrap_or(settings.poll_interval_secs).max(1));

    let mut handle = spawn_poller::<AdminOrder>(
        client,
        PollerConfig {
            interval,
            page_limit: settings.page_limit,
            auto_refresh: settings.auto_refresh,
            initial_filter: filter_from_arg(status),
        },
    );

    let mut applied = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
            ev = handle.events.recv() => match ev {
                Ok(PollEvent::Applied { kind, outcome, .. }) => {
                    let view = handle.current();
                    match outcome {
                        ApplyOutcome::Replaced { .. } => {
                            for o in &view.items {
                                println!("{}", order_line(o));
                            }
                            println!("{}", view_summary(kind.as_str(), &view));
                        }
                        ApplyOutcome::Merged { inserted, updated } => {
                            println!(
                                "{} inserted={inserted} updated={updated}",
                                view_summary(kind.as_str(), &view)
                            );
                        }
                        ApplyOutcome::Unchanged => debug!("no new orders"),
                    }
                    applied += 1;
                    if max_updates > 0 && applied >= max_updates {
                        break;
                    }
                }
                Ok(PollEvent::FetchFailed { kind, error, .. }) => {
                    eprintln!("refresh failed ({}): {error}", kind.as_str());
                }
                Ok(PollEvent::Discarded { .. }) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "poll events lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

pub async fn export(
    config_paths: &[String],
    status: Option<String>,
    out: Option<String>,
) -> Result<()> {
    let (settings, client) = connect(config_paths)?;
    let mut session = OrdersSession::new(client, settings.page_limit);
    session.full_reload(filter_from_arg(status)).await?;
    let view = session.view();

    let path = match out {
        Some(p) => PathBuf::from(p),
        None => {
            let dir = settings.export_dir.as_deref().unwrap_or(".");
            PathBuf::from(dir).join(default_export_file_name(Utc::now()))
        }
    };
    let file = std::fs::File::create(&path)
        .with_context(|| format!("create export file failed: {}", path.display()))?;
    let rows = write_orders_csv(&view.items, file)?;

    info!(rows, path = %path.display(), filter = %view.filter, "orders exported");
    println!("exported rows={} path={}", rows, path.display());
    Ok(())
}

pub async fn set_status(config_paths: &[String], order_id: &str, status: &str) -> Result<()> {
    let status = status.trim();
    if status.is_empty() {
        anyhow::bail!("--status must not be blank");
    }
    let (_, client) = connect(config_paths)?;
    client.update_order_status(order_id, status).await?;
    println!("order_id={order_id} status={status}");
    Ok(())
}

pub async fn show(config_paths: &[String], order_id: &str) -> Result<()> {
    let (_, client) = connect(config_paths)?;
    let detail = client.fetch_order_detail(order_id).await?;
    let o = &detail.order;

    println!("{}", order_line(o));
    for (key, value) in [
        ("user_id", detail.user_id.as_deref()),
        ("submitted_at", detail.submitted_at.as_deref()),
        ("updated_at", detail.updated_at.as_deref()),
        ("phone", o.phone_number.as_deref()),
        ("delivery_time", o.delivery_time.as_deref()),
        ("payment_status", o.payment_status.as_deref()),
        ("arrival_image", o.arrival_image_url.as_deref()),
        ("arrival_image_source", detail.arrival_image_source.as_deref()),
    ] {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            println!("{key}={v}");
        }
    }
    if !o.metadata.is_absent() {
        println!("metadata:\n{}", o.metadata.display());
    }

    let payments = detail.payments_newest_first();
    println!("payments={}", payments.len());
    for p in payments {
        println!("{}", payment_line(p));
    }
    println!("feedbacks={}", detail.feedbacks.len());
    for f in &detail.feedbacks {
        println!(
            "{}\t{}\t{}\t{}",
            f.id,
            f.rating.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            f.created_at,
            f.comment.as_deref().unwrap_or("").replace(['\r', '\n'], " ")
        );
    }
    Ok(())
}

pub async fn import_arrival_image(
    config_paths: &[String],
    order_id: &str,
    image_url: &str,
) -> Result<()> {
    let image_url = image_url.trim();
    if !(image_url.starts_with("http://") || image_url.starts_with("https://")) {
        anyhow::bail!("--image-url must be an http(s) URL");
    }
    let (_, client) = connect(config_paths)?;
    client.import_arrival_image(order_id, image_url).await?;
    info!(order_id, image_url, "arrival image imported");
    println!("order_id={order_id} arrival_image={image_url}");
    Ok(())
}

fn order_line(o: &AdminOrder) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        o.order_number,
        o.status,
        o.created_at,
        format_cents(to_cents(o.budget_amount)),
        o.delivery_address.replace(['\r', '\n'], " ")
    )
}

fn view_summary(kind: &str, view: &ListView<AdminOrder>) -> String {
    format!(
        "[{kind}] filter={} rows={} cursor={} total={}",
        view.filter,
        view.items.len(),
        view.cursor,
        view.total.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
    )
}
