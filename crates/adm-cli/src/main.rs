use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adm")]
#[command(about = "Admin orders console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Order list commands
    Orders {
        #[command(subcommand)]
        cmd: OrdersCmd,
    },

    /// Payment and refund commands
    Payments {
        #[command(subcommand)]
        cmd: PaymentsCmd,
    },

    /// Invite codes and invitations
    Invites {
        #[command(subcommand)]
        cmd: InvitesCmd,
    },
}

#[derive(Subcommand)]
enum OrdersCmd {
    /// Fetch one page and print it.
    List {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Status filter; omit for all statuses
        #[arg(long)]
        status: Option<String>,

        /// Only records newer than this cursor
        #[arg(long)]
        since: Option<String>,
    },

    /// Keep the list current: full reload, then incremental refresh on a timer.
    Watch {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        status: Option<String>,

        /// Overrides poll.interval_secs
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Exit after this many applied responses (0 = until Ctrl-C)
        #[arg(long, default_value_t = 0)]
        max_updates: u64,
    },

    /// Full reload, then write the list as CSV.
    Export {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        status: Option<String>,

        /// Output file; defaults to export.dir/orders_<millis>.csv
        #[arg(long)]
        out: Option<String>,
    },

    /// Change one order's status.
    SetStatus {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        order_id: String,

        #[arg(long)]
        status: String,
    },

    /// One order with its payments, feedback and metadata.
    Show {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        order_id: String,
    },

    /// Bind an already-hosted arrival photo to an order.
    ImportArrivalImage {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        order_id: String,

        #[arg(long)]
        image_url: String,
    },
}

#[derive(Subcommand)]
enum InvitesCmd {
    /// All invite codes with their usage.
    Codes {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },

    /// Recorded invitations, newest first.
    Invitations {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// Create an invite code.
    Create {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        code: String,

        #[arg(long)]
        max_uses: u32,

        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
enum PaymentsCmd {
    /// Payments recorded against an order.
    List {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        order_id: String,
    },

    /// Refund a payment (full when --amount is omitted).
    Refund {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Order the payment belongs to (used to look up the refundable balance)
        #[arg(long)]
        order_id: String,

        #[arg(long)]
        payment_id: String,

        /// Amount in currency units, e.g. 12.50
        #[arg(long)]
        amount: Option<String>,

        #[arg(long)]
        reason: Option<String>,

        /// Acknowledge that money will be returned to the customer.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },

    /// Refund progress for a payment.
    RefundStatus {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        payment_id: String,
    },

    /// Ask the server to re-sync a payment with its provider.
    Sync {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        payment_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent when missing.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = adm_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Orders { cmd } => match cmd {
            OrdersCmd::List {
                config_paths,
                status,
                since,
            } => commands::orders::list(&config_paths, status, since).await?,
            OrdersCmd::Watch {
                config_paths,
                status,
                interval_secs,
                max_updates,
            } => commands::orders::watch(&config_paths, status, interval_secs, max_updates).await?,
            OrdersCmd::Export {
                config_paths,
                status,
                out,
            } => commands::orders::export(&config_paths, status, out).await?,
            OrdersCmd::SetStatus {
                config_paths,
                order_id,
                status,
            } => commands::orders::set_status(&config_paths, &order_id, &status).await?,
            OrdersCmd::Show {
                config_paths,
                order_id,
            } => commands::orders::show(&config_paths, &order_id).await?,
            OrdersCmd::ImportArrivalImage {
                config_paths,
                order_id,
                image_url,
            } => {
                commands::orders::import_arrival_image(&config_paths, &order_id, &image_url)
                    .await?
            }
        },

        Commands::Payments { cmd } => match cmd {
            PaymentsCmd::List {
                config_paths,
                order_id,
            } => commands::payments::list(&config_paths, &order_id).await?,
            PaymentsCmd::Refund {
                config_paths,
                order_id,
                payment_id,
                amount,
                reason,
                yes,
            } => {
                commands::payments::refund(
                    &config_paths,
                    &order_id,
                    &payment_id,
                    amount.as_deref(),
                    reason.as_deref(),
                    yes,
                )
                .await?
            }
            PaymentsCmd::RefundStatus {
                config_paths,
                payment_id,
            } => commands::payments::refund_status(&config_paths, &payment_id).await?,
            PaymentsCmd::Sync {
                config_paths,
                payment_id,
            } => commands::payments::sync(&config_paths, &payment_id).await?,
        },

        Commands::Invites { cmd } => match cmd {
            InvitesCmd::Codes { config_paths } => commands::invites::codes(&config_paths).await?,
            InvitesCmd::Invitations {
                config_paths,
                limit,
            } => commands::invites::invitations(&config_paths, limit).await?,
            InvitesCmd::Create {
                config_paths,
                code,
                max_uses,
                description,
            } => {
                commands::invites::create(&config_paths, &code, max_uses, description.as_deref())
                    .await?
            }
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
