//! adm-feed
//!
//! Listing sources for the admin reconciler and the HTTP client that backs
//! them. This crate owns the wire formats (orders, payments, refunds,
//! invites) and the network boundary; it holds no list state of its own.

pub mod client;
pub mod credentials;
pub mod error;
pub mod export;
pub mod invites;
pub mod orders;
pub mod payments;
pub mod source;

pub use client::AdminApiClient;
pub use credentials::{CredentialProvider, StaticCredentials};
pub use error::FetchError;
pub use invites::{InviteCode, InviteCodeError, Invitation, NewInviteCode};
pub use orders::{AdminOrder, AdminOrderDetail, AuxField, OrderFeedback};
pub use payments::{AdminPayment, RefundError, RefundRequest, RefundStatus};
pub use source::{ListQuery, ListingSource};
