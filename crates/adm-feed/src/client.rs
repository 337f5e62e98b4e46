//! reqwest-backed client for the admin REST API.
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! { "success": true, "message": "...", "data": { ... } }
//! ```
//!
//! A non-2xx status or `success != true` is a [`FetchError::Api`].
//! Credentials are read from the [`CredentialProvider`] on every request;
//! never log them.

use std::sync::Arc;
use std::time::Duration;

use adm_reconcile::Page;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    AdminOrder, AdminOrderDetail, AdminPayment, CredentialProvider, FetchError, InviteCode,
    Invitation, ListQuery, ListingSource, NewInviteCode, RefundRequest, RefundStatus,
};

const SYSTEM_KEY_HEADER: &str = "X-System-Key";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct OrdersData {
    #[serde(default)]
    items: Vec<AdminOrder>,
    #[serde(default)]
    next_since: Option<String>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ItemsData<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Clone)]
pub struct AdminApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for AdminApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AdminApiClient {
    pub fn new(
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::Config(format!("invalid base url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Config(format!(
                "base url '{base_url}' cannot carry a path"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Config(format!("http client init failed: {e}")))?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL + percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Config("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let req = match self.credentials.bearer_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        match self.credentials.system_key() {
            Some(key) => req.header(SYSTEM_KEY_HEADER, key),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        what: &str,
    ) -> Result<Envelope<T>, FetchError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("{what} request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("{what} body read failed: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<Value>>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(FetchError::Api {
                status: Some(status.as_u16()),
                message,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|e| FetchError::Decode(format!("{what} response json decode failed: {e}")))?;

        if !envelope.success {
            return Err(FetchError::Api {
                status: None,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("{what} failed")),
            });
        }
        Ok(envelope)
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// `GET /admin/orders?limit=&status=&since=`
    pub async fn fetch_orders(&self, query: &ListQuery) -> Result<Page<AdminOrder>, FetchError> {
        let url = self.endpoint(&["admin", "orders"])?;
        let mut params: Vec<(&str, String)> = vec![("limit", query.limit.to_string())];
        if let Some(status) = query.filter.status_str() {
            params.push(("status", status.to_string()));
        }
        if let Some(since) = query.since.as_str() {
            params.push(("since", since.to_string()));
        }

        let envelope: Envelope<OrdersData> = self
            .send(self.http.get(url).query(&params), "list orders")
            .await?;
        let data = envelope.data.unwrap_or(OrdersData {
            items: Vec::new(),
            next_since: None,
            total: None,
        });

        debug!(
            items = data.items.len(),
            next_since = ?data.next_since,
            filter = %query.filter,
            since = %query.since,
            "admin orders page fetched"
        );

        Ok(Page {
            items: data.items,
            next_cursor: data.next_since,
            total: data.total,
        })
    }

    /// `POST /admin/orders/{id}/status`
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: &str,
    ) -> Result<(), FetchError> {
        let url = self.endpoint(&["admin", "orders", order_id, "status"])?;
        let body = serde_json::json!({ "status": status });
        self.send::<Value>(self.http.post(url).json(&body), "update order status")
            .await?;
        Ok(())
    }

    /// `GET /admin/orders/{id}`
    pub async fn fetch_order_detail(
        &self,
        order_id: &str,
    ) -> Result<AdminOrderDetail, FetchError> {
        let url = self.endpoint(&["admin", "orders", order_id])?;
        let envelope: Envelope<AdminOrderDetail> =
            self.send(self.http.get(url), "order detail").await?;
        envelope
            .data
            .ok_or_else(|| FetchError::Decode("order detail response has no data".to_string()))
    }

    /// `POST /admin/orders/{id}/arrival-image/import {image_url}`
    pub async fn import_arrival_image(
        &self,
        order_id: &str,
        image_url: &str,
    ) -> Result<(), FetchError> {
        let url = self.endpoint(&["admin", "orders", order_id, "arrival-image", "import"])?;
        let body = serde_json::json!({ "image_url": image_url });
        self.send::<Value>(self.http.post(url).json(&body), "import arrival image")
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Payments
    // -----------------------------------------------------------------------

    /// `GET /admin/payments/order/{orderId}`
    pub async fn list_payments_by_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<AdminPayment>, FetchError> {
        let url = self.endpoint(&["admin", "payments", "order", order_id])?;
        let envelope: Envelope<Vec<AdminPayment>> =
            self.send(self.http.get(url), "list payments").await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// `POST /admin/payments/{id}/refund`. Returns the server's message.
    pub async fn refund_payment(
        &self,
        payment_id: &str,
        req: &RefundRequest,
    ) -> Result<String, FetchError> {
        let url = self.endpoint(&["admin", "payments", payment_id, "refund"])?;
        let envelope: Envelope<Value> = self.send(self.http.post(url).json(req), "refund").await?;
        Ok(envelope.message.unwrap_or_else(|| "refund accepted".to_string()))
    }

    /// `GET /admin/payments/{id}/refund-status`
    pub async fn refund_status(&self, payment_id: &str) -> Result<RefundStatus, FetchError> {
        let url = self.endpoint(&["admin", "payments", payment_id, "refund-status"])?;
        let envelope: Envelope<RefundStatus> =
            self.send(self.http.get(url), "refund status").await?;
        envelope
            .data
            .ok_or_else(|| FetchError::Decode("refund status response has no data".to_string()))
    }

    /// `POST /admin/payments/{id}/sync-status`
    pub async fn sync_payment_status(&self, payment_id: &str) -> Result<(), FetchError> {
        let url = self.endpoint(&["admin", "payments", payment_id, "sync-status"])?;
        self.send::<Value>(self.http.post(url), "sync payment status")
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Invites
    // -----------------------------------------------------------------------

    /// `GET /admin/invite-codes`
    pub async fn list_invite_codes(&self) -> Result<Vec<InviteCode>, FetchError> {
        let url = self.endpoint(&["admin", "invite-codes"])?;
        let envelope: Envelope<Vec<InviteCode>> =
            self.send(self.http.get(url), "list invite codes").await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// `GET /admin/invitations?limit=`
    pub async fn list_invitations(&self, limit: u32) -> Result<Vec<Invitation>, FetchError> {
        let url = self.endpoint(&["admin", "invitations"])?;
        let envelope: Envelope<ItemsData<Invitation>> = self
            .send(
                self.http.get(url).query(&[("limit", limit.to_string())]),
                "list invitations",
            )
            .await?;
        Ok(envelope.data.map(|d| d.items).unwrap_or_default())
    }

    /// `POST /v1/admin/create-invite-code`
    pub async fn create_invite_code(&self, req: &NewInviteCode) -> Result<(), FetchError> {
        let url = self.endpoint(&["v1", "admin", "create-invite-code"])?;
        self.send::<Value>(self.http.post(url).json(req), "create invite code")
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ListingSource<AdminOrder> for AdminApiClient {
    fn source_name(&self) -> &'static str {
        "admin-orders"
    }

    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<AdminOrder>, FetchError> {
        self.fetch_orders(query).await
    }
}
