//! HTTP client for the subscription status backend.
//!
//! All wire payloads are JSON. Responses whose schema is owned by the
//! backend (status, history, metrics, health) are returned as
//! [`serde_json::Value`]; the client only types what it has to inspect.
//!
//! ```text
//! GET  {status}/{wallet}
//! POST {subscribe}                         body: PaymentRecord
//! GET  {payments}?wallet=&limit=&offset=
//! GET  {metrics}
//! GET  {health}
//! GET  {transaction}/{tx}                  polled until processed
//! ```

pub mod poll;

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{ApiConfig, Endpoints, PollingConfig};
use crate::error::AppError;
use crate::memo::MemoCodec;
use crate::payment::PaymentRecord;
use crate::wallet::validate_wallet_name;

use poll::{PollPolicy, poll_until};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Transaction processing state as reported by `{transaction}/{tx}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionStatus {
    #[serde(default)]
    pub processed: bool,
    /// Remaining backend fields, passed through untouched.
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

/// Client for the subscription backend.
///
/// Constructed once from [`ApiConfig`], then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct SubscriptionClient {
    http: Client,
    base_url: String,
    endpoints: Endpoints,
    poll_policy: PollPolicy,
    codec: MemoCodec,
}

impl SubscriptionClient {
    pub fn new(api: &ApiConfig, polling: &PollingConfig, codec: MemoCodec) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()
            .map_err(|e| AppError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            endpoints: api.endpoints.clone(),
            poll_policy: PollPolicy::new(
                polling.max_attempts,
                Duration::from_millis(polling.interval_ms),
            ),
            codec,
        })
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Current subscription snapshot for one wallet.
    ///
    /// The name is validated before it is placed in the URL path.
    pub async fn subscription_status(&self, wallet: &str) -> Result<Value, AppError> {
        if wallet.is_empty() {
            return Err(AppError::format("wallet address is required"));
        }
        validate_wallet_name(wallet)?;
        let url = self.url(&format!("{}/{wallet}", self.endpoints.status));
        self.send(self.http.get(&url), "GET", &url).await
    }

    /// Status for several wallets, fetched concurrently.
    ///
    /// One wallet failing does not fail the batch: its entry becomes
    /// `{"error": "...", "isActive": false}`.
    pub async fn wallet_statuses(&self, wallets: &[String]) -> Result<BTreeMap<String, Value>, AppError> {
        if wallets.is_empty() {
            return Err(AppError::format("wallet addresses are required"));
        }

        let mut tasks = JoinSet::new();
        for wallet in wallets {
            let client = self.clone();
            let wallet = wallet.clone();
            tasks.spawn(async move {
                let result = client.subscription_status(&wallet).await;
                (wallet, result)
            });
        }

        let mut out = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (wallet, result) = joined
                .map_err(|e| AppError::Network(format!("status task failed: {e}")))?;
            let entry = result.unwrap_or_else(|e| {
                warn!(%wallet, error = %e, "wallet status unavailable");
                json!({ "error": e.to_string(), "isActive": false })
            });
            out.insert(wallet, entry);
        }
        Ok(out)
    }

    /// Hand a confirmed transfer to the backend for processing.
    ///
    /// The record and its memo are validated locally first, so a malformed
    /// submission never reaches the network.
    pub async fn submit_payment(&self, record: &PaymentRecord) -> Result<Value, AppError> {
        record.validate()?;
        let intent = self.codec.decode(&record.memo)?;
        info!(
            tx = %record.transaction_hash,
            kind = intent.kind().as_str(),
            amount = record.amount,
            "submitting payment"
        );
        let url = self.url(&self.endpoints.subscribe);
        self.send(self.http.post(&url).json(record), "POST", &url).await
    }

    pub async fn payment_history(
        &self,
        wallet: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Value, AppError> {
        let url = self.url(&self.endpoints.payments);
        let req = self.http.get(&url).query(&[
            ("wallet", wallet.to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ]);
        self.send(req, "GET", &url).await
    }

    pub async fn system_metrics(&self) -> Result<Value, AppError> {
        let url = self.url(&self.endpoints.metrics);
        self.send(self.http.get(&url), "GET", &url).await
    }

    pub async fn system_health(&self) -> Result<Value, AppError> {
        let url = self.url(&self.endpoints.health);
        self.send(self.http.get(&url), "GET", &url).await
    }

    pub async fn transaction_status(&self, transaction_id: &str) -> Result<TransactionStatus, AppError> {
        if transaction_id.is_empty() {
            return Err(AppError::format("transaction id is required"));
        }
        let url = self.url(&format!("{}/{transaction_id}", self.endpoints.transaction));
        self.send(self.http.get(&url), "GET", &url).await
    }

    /// Poll until the backend reports `transaction_id` as processed.
    ///
    /// Fails with [`AppError::Timeout`] once the configured attempt budget is
    /// spent and with [`AppError::Cancelled`] if `cancel` fires.
    pub async fn poll_payment_confirmation(
        &self,
        transaction_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TransactionStatus, AppError> {
        self.poll_payment_confirmation_with(transaction_id, self.poll_policy, cancel).await
    }

    pub async fn poll_payment_confirmation_with(
        &self,
        transaction_id: &str,
        policy: PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<TransactionStatus, AppError> {
        info!(tx = transaction_id, max_attempts = policy.max_attempts, "waiting for payment confirmation");
        poll_until(policy, cancel, |_| async move {
            let status = self.transaction_status(transaction_id).await?;
            Ok(status.processed.then_some(status))
        })
        .await
    }

    /// Send `req`, tag it with a request id, and decode a JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        method: &str,
        url: &str,
    ) -> Result<T, AppError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(%request_id, method, url, "api request");

        let response = req
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .map_err(|e| {
                error!(%request_id, url, error = %e, timeout = e.is_timeout(), "api request failed (transport)");
                AppError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            warn!(%request_id, url, %status, "api request returned HTTP error");
            let reason = status.canonical_reason().unwrap_or("");
            return Err(AppError::Network(format!(
                "HTTP {} {reason}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!(%request_id, url, error = %e, "failed to decode api response");
            AppError::Network(format!("failed to parse response body: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client() -> SubscriptionClient {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:9/".into();
        SubscriptionClient::new(&config.api, &config.polling, MemoCodec::default()).unwrap()
    }

    #[test]
    fn urls_join_base_and_endpoint() {
        let c = client();
        assert_eq!(c.url("/subscription/metrics"), "http://127.0.0.1:9/subscription/metrics");
    }

    #[test]
    fn poll_policy_from_config() {
        let p = client().poll_policy();
        assert_eq!(p.max_attempts, 20);
        assert_eq!(p.interval, Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn empty_wallet_rejected_locally() {
        let err = client().subscription_status("").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat(_)));
        let err = client().wallet_statuses(&[]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn path_like_wallet_rejected_locally() {
        for wallet in ["../metrics", "aaa.gm/../x", "AAA.gm"] {
            let err = client().subscription_status(wallet).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidFormat(_)), "{wallet}: {err}");
        }
    }

    #[tokio::test]
    async fn bad_memo_rejected_before_network() {
        let record = PaymentRecord::new("abc", "aaa.gm", "payment.gm", 8.0, "N-1-Q:aaa.gm", None);
        let err = client().submit_payment(&record).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat(_)));
    }

    #[test]
    fn transaction_status_keeps_extra_fields() {
        let s: TransactionStatus =
            serde_json::from_value(json!({ "processed": true, "tier": "premium" })).unwrap();
        assert!(s.processed);
        assert_eq!(s.details["tier"], "premium");

        let pending: TransactionStatus = serde_json::from_value(json!({})).unwrap();
        assert!(!pending.processed);
    }
}
