//! Webhook delivery.
//!
//! Best-effort: one POST per outcome, bounded timeout, no retry. Delivery
//! failure is logged and reported as a boolean; it never affects job state.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use clipcast_models::{WebhookConfig, WebhookPayload};

/// Bound on the whole delivery request.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatches job-outcome notifications to subscriber endpoints.
#[derive(Clone)]
pub struct WebhookDispatcher {
    http: Client,
}

impl WebhookDispatcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(DELIVERY_TIMEOUT).build()?;
        Ok(Self { http })
    }

    /// Deliver `payload` if the subscriber is interested in its event.
    ///
    /// A filtered-out event is a silent no-op and counts as success.
    pub async fn send(&self, config: &WebhookConfig, payload: &WebhookPayload) -> bool {
        if !config.subscribes_to(&payload.event) {
            debug!(
                url = %config.url,
                event = %payload.event,
                "Webhook not subscribed to event, skipping"
            );
            return true;
        }

        self.deliver(config, payload).await
    }

    /// Deliver unconditionally, bypassing the event filter. Used by the
    /// test-webhook surface, whose sample event is never subscribed.
    pub async fn deliver(&self, config: &WebhookConfig, payload: &WebhookPayload) -> bool {
        let mut request = self
            .http
            .post(&config.url)
            .header("Content-Type", "application/json")
            .json(payload);

        if let Some(headers) = &config.headers {
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!(
                    url = %config.url,
                    event = %payload.event,
                    job_id = %payload.job_id,
                    "Webhook delivered"
                );
                metrics::counter!("clipcast_webhook_deliveries_total").increment(1);
                true
            }
            Ok(response) => {
                warn!(
                    url = %config.url,
                    status = %response.status(),
                    "Webhook rejected by endpoint"
                );
                metrics::counter!("clipcast_webhook_failures_total").increment(1);
                false
            }
            Err(e) => {
                warn!(url = %config.url, "Failed to send webhook: {}", e);
                metrics::counter!("clipcast_webhook_failures_total").increment(1);
                false
            }
        }
    }
}
