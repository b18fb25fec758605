use crate::domain::model::{FetchOutcome, ProductId};
use crate::domain::ports::Extractor;
use rand::Rng;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Runs the per-identifier fetch state machine: request, classify the
/// response, back off and retry transient failures until the retry
/// budget is spent.
pub struct Fetcher<E> {
    client: Client,
    base_url: String,
    max_retry: u32,
    base_backoff: f64,
    extractor: Arc<E>,
}

/// Exponential backoff with jitter: `base^attempt * uniform(1.0, 2.0)`.
/// The rng handle must not live across an await, hence the free function.
pub fn backoff_delay(base: f64, attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(1.0..2.0);
    Duration::from_secs_f64(base.powi(attempt as i32) * jitter)
}

/// Short pacing delay before an identifier's first attempt, so workers do
/// not fire synchronized bursts at the API.
pub fn pacing_delay() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(10..50))
}

fn transport_error_kind(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else if error.is_decode() {
        "decode"
    } else {
        "request"
    }
}

fn retry_after_seconds(response: &reqwest::Response) -> Option<f64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
        // Negative or non-finite values would panic in Duration
        // construction; treat them as absent.
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

impl<E: Extractor> Fetcher<E> {
    pub fn new(
        client: Client,
        base_url: String,
        max_retry: u32,
        base_backoff: f64,
        extractor: Arc<E>,
    ) -> Self {
        Self {
            client,
            base_url,
            max_retry,
            base_backoff,
            extractor,
        }
    }

    fn product_url(&self, id: ProductId) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), id)
    }

    pub async fn fetch(&self, id: ProductId) -> FetchOutcome {
        let url = self.product_url(id);
        let mut last_error = "Unknown";

        for attempt in 1..=self.max_retry {
            let response = match self.client.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    last_error = transport_error_kind(&e);
                    tracing::debug!(
                        "id {}: attempt {}/{} failed ({})",
                        id,
                        attempt,
                        self.max_retry,
                        last_error
                    );
                    tokio::time::sleep(backoff_delay(self.base_backoff, attempt)).await;
                    continue;
                }
            };

            match response.status() {
                StatusCode::OK => match response.json::<serde_json::Value>().await {
                    Ok(payload) => match self.extractor.extract(&payload) {
                        Some(product) => return FetchOutcome::Success(product),
                        None => {
                            last_error = "decode";
                            tokio::time::sleep(backoff_delay(self.base_backoff, attempt)).await;
                        }
                    },
                    Err(e) => {
                        last_error = transport_error_kind(&e);
                        tokio::time::sleep(backoff_delay(self.base_backoff, attempt)).await;
                    }
                },
                StatusCode::NOT_FOUND => return FetchOutcome::NotFound,
                StatusCode::TOO_MANY_REQUESTS => {
                    last_error = "HTTP 429";
                    // Honor a server-provided delay, fractional seconds
                    // allowed; otherwise fall back to our own backoff.
                    let delay = match retry_after_seconds(&response) {
                        Some(seconds) => Duration::from_secs_f64(seconds),
                        None => backoff_delay(self.base_backoff, attempt),
                    };
                    tracing::debug!("id {}: rate limited, waiting {:?}", id, delay);
                    tokio::time::sleep(delay).await;
                }
                status => {
                    last_error = status_error_kind(status);
                    tracing::debug!(
                        "id {}: attempt {}/{} got {}",
                        id,
                        attempt,
                        self.max_retry,
                        status
                    );
                    tokio::time::sleep(backoff_delay(self.base_backoff, attempt)).await;
                }
            }
        }

        FetchOutcome::Failed(format!("FAIL ({})", last_error))
    }
}

fn status_error_kind(status: StatusCode) -> &'static str {
    match status.as_u16() {
        500 => "HTTP 500",
        502 => "HTTP 502",
        503 => "HTTP 503",
        504 => "HTTP 504",
        _ => "HTTP error",
    }
}
