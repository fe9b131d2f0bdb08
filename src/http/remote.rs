//! HTTP-backed remote operation.
//!
//! Maps the degrading endpoint's wire contract back onto [`Outcome`]:
//! 2xx with a JSON body is a success, 423 is `Locked`, anything else
//! (other statuses, transport errors, bad bodies) is an `Error`.

use futures_util::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

use crate::resilience::{Outcome, RemoteOperation};

/// GETs a fixed URL on every invocation.
#[derive(Debug, Clone)]
pub struct HttpOperation {
    client: Client,
    url: Url,
}

impl HttpOperation {
    pub fn new(url: Url, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl RemoteOperation<Value> for HttpOperation {
    fn invoke(&self) -> BoxFuture<'static, Outcome<Value>> {
        let client = self.client.clone();
        let url = self.url.clone();
        Box::pin(fetch(client, url))
    }
}

async fn fetch(client: Client, url: Url) -> Outcome<Value> {
    let started = Instant::now();
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Remote request failed");
            return Outcome::Error(e.to_string());
        }
    };

    let status = response.status();
    if status == StatusCode::LOCKED {
        return Outcome::Locked;
    }
    if !status.is_success() {
        return Outcome::Error(format!("unexpected status {status}"));
    }

    match response.json::<Value>().await {
        Ok(body) => Outcome::Success {
            observed_delay_ms: observed_delay_ms(&body, started.elapsed()),
            payload: body,
        },
        Err(e) => Outcome::Error(format!("invalid response body: {e}")),
    }
}

/// The delay the remote reports having waited, else the round-trip time.
///
/// `delay` in the body is the endpoint's next delay, not the one served.
fn observed_delay_ms(body: &Value, round_trip: Duration) -> u64 {
    body.get("observed_delay_ms")
        .and_then(Value::as_u64)
        .unwrap_or(round_trip.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_observed_delay_comes_from_body() {
        let body = json!({ "delay": 80, "observed_delay_ms": 40 });
        assert_eq!(observed_delay_ms(&body, Duration::from_millis(45)), 40);
    }

    #[test]
    fn test_observed_delay_falls_back_to_round_trip() {
        let body = json!({ "delay": 80 });
        assert_eq!(observed_delay_ms(&body, Duration::from_millis(45)), 45);

        let body = json!({ "observed_delay_ms": "soon" });
        assert_eq!(observed_delay_ms(&body, Duration::from_millis(7)), 7);
    }
}
