use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::domain::{
    repositories::payment_events::PaymentEventPublisher,
    value_objects::payment_events::PaymentSuccessEvent,
};

/// Publishes to the event bus through its HTTP produce endpoint
/// (`POST {topic, key, value}`).
pub struct HttpEventBusPublisher {
    http: reqwest::Client,
    publish_url: Url,
    topic: String,
}

#[derive(Debug, Serialize)]
struct ProduceRecord<'a> {
    topic: &'a str,
    key: String,
    value: &'a PaymentSuccessEvent,
}

impl HttpEventBusPublisher {
    pub fn new(publish_url: Url, topic: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build event bus http client")?;

        Ok(Self {
            http,
            publish_url,
            topic,
        })
    }
}

#[async_trait]
impl PaymentEventPublisher for HttpEventBusPublisher {
    async fn publish_payment_success(&self, order_id: i64) -> Result<()> {
        let event = PaymentSuccessEvent::paid(order_id);
        let record = ProduceRecord {
            topic: &self.topic,
            key: event.key(),
            value: &event,
        };

        let response = self
            .http
            .post(self.publish_url.clone())
            .json(&record)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    anyhow!("event bus publish timed out for order {order_id}")
                } else {
                    anyhow!("event bus publish failed for order {order_id}: {err}")
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "event bus rejected payment success for order {order_id} (status {status}): {body}"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn publisher(server: &MockServer) -> HttpEventBusPublisher {
        HttpEventBusPublisher::new(
            Url::parse(&server.url("/topics/produce")).unwrap(),
            "payment.success".to_string(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn publishes_keyed_record_for_the_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/topics/produce").json_body(json!({
                    "topic": "payment.success",
                    "key": "order-42",
                    "value": { "order_id": 42, "status": "paid" }
                }));
                then.status(202);
            })
            .await;

        publisher(&server).publish_payment_success(42).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_publish_is_an_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/topics/produce");
                then.status(503).body("broker unavailable");
            })
            .await;

        let err = publisher(&server)
            .publish_payment_success(42)
            .await
            .unwrap_err()
            .to_string();

        mock.assert_async().await;
        assert!(err.contains("order 42"), "{err}");
        assert!(err.contains("503"), "{err}");
        assert!(err.contains("broker unavailable"), "{err}");
    }
}
