use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::error;
use url::Url;

use crate::domain::{
    repositories::payment_gateway::PaymentGateway,
    value_objects::invoices::{InvoiceDetail, InvoiceRequest},
};

const INVOICES_PATH: &str = "v2/invoices";

/// Minimal invoice client for the payment gateway's v2 invoices API, built on
/// reqwest. Authenticates with the secret key as the basic-auth user.
pub struct InvoiceGatewayClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl InvoiceGatewayClient {
    pub fn new(base_url: Url, api_key: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build payment gateway http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn invoices_url(&self) -> Result<Url> {
        self.base_url
            .join(INVOICES_PATH)
            .with_context(|| format!("invalid payment gateway base url: {}", self.base_url))
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "payment gateway request failed"
        );

        Err(anyhow!(
            "payment gateway request failed: {} (status {}): {}",
            context,
            status,
            body
        ))
    }
}

fn describe_transport_error(err: reqwest::Error, context: &str) -> anyhow::Error {
    if err.is_timeout() {
        return anyhow!("payment gateway request timed out: {context}");
    }
    if err.is_connect() {
        return anyhow!("payment gateway connection failed: {context}");
    }
    anyhow!("payment gateway request failed: {context}: {err}")
}

#[async_trait]
impl PaymentGateway for InvoiceGatewayClient {
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<InvoiceDetail> {
        let context = format!("create invoice {}", request.external_id);

        let resp = self
            .http
            .post(self.invoices_url()?)
            .basic_auth(&self.api_key, Some(""))
            .json(&request)
            .send()
            .await
            .map_err(|err| describe_transport_error(err, &context))?;

        let resp = Self::ensure_success(resp, &context).await?;
        let invoice = resp
            .json::<InvoiceDetail>()
            .await
            .with_context(|| format!("invalid gateway response: {context}"))?;

        Ok(invoice)
    }

    async fn check_invoice_status(&self, external_id: String) -> Result<String> {
        let context = format!("check invoice {external_id}");

        let resp = self
            .http
            .get(self.invoices_url()?)
            .basic_auth(&self.api_key, Some(""))
            .query(&[("external_id", external_id.as_str())])
            .send()
            .await
            .map_err(|err| describe_transport_error(err, &context))?;

        let resp = Self::ensure_success(resp, &context).await?;
        let invoices = resp
            .json::<Vec<InvoiceDetail>>()
            .await
            .with_context(|| format!("invalid gateway response: {context}"))?;

        invoices
            .into_iter()
            .next()
            .map(|invoice| invoice.status)
            .ok_or_else(|| anyhow!("payment gateway has no invoice for {external_id}"))
    }
}
