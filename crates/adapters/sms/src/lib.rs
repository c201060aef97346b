//! SMS 适配器
//!
//! 以表单 POST（`To` / `From` / `Body`）的方式把短信提交给 HTTP 网关。

use std::time::Duration;

use async_trait::async_trait;
use courier_errors::{AppError, AppResult};
use courier_ports::{OutgoingSms, SmsTransport};
use reqwest::{Client, StatusCode};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP 短信网关通道
pub struct HttpSmsTransport {
    host: String,
    client: Client,
}

impl HttpSmsTransport {
    /// `host` 为完整的网关地址，空字符串表示未配置
    pub fn new(host: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(host, client))
    }

    pub fn with_client(host: impl Into<String>, client: Client) -> Self {
        Self {
            host: host.into(),
            client,
        }
    }
}

#[async_trait]
impl SmsTransport for HttpSmsTransport {
    fn host(&self) -> &str {
        &self.host
    }

    async fn send(&self, sms: &OutgoingSms) -> AppResult<()> {
        if self.host.is_empty() {
            return Err(AppError::configuration_missing("SMS host is not set"));
        }

        let response = self
            .client
            .post(&self.host)
            .form(&[
                ("To", sms.to.as_str()),
                ("From", sms.from.as_str()),
                ("Body", sms.body.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::transport_failure(format!("Failed to send SMS: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::transport_failure(format!(
                "SMS gateway replied with {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )));
        }

        debug!(sms_server = %self.host, "SMS accepted by gateway");
        Ok(())
    }
}
