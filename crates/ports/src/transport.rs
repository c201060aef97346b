//! 投递通道 trait 定义

use std::collections::BTreeMap;

use async_trait::async_trait;
use courier_errors::AppResult;

/// 待发送邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from_address: String,
    pub from_name: Option<String>,
    pub to: String,
    pub subject: String,
    pub headers: BTreeMap<String, String>,
    pub text_body: String,
    pub html_body: Option<String>,
}

/// 待发送短信
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingSms {
    pub to: String,
    pub from: String,
    pub body: String,
}

/// 邮件发送通道
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// SMTP 主机，空字符串表示未配置
    fn host(&self) -> &str;

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()>;
}

/// 短信发送通道
#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// 短信网关地址，空字符串表示未配置
    fn host(&self) -> &str;

    async fn send(&self, sms: &OutgoingSms) -> AppResult<()>;
}
