//! Email 适配器
//!
//! 基于 SMTP 连接串提供邮件发送功能，支持：
//! - `smtp://` 强制 STARTTLS（可通过 `disable_starttls=true` 关闭）
//! - `smtps://` 隐式 TLS
//! - `skip_ssl_verify=true` 跳过证书校验
//! - 纯文本邮件与 HTML 备选正文

mod client;
mod connection;

pub use client::SmtpEmailTransport;
pub use connection::{SmtpConnection, SmtpSecurity};
