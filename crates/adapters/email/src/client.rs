//! SMTP 邮件发送实现

use std::time::Duration;

use async_trait::async_trait;
use courier_errors::{AppError, AppResult};
use courier_ports::{EmailTransport, OutgoingEmail};
use lettre::message::header::{HeaderName, HeaderValue};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::connection::{SmtpConnection, SmtpSecurity};

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// SMTP 邮件通道
///
/// 连接串为空时通道处于未配置状态：`host()` 返回空字符串，
/// 由调度前置检查拒绝投递。
pub struct SmtpEmailTransport {
    host: String,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpEmailTransport {
    /// 从连接串创建
    pub fn new(connection_uri: &str) -> AppResult<Self> {
        if connection_uri.trim().is_empty() {
            return Ok(Self {
                host: String::new(),
                transport: None,
            });
        }

        let connection = SmtpConnection::parse(connection_uri)?;
        let transport = build_transport(&connection)?;

        debug!(
            smtp_server = %connection.host,
            smtp_port = connection.port,
            "SMTP transport configured"
        );

        Ok(Self {
            host: connection.host,
            transport: Some(transport),
        })
    }

    /// 构建邮件消息
    fn build_message(&self, email: &OutgoingEmail) -> AppResult<Message> {
        let from_address = email.from_address.parse().map_err(|e| {
            AppError::configuration_missing(format!("Invalid from address: {}", e))
        })?;
        let from = Mailbox::new(email.from_name.clone(), from_address);

        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AppError::transport_failure(format!("Invalid to address: {}", e)))?;

        let mut builder = Message::builder().from(from).to(to).subject(&email.subject);

        for (name, value) in &email.headers {
            let header_name = HeaderName::new_from_ascii(name.clone()).map_err(|e| {
                AppError::configuration_missing(format!("Invalid header name {}: {}", name, e))
            })?;
            builder = builder.raw_header(HeaderValue::new(header_name, value.clone()));
        }

        let message = match &email.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                html.clone(),
            )),
            None => builder.singlepart(SinglePart::plain(email.text_body.clone())),
        }
        .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))?;

        Ok(message)
    }
}

fn build_transport(connection: &SmtpConnection) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
    let tls_parameters = |skip_verify: bool| {
        TlsParameters::builder(connection.host.clone())
            .dangerous_accept_invalid_certs(skip_verify)
            .build()
            .map_err(|e| AppError::configuration_missing(format!("Invalid TLS parameters: {}", e)))
    };

    let tls = match connection.security {
        SmtpSecurity::StartTls { skip_verify } => Tls::Required(tls_parameters(skip_verify)?),
        SmtpSecurity::ImplicitTls { skip_verify } => Tls::Wrapper(tls_parameters(skip_verify)?),
        SmtpSecurity::None => Tls::None,
    };

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&connection.host)
        .port(connection.port)
        .tls(tls)
        .timeout(Some(SMTP_TIMEOUT));

    if let (Some(username), Some(password)) = (&connection.username, &connection.password) {
        builder = builder.credentials(Credentials::new(
            username.clone(),
            password.expose_secret().clone(),
        ));
    }

    Ok(builder.build())
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
    fn host(&self) -> &str {
        &self.host
    }

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| AppError::configuration_missing("SMTP connection URI is not set"))?;

        let message = self.build_message(email)?;

        transport.send(message).await.map_err(|e| {
            AppError::transport_failure(format!(
                "Failed to send email via SMTP server {}: {}",
                self.host, e
            ))
        })?;

        Ok(())
    }
}
