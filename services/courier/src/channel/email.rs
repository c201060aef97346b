//! 邮件通道

use std::collections::BTreeMap;
use std::sync::Arc;

use courier_errors::AppResult;
use courier_ports::{EmailTransport, Message, OutgoingEmail};
use tracing::{debug, error};

use crate::template::{EmailTemplate, TemplateEngine};

/// 发件人身份与固定邮件头
#[derive(Debug, Clone, Default)]
pub struct EmailSender {
    pub from_address: String,
    pub from_name: Option<String>,
    pub headers: BTreeMap<String, String>,
}

pub struct EmailDispatcher {
    transport: Arc<dyn EmailTransport>,
    templates: Arc<TemplateEngine>,
    sender: EmailSender,
}

impl EmailDispatcher {
    pub fn new(
        transport: Arc<dyn EmailTransport>,
        templates: Arc<TemplateEngine>,
        sender: EmailSender,
    ) -> Self {
        Self {
            transport,
            templates,
            sender,
        }
    }

    pub fn host(&self) -> &str {
        self.transport.host()
    }

    /// 投递邮件
    ///
    /// 纯文本正文与主题取自入队时的快照；HTML 备选正文从模板负载重新渲染，
    /// 渲染失败只记录日志并退回纯文本。
    pub async fn dispatch(&self, message: &Message) -> AppResult<()> {
        let html_body = match EmailTemplate::from_message(message)
            .and_then(|template| template.body_html(&self.templates))
        {
            Ok(html) => Some(html),
            Err(e) => {
                error!(
                    message_id = %message.id,
                    template_type = %message.template_type,
                    error = %e,
                    "Unable to render HTML body from email template, sending plaintext only"
                );
                None
            }
        };

        let email = OutgoingEmail {
            from_address: self.sender.from_address.clone(),
            from_name: self.sender.from_name.clone(),
            to: message.recipient.clone(),
            subject: message.subject.clone(),
            headers: self.sender.headers.clone(),
            text_body: message.body.clone(),
            html_body,
        };

        if let Err(e) = self.transport.send(&email).await {
            error!(
                message_id = %message.id,
                smtp_server = %self.transport.host(),
                error = %e,
                "Unable to send email using SMTP connection"
            );
            return Err(e);
        }

        debug!(
            message_id = %message.id,
            smtp_server = %self.transport.host(),
            "Email delivered to SMTP server"
        );
        Ok(())
    }
}
