//! 短信通道

use std::sync::Arc;

use courier_errors::AppResult;
use courier_ports::{Message, OutgoingSms, SmsTransport};
use tracing::{debug, error};

use crate::template::{SmsTemplate, TemplateEngine};

pub struct SmsDispatcher {
    transport: Arc<dyn SmsTransport>,
    templates: Arc<TemplateEngine>,
    from: String,
}

impl SmsDispatcher {
    pub fn new(
        transport: Arc<dyn SmsTransport>,
        templates: Arc<TemplateEngine>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            templates,
            from: from.into(),
        }
    }

    pub fn host(&self) -> &str {
        self.transport.host()
    }

    /// 投递短信
    ///
    /// 短信没有备选正文，模板还原或渲染失败即视为投递失败。
    pub async fn dispatch(&self, message: &Message) -> AppResult<()> {
        let body = SmsTemplate::from_message(message)
            .and_then(|template| template.body(&self.templates))
            .map_err(|e| {
                error!(
                    message_id = %message.id,
                    template_type = %message.template_type,
                    error = %e,
                    "Unable to render SMS body from template"
                );
                e
            })?;

        let sms = OutgoingSms {
            to: message.recipient.clone(),
            from: self.from.clone(),
            body,
        };

        if let Err(e) = self.transport.send(&sms).await {
            error!(
                message_id = %message.id,
                sms_server = %self.transport.host(),
                error = %e,
                "Unable to send SMS"
            );
            return Err(e);
        }

        debug!(message_id = %message.id, "SMS delivered to gateway");
        Ok(())
    }
}
