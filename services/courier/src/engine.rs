//! Courier 引擎
//!
//! 负责消息的整个生命周期：
//! 1. 渲染模板并把消息以 `Queued` 状态持久化
//! 2. 在后台任务中循环领取批次并逐条投递
//! 3. 批次中途失败时把失败消息及其后的消息退回队列

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_adapter_email::SmtpEmailTransport;
use courier_adapter_sms::HttpSmsTransport;
use courier_common::{MessageId, RetryConfig, RetryError, with_retry};
use courier_config::CourierConfig;
use courier_errors::{AppError, AppResult};
use courier_ports::{Message, MessageStatus, MessageStore, MessageType};
use courier_telemetry::{DISPATCH_FAILURES_TOTAL, MESSAGES_QUEUED_TOTAL, MESSAGES_SENT_TOTAL};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::channel::{EmailDispatcher, EmailSender, SmsDispatcher};
use crate::template::{EmailTemplate, SmsTemplate, TemplateEngine};

/// 消息入队接口
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn queue_email(&self, template: &EmailTemplate) -> AppResult<MessageId>;

    async fn queue_sms(&self, template: &SmsTemplate) -> AppResult<MessageId>;
}

/// 调度循环配置
#[derive(Debug, Clone)]
pub struct CourierOptions {
    /// 每批领取的消息数量
    pub batch_size: usize,
    /// 一轮调度成功后的等待时间
    pub idle_interval: Duration,
    /// 调度失败时的退避策略
    pub backoff: RetryConfig,
}

impl Default for CourierOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            idle_interval: Duration::from_secs(1),
            backoff: RetryConfig::default(),
        }
    }
}

impl CourierOptions {
    pub fn from_config(config: &CourierConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            idle_interval: config.idle_interval(),
            backoff: config.backoff.to_retry_config(),
        }
    }
}

pub struct Courier {
    store: Arc<dyn MessageStore>,
    email: EmailDispatcher,
    sms: SmsDispatcher,
    templates: Arc<TemplateEngine>,
    options: CourierOptions,
}

impl Courier {
    pub fn new(
        store: Arc<dyn MessageStore>,
        email: EmailDispatcher,
        sms: SmsDispatcher,
        templates: Arc<TemplateEngine>,
        options: CourierOptions,
    ) -> Self {
        Self {
            store,
            email,
            sms,
            templates,
            options,
        }
    }

    /// 按配置装配 SMTP / HTTP 通道与模板引擎
    pub fn from_config(config: &CourierConfig, store: Arc<dyn MessageStore>) -> AppResult<Self> {
        let templates = Arc::new(match &config.template_override_path {
            Some(dir) => TemplateEngine::with_overrides(dir)?,
            None => TemplateEngine::new()?,
        });

        let email = EmailDispatcher::new(
            Arc::new(SmtpEmailTransport::new(config.smtp.connection_uri())?),
            templates.clone(),
            EmailSender {
                from_address: config.smtp.from_address.clone(),
                from_name: config.smtp.from_name.clone(),
                headers: config.smtp.headers.clone(),
            },
        );
        let sms = SmsDispatcher::new(
            Arc::new(HttpSmsTransport::new(config.sms.host.clone())?),
            templates.clone(),
            config.sms.from.clone(),
        );

        Ok(Self::new(
            store,
            email,
            sms,
            templates,
            CourierOptions::from_config(config),
        ))
    }

    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// 运行调度循环，直到收到取消信号或循环报告致命错误
    ///
    /// 取消总是返回 `Ok(())`；退避用尽时返回最后一次调度错误。
    pub async fn work(self: Arc<Self>, shutdown: CancellationToken) -> AppResult<()> {
        let (error_tx, error_rx) = oneshot::channel();

        let worker = self.clone();
        let loop_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            worker.watch_messages(loop_shutdown, error_tx).await;
        });

        info!(batch_size = self.options.batch_size, "Courier worker started");

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Courier worker received shutdown signal");
                let _ = handle.await;
                info!("Courier worker stopped");
                Ok(())
            }
            received = error_rx => match received {
                Ok(err) => {
                    error!(error = %err, "Courier worker stopped with error");
                    Err(err)
                }
                Err(_) => Err(AppError::internal("courier dispatch loop exited without reporting")),
            },
        }
    }

    async fn watch_messages(
        self: Arc<Self>,
        shutdown: CancellationToken,
        error_tx: oneshot::Sender<AppError>,
    ) {
        loop {
            let dispatched = with_retry(
                &self.options.backoff,
                "courier.dispatch_queue",
                &shutdown,
                || self.dispatch_queue(),
            )
            .await;

            match dispatched {
                Ok(()) => {}
                Err(RetryError::Cancelled) => return,
                Err(RetryError::Exhausted {
                    attempts,
                    last_error,
                }) => {
                    error!(attempts, error = %last_error, "Courier dispatch loop gave up");
                    let _ = error_tx.send(last_error);
                    return;
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(self.options.idle_interval) => {}
            }
        }
    }

    /// 调度一个批次
    ///
    /// 任一消息失败时，从该消息起（含）到批次末尾的消息都会被退回 `Queued`，
    /// 之前已经 `Sent` 的消息保持不变，然后返回原始错误。
    pub async fn dispatch_queue(&self) -> AppResult<()> {
        if self.email.host().is_empty() {
            return Err(AppError::configuration_missing(
                "courier SMTP connection URI is not set",
            ));
        }
        if self.sms.host().is_empty() {
            return Err(AppError::configuration_missing("courier SMS host is not set"));
        }

        let messages = match self.store.next_messages(self.options.batch_size).await {
            Ok(messages) => messages,
            Err(AppError::EmptyQueue) => return Ok(()),
            Err(e) => return Err(e),
        };

        for (index, message) in messages.iter().enumerate() {
            if let Err(err) = self.dispatch_message(message).await {
                for pending in &messages[index..] {
                    if let Err(e) = self
                        .store
                        .set_message_status(&pending.id, MessageStatus::Queued)
                        .await
                    {
                        error!(
                            message_id = %pending.id,
                            error = %e,
                            "Unable to reset the failed message's status to \"queued\""
                        );
                    }
                }

                return Err(err);
            }
        }

        Ok(())
    }

    /// 投递单条消息并写入 `Sent`
    pub async fn dispatch_message(&self, message: &Message) -> AppResult<()> {
        let delivered = match message.message_type {
            MessageType::Email => self.email.dispatch(message).await,
            MessageType::Phone => self.sms.dispatch(message).await,
        };

        if let Err(e) = delivered {
            metrics::counter!(DISPATCH_FAILURES_TOTAL, "type" => message.message_type.as_str())
                .increment(1);
            return Err(e);
        }

        if let Err(e) = self
            .store
            .set_message_status(&message.id, MessageStatus::Sent)
            .await
        {
            error!(
                message_id = %message.id,
                error = %e,
                "Unable to set the message status to \"sent\""
            );
            metrics::counter!(DISPATCH_FAILURES_TOTAL, "type" => message.message_type.as_str())
                .increment(1);
            return Err(e);
        }

        metrics::counter!(MESSAGES_SENT_TOTAL, "type" => message.message_type.as_str())
            .increment(1);
        debug!(
            message_id = %message.id,
            message_type = %message.message_type,
            message_template_type = %message.template_type,
            message_subject = %message.subject,
            "Courier sent out message"
        );
        Ok(())
    }

    async fn enqueue(&self, message: Message) -> AppResult<MessageId> {
        self.store.add_message(&message).await?;

        metrics::counter!(MESSAGES_QUEUED_TOTAL, "type" => message.message_type.as_str())
            .increment(1);
        debug!(
            message_id = %message.id,
            message_type = %message.message_type,
            template_type = %message.template_type,
            "Message queued"
        );
        Ok(message.id)
    }
}

#[async_trait]
impl MessageQueue for Courier {
    async fn queue_email(&self, template: &EmailTemplate) -> AppResult<MessageId> {
        let subject = template.subject(&self.templates)?;
        let body = template.body_plaintext(&self.templates)?;
        let template_data = template.to_payload()?;

        let message = Message::new(
            MessageType::Email,
            template.recipient(),
            subject,
            body,
            template.template_type().as_str(),
            template_data,
        );

        self.enqueue(message).await
    }

    async fn queue_sms(&self, template: &SmsTemplate) -> AppResult<MessageId> {
        let body = template.body(&self.templates)?;
        let template_data = template.to_payload()?;

        let message = Message::new(
            MessageType::Phone,
            template.recipient_phone(),
            "",
            body,
            template.template_type().as_str(),
            template_data,
        );

        self.enqueue(message).await
    }
}
