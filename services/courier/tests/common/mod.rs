//! 测试辅助：可记录、可注入故障的通道与存储

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use courier::channel::{EmailDispatcher, EmailSender, SmsDispatcher};
use courier::template::{EmailTemplate, SmsTemplate, TemplateEngine, TestEmailStubModel, TestSmsStubModel};
use courier::{Courier, CourierOptions};
use courier_adapter_memory::InMemoryMessageStore;
use courier_common::{MessageId, RetryConfig};
use courier_errors::{AppError, AppResult};
use courier_ports::{
    EmailTransport, Message, MessageStatus, MessageStore, OutgoingEmail, OutgoingSms, SmsTransport,
};

/// 记录发送内容的邮件通道
pub struct MockEmailTransport {
    host: String,
    pub sent: Mutex<Vec<OutgoingEmail>>,
    failing_recipients: Mutex<HashSet<String>>,
}

impl MockEmailTransport {
    pub fn new(host: &str) -> Arc<Self> {
        Arc::new(Self {
            host: host.to_string(),
            sent: Mutex::new(Vec::new()),
            failing_recipients: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing_recipients.lock().unwrap().insert(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for MockEmailTransport {
    fn host(&self) -> &str {
        &self.host
    }

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        if self.failing_recipients.lock().unwrap().contains(&email.to) {
            return Err(AppError::transport_failure("550 mailbox unavailable"));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// 记录发送内容的短信通道
pub struct MockSmsTransport {
    host: String,
    pub sent: Mutex<Vec<OutgoingSms>>,
    failing_recipients: Mutex<HashSet<String>>,
}

impl MockSmsTransport {
    pub fn new(host: &str) -> Arc<Self> {
        Arc::new(Self {
            host: host.to_string(),
            sent: Mutex::new(Vec::new()),
            failing_recipients: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing_recipients.lock().unwrap().insert(recipient.to_string());
    }

    pub fn recover(&self) {
        self.failing_recipients.lock().unwrap().clear();
    }

    pub fn sent(&self) -> Vec<OutgoingSms> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsTransport for MockSmsTransport {
    fn host(&self) -> &str {
        &self.host
    }

    async fn send(&self, sms: &OutgoingSms) -> AppResult<()> {
        if self.failing_recipients.lock().unwrap().contains(&sms.to) {
            return Err(AppError::transport_failure("SMS gateway replied with 500 Internal Server Error"));
        }
        self.sent.lock().unwrap().push(sms.clone());
        Ok(())
    }
}

/// 包装内存存储，统计调用次数、记录状态写入并注入写入失败
///
/// 内存存储会移除已送达的消息，这里按入队顺序保留每条消息的最新状态。
#[derive(Default)]
pub struct FaultyStore {
    pub inner: InMemoryMessageStore,
    pub next_messages_calls: AtomicUsize,
    history: Mutex<Vec<(MessageId, MessageStatus)>>,
    failing_sent_writes: Mutex<HashSet<MessageId>>,
    failing_requeue_writes: Mutex<HashSet<MessageId>>,
}

impl FaultyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_sent_write_for(&self, id: MessageId) {
        self.failing_sent_writes.lock().unwrap().insert(id);
    }

    pub fn fail_requeue_write_for(&self, id: MessageId) {
        self.failing_requeue_writes.lock().unwrap().insert(id);
    }

    pub fn next_messages_calls(&self) -> usize {
        self.next_messages_calls.load(Ordering::SeqCst)
    }

    pub fn statuses(&self) -> Vec<MessageStatus> {
        self.history.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }

    pub fn status_of(&self, id: &MessageId) -> Option<MessageStatus> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .find(|(m, _)| m == id)
            .map(|(_, s)| *s)
    }
}

#[async_trait]
impl MessageStore for FaultyStore {
    async fn add_message(&self, message: &Message) -> AppResult<()> {
        self.inner.add_message(message).await?;
        self.history.lock().unwrap().push((message.id, message.status));
        Ok(())
    }

    async fn next_messages(&self, limit: usize) -> AppResult<Vec<Message>> {
        self.next_messages_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.next_messages(limit).await
    }

    async fn set_message_status(&self, id: &MessageId, status: MessageStatus) -> AppResult<()> {
        let failing = match status {
            MessageStatus::Sent => self.failing_sent_writes.lock().unwrap().contains(id),
            MessageStatus::Queued => self.failing_requeue_writes.lock().unwrap().contains(id),
        };
        if failing {
            return Err(AppError::store("connection reset by peer"));
        }
        self.inner.set_message_status(id, status).await?;
        if let Some(entry) = self.history.lock().unwrap().iter_mut().find(|(m, _)| m == id) {
            entry.1 = status;
        }
        Ok(())
    }
}

pub struct TestCourier {
    pub courier: Arc<Courier>,
    pub store: Arc<FaultyStore>,
    pub email: Arc<MockEmailTransport>,
    pub sms: Arc<MockSmsTransport>,
}

pub fn fast_options() -> CourierOptions {
    CourierOptions {
        batch_size: 10,
        idle_interval: Duration::from_millis(10),
        backoff: RetryConfig::new(3, Duration::from_millis(5), Duration::from_millis(20)),
    }
}

pub fn build_courier(smtp_host: &str, sms_host: &str, options: CourierOptions) -> TestCourier {
    let templates = Arc::new(TemplateEngine::new().unwrap());
    build_courier_with_templates(smtp_host, sms_host, options, templates)
}

pub fn build_courier_with_templates(
    smtp_host: &str,
    sms_host: &str,
    options: CourierOptions,
    templates: Arc<TemplateEngine>,
) -> TestCourier {
    let store = FaultyStore::new();
    let email = MockEmailTransport::new(smtp_host);
    let sms = MockSmsTransport::new(sms_host);

    let sender = EmailSender {
        from_address: "no-reply@example.com".to_string(),
        from_name: Some("Courier".to_string()),
        headers: [("X-Courier".to_string(), "test".to_string())].into_iter().collect(),
    };

    let courier = Courier::new(
        store.clone(),
        EmailDispatcher::new(email.clone(), templates.clone(), sender),
        SmsDispatcher::new(sms.clone(), templates.clone(), "+15550000000"),
        templates,
        options,
    );

    TestCourier {
        courier: Arc::new(courier),
        store,
        email,
        sms,
    }
}

pub fn configured() -> TestCourier {
    build_courier("smtp.example.com", "https://sms.example.com/send", fast_options())
}

pub fn stub_sms(phone: &str, body: &str) -> SmsTemplate {
    SmsTemplate::TestStub(TestSmsStubModel {
        phone: phone.to_string(),
        body: body.to_string(),
    })
}

pub fn stub_email(to: &str, subject: &str, body: &str) -> EmailTemplate {
    EmailTemplate::TestStub(TestEmailStubModel {
        to: to.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
    })
}
