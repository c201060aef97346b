//! 消息模型与 MessageStore trait 定义

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_common::MessageId;
use courier_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 消息类型，决定由哪个投递通道处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Email,
    Phone,
}

impl MessageType {
    /// 持久化使用的数值编码
    pub fn code(&self) -> i16 {
        match self {
            Self::Email => 1,
            Self::Phone => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl TryFrom<i16> for MessageType {
    type Error = AppError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Email),
            2 => Ok(Self::Phone),
            other => Err(AppError::unsupported_message_type(other.to_string())),
        }
    }
}

impl FromStr for MessageType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            other => Err(AppError::unsupported_message_type(other)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 消息状态
///
/// 没有失败终态：投递失败的消息回到 `Queued` 等待重试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Queued,
    Sent,
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("queued"),
            Self::Sent => f.write_str("sent"),
        }
    }
}

/// 待投递消息
///
/// `subject` 和 `body` 在入队时由模板渲染一次，之后不再改写；
/// 投递时只会从 `template_data` 派生额外的表示（例如 HTML）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub message_type: MessageType,
    pub status: MessageStatus,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub template_type: String,
    pub template_data: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// 创建一条处于 `Queued` 状态的新消息
    pub fn new(
        message_type: MessageType,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        template_type: impl Into<String>,
        template_data: Vec<u8>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MessageId::new(),
            message_type,
            status: MessageStatus::Queued,
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            template_type: template_type.into(),
            template_data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 消息队列存储
///
/// 实现方需要保证：
/// - `next_messages` 按创建顺序（FIFO）返回 `Queued` 消息，
///   且被返回的消息在其状态再次写入之前不会被其他调用方重复领取；
/// - 队列为空时返回 `AppError::EmptyQueue`，而不是空列表；
/// - `set_message_status` 同时释放该消息的领取标记。
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// 持久化新消息
    async fn add_message(&self, message: &Message) -> AppResult<()>;

    /// 领取最多 `limit` 条待投递消息
    async fn next_messages(&self, limit: usize) -> AppResult<Vec<Message>>;

    /// 更新消息状态
    async fn set_message_status(&self, id: &MessageId, status: MessageStatus) -> AppResult<()>;
}
