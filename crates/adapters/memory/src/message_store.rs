//! 内存消息队列

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use courier_common::MessageId;
use courier_errors::{AppError, AppResult};
use courier_ports::{Message, MessageStatus, MessageStore};
use tokio::sync::RwLock;

#[derive(Default)]
struct Queue {
    /// 按入队顺序保存
    messages: Vec<Message>,
    /// 已被领取、尚未写回状态的消息
    claimed: HashSet<MessageId>,
}

/// 内存消息队列
///
/// 领取与状态写入在同一把锁内完成，因此并发的 `next_messages`
/// 不会返回同一条消息。写入 `Sent` 的消息立即从队列中移除，
/// 队列只保留尚未送达的消息。
#[derive(Clone, Default)]
pub struct InMemoryMessageStore {
    queue: Arc<RwLock<Queue>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按入队顺序返回尚未送达的消息
    pub async fn messages(&self) -> Vec<Message> {
        self.queue.read().await.messages.clone()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn add_message(&self, message: &Message) -> AppResult<()> {
        let mut queue = self.queue.write().await;
        if queue.messages.iter().any(|m| m.id == message.id) {
            return Err(AppError::store(format!("message {} already exists", message.id)));
        }
        queue.messages.push(message.clone());
        Ok(())
    }

    async fn next_messages(&self, limit: usize) -> AppResult<Vec<Message>> {
        let mut queue = self.queue.write().await;

        let batch: Vec<Message> = queue
            .messages
            .iter()
            .filter(|m| m.status == MessageStatus::Queued && !queue.claimed.contains(&m.id))
            .take(limit)
            .cloned()
            .collect();

        if batch.is_empty() {
            return Err(AppError::EmptyQueue);
        }

        for message in &batch {
            queue.claimed.insert(message.id);
        }

        Ok(batch)
    }

    async fn set_message_status(&self, id: &MessageId, status: MessageStatus) -> AppResult<()> {
        let mut queue = self.queue.write().await;

        let index = queue
            .messages
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| AppError::store(format!("message {} not found", id)))?;

        match status {
            MessageStatus::Sent => {
                queue.messages.remove(index);
            }
            MessageStatus::Queued => {
                let message = &mut queue.messages[index];
                message.status = status;
                message.updated_at = Utc::now();
            }
        }

        queue.claimed.remove(id);
        tracing::trace!(message_id = %id, status = %status, "Message status updated");
        Ok(())
    }
}
