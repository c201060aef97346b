//! 内存验证码存储

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_common::FlowId;
use courier_errors::{AppError, AppResult};
use courier_ports::{Code, CodeStore};
use tokio::sync::RwLock;

/// 内存验证码存储
///
/// 插入时在写锁内检查同一 flow 是否仍有有效验证码（以新验证码的
/// `created_at` 为基准），有则返回 `ActiveCodeExists`。
#[derive(Clone, Default)]
pub struct InMemoryCodeStore {
    codes: Arc<RwLock<Vec<Code>>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回某个 flow 的全部验证码（用于测试）
    pub async fn codes_for(&self, flow_id: &FlowId) -> Vec<Code> {
        self.codes
            .read()
            .await
            .iter()
            .filter(|c| &c.flow_id == flow_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn create_code(&self, code: &Code) -> AppResult<()> {
        let mut codes = self.codes.write().await;

        let has_active = codes
            .iter()
            .any(|c| c.flow_id == code.flow_id && c.is_active_at(code.created_at));
        if has_active {
            return Err(AppError::ActiveCodeExists);
        }

        codes.push(code.clone());
        Ok(())
    }

    async fn find_active_code(
        &self,
        flow_id: &FlowId,
        not_expired_after: DateTime<Utc>,
    ) -> AppResult<Option<Code>> {
        let codes = self.codes.read().await;

        Ok(codes
            .iter()
            .filter(|c| &c.flow_id == flow_id && c.is_active_at(not_expired_after))
            .max_by_key(|c| c.created_at)
            .cloned())
    }
}
