//! 一次性验证码模型与 CodeStore trait 定义

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_common::{CodeId, FlowId};
use courier_errors::AppResult;
use serde::{Deserialize, Serialize};

/// 已签发的验证码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub id: CodeId,
    pub flow_id: FlowId,
    pub phone: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Code {
    pub fn new(
        flow_id: FlowId,
        phone: impl Into<String>,
        code: impl Into<String>,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CodeId::new(),
            flow_id,
            phone: phone.into(),
            code: code.into(),
            expires_at,
            created_at,
        }
    }

    /// `expires_at` 严格晚于 `at` 时视为有效
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.expires_at > at
    }
}

/// 验证码存储
///
/// 同一 flow 在任意时刻至多存在一个有效验证码。实现方必须让
/// "检查是否存在有效验证码" 与 "插入新验证码" 原子化（唯一约束、事务或行锁），
/// 并发插入时后到者返回 `AppError::ActiveCodeExists`。
#[async_trait]
pub trait CodeStore: Send + Sync {
    async fn create_code(&self, code: &Code) -> AppResult<()>;

    /// 查找 `expires_at > not_expired_after` 的验证码
    async fn find_active_code(
        &self,
        flow_id: &FlowId,
        not_expired_after: DateTime<Utc>,
    ) -> AppResult<Option<Code>>;
}
