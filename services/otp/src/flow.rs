//! 认证流程契约

use courier_common::FlowId;
use courier_errors::AppResult;

/// 进行中的认证流程
///
/// `valid` 在流程过期或不可用时返回 `AppError::FlowInvalid`。
#[cfg_attr(test, mockall::automock)]
pub trait Flow: Send + Sync {
    fn id(&self) -> FlowId;

    fn valid(&self) -> AppResult<()>;
}
