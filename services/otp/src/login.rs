//! 短信登录步骤
//!
//! 一次提交要么请求验证码，要么携带验证码完成校验。

use std::sync::Arc;

use courier_errors::AppResult;
use tracing::info;

use crate::flow::Flow;
use crate::service::AuthenticationService;

/// 发送验证码后返回给用户的提示
pub const CODE_SENT_MESSAGE: &str = "access code has been sent";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmsLoginSubmission {
    pub phone: String,
    pub code: Option<String>,
}

/// 没有验证码或验证码为空白时视为请求发送
pub(crate) fn submitted_code(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|code| !code.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// 验证码已发送，等待用户再次提交
    CodeSent,
    /// 验证码校验通过
    Verified { phone: String },
}

impl LoginOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::CodeSent => CODE_SENT_MESSAGE,
            Self::Verified { .. } => "login code verified",
        }
    }
}

pub struct SmsLogin {
    service: Arc<dyn AuthenticationService>,
}

impl SmsLogin {
    pub fn new(service: Arc<dyn AuthenticationService>) -> Self {
        Self { service }
    }

    pub async fn login(
        &self,
        flow: &dyn Flow,
        submission: &SmsLoginSubmission,
    ) -> AppResult<LoginOutcome> {
        match submitted_code(submission.code.as_deref()) {
            None => {
                self.service.send_code(flow, &submission.phone).await?;
                info!(flow_id = %flow.id(), "SMS login code requested");
                Ok(LoginOutcome::CodeSent)
            }
            Some(code) => {
                self.service.verify_code(flow, code).await?;
                info!(flow_id = %flow.id(), "SMS login code accepted");
                Ok(LoginOutcome::Verified {
                    phone: submission.phone.clone(),
                })
            }
        }
    }
}
