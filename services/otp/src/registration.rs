//! 短信注册步骤
//!
//! 与登录相同的发送或校验逻辑，手机号取自待注册身份的唯一短信标识。

use std::sync::Arc;

use courier_errors::{AppError, AppResult};
use tracing::info;

use crate::flow::Flow;
use crate::login::submitted_code;
use crate::service::AuthenticationService;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmsRegistrationSubmission {
    /// 身份上的短信凭证标识
    pub identifiers: Vec<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    CodeSent,
    Verified,
}

pub struct SmsRegistration {
    service: Arc<dyn AuthenticationService>,
}

impl SmsRegistration {
    pub fn new(service: Arc<dyn AuthenticationService>) -> Self {
        Self { service }
    }

    pub async fn register(
        &self,
        flow: &dyn Flow,
        submission: &SmsRegistrationSubmission,
    ) -> AppResult<RegistrationOutcome> {
        if let Some(code) = submitted_code(submission.code.as_deref()) {
            self.service.verify_code(flow, code).await?;
            info!(flow_id = %flow.id(), "SMS registration code accepted");
            return Ok(RegistrationOutcome::Verified);
        }

        let phone = match submission.identifiers.as_slice() {
            [phone] => phone,
            other => {
                return Err(AppError::validation(format!(
                    "expected exactly one SMS identifier, got {}",
                    other.len()
                )));
            }
        };

        self.service.send_code(flow, phone).await?;
        info!(flow_id = %flow.id(), "SMS registration code requested");
        Ok(RegistrationOutcome::CodeSent)
    }
}
