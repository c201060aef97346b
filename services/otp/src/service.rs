//! 短信验证码签发与校验
//!
//! 每个 flow 同一时刻至多一个有效验证码：
//! - `send_code`: 没有有效验证码时生成新码，经 courier 投递后持久化
//! - `verify_code`: 与有效验证码比对，成功后不消费验证码

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use courier::MessageQueue;
use courier::template::{SmsLoginModel, SmsTemplate};
use courier_common::Clock;
use courier_config::OtpConfig;
use courier_errors::{AppError, AppResult};
use courier_ports::{Code, CodeStore};
use tracing::{info, warn};

use crate::flow::Flow;
use crate::generator::CodeGenerator;

#[async_trait]
pub trait AuthenticationService: Send + Sync {
    /// 通过短信发送新的验证码
    async fn send_code(&self, flow: &dyn Flow, phone: &str) -> AppResult<()>;

    /// 校验用户提交的验证码
    async fn verify_code(&self, flow: &dyn Flow, code: &str) -> AppResult<()>;
}

/// 验证码长度与有效期
#[derive(Debug, Clone)]
pub struct OtpSettings {
    pub code_length: usize,
    pub code_lifetime: Duration,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            code_length: 4,
            code_lifetime: Duration::minutes(1),
        }
    }
}

impl OtpSettings {
    pub fn from_config(config: &OtpConfig) -> AppResult<Self> {
        let code_lifetime = Duration::from_std(config.code_lifetime()).map_err(|_| {
            AppError::configuration_missing(format!(
                "OTP code lifetime of {}s is out of range",
                config.code_lifetime_secs
            ))
        })?;

        Ok(Self {
            code_length: config.code_length,
            code_lifetime,
        })
    }
}

pub struct SmsAuthenticationService {
    codes: Arc<dyn CodeStore>,
    courier: Arc<dyn MessageQueue>,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn CodeGenerator>,
    settings: OtpSettings,
}

impl SmsAuthenticationService {
    pub fn new(
        codes: Arc<dyn CodeStore>,
        courier: Arc<dyn MessageQueue>,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn CodeGenerator>,
        settings: OtpSettings,
    ) -> Self {
        Self {
            codes,
            courier,
            clock,
            generator,
            settings,
        }
    }
}

#[async_trait]
impl AuthenticationService for SmsAuthenticationService {
    async fn send_code(&self, flow: &dyn Flow, phone: &str) -> AppResult<()> {
        flow.valid()?;

        let flow_id = flow.id();
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.settings.code_lifetime)
            .ok_or_else(|| AppError::internal("OTP code expiry is out of range"))?;

        if self.codes.find_active_code(&flow_id, now).await?.is_some() {
            warn!(flow_id = %flow_id, "Active code found, will not resend until it expires");
            return Err(AppError::ActiveCodeExists);
        }

        let code = self.generator.generate(self.settings.code_length);

        let message_id = self
            .courier
            .queue_sms(&SmsTemplate::Login(SmsLoginModel {
                code: code.clone(),
                phone: phone.to_string(),
            }))
            .await?;

        // 并发签发由存储层的唯一性约束兜底，后到者返回 ActiveCodeExists，
        // 但它的短信已经入队
        let record = Code::new(flow_id, phone, code, expires_at, now);
        self.codes.create_code(&record).await?;

        info!(
            flow_id = %flow_id,
            message_id = %message_id,
            expires_at = %record.expires_at,
            "SMS login code issued"
        );
        Ok(())
    }

    async fn verify_code(&self, flow: &dyn Flow, code: &str) -> AppResult<()> {
        flow.valid()?;

        let flow_id = flow.id();
        let expected = match self.codes.find_active_code(&flow_id, self.clock.now()).await? {
            Some(expected) => expected,
            None => {
                warn!(flow_id = %flow_id, "Active code not found");
                return Err(AppError::NoActiveCode);
            }
        };

        if expected.code != code {
            warn!(flow_id = %flow_id, "Submitted SMS code does not match");
            return Err(AppError::CodeMismatch);
        }

        Ok(())
    }
}
