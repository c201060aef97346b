//! 进程内装配
//!
//! Courier 与短信验证码服务共享同一个消息队列：验证码服务入队的短信
//! 由同一进程里的调度循环投递。

use std::sync::Arc;

use courier::Courier;
use courier_adapter_memory::{InMemoryCodeStore, InMemoryMessageStore};
use courier_common::{Clock, SystemClock};
use courier_config::AppConfig;
use courier_errors::AppResult;
use courier_ports::{CodeStore, MessageStore};
use tokio_util::sync::CancellationToken;

use crate::generator::{CodeGenerator, RandomCodeGenerator};
use crate::login::SmsLogin;
use crate::registration::SmsRegistration;
use crate::service::{AuthenticationService, OtpSettings, SmsAuthenticationService};

pub struct OtpApp {
    courier: Arc<Courier>,
    login: SmsLogin,
    registration: SmsRegistration,
}

impl OtpApp {
    pub fn new(
        courier: Arc<Courier>,
        codes: Arc<dyn CodeStore>,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn CodeGenerator>,
        settings: OtpSettings,
    ) -> Self {
        let service: Arc<dyn AuthenticationService> = Arc::new(SmsAuthenticationService::new(
            codes,
            courier.clone(),
            clock,
            generator,
            settings,
        ));

        Self {
            courier,
            login: SmsLogin::new(service.clone()),
            registration: SmsRegistration::new(service),
        }
    }

    /// 按配置装配：真实的 SMTP / HTTP 通道，内存消息队列与验证码存储
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let messages: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
        let courier = Arc::new(Courier::from_config(&config.courier, messages)?);

        Ok(Self::new(
            courier,
            Arc::new(InMemoryCodeStore::new()),
            Arc::new(SystemClock),
            Arc::new(RandomCodeGenerator),
            OtpSettings::from_config(&config.otp)?,
        ))
    }

    pub fn login(&self) -> &SmsLogin {
        &self.login
    }

    pub fn registration(&self) -> &SmsRegistration {
        &self.registration
    }

    /// 运行投递循环，直到 `shutdown` 被取消
    pub async fn run(&self, shutdown: CancellationToken) -> AppResult<()> {
        self.courier.clone().work(shutdown).await
    }
}
