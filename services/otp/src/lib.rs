//! OTP - 短信一次性验证码服务
//!
//! - `flow`: 认证流程契约
//! - `generator`: 验证码生成
//! - `service`: 签发与校验
//! - `login` / `registration`: 短信登录与注册步骤
//! - `app`: 与 courier 同进程的装配

pub mod app;
pub mod flow;
pub mod generator;
pub mod login;
pub mod registration;
pub mod service;

pub use app::OtpApp;
pub use flow::Flow;
pub use generator::{CodeGenerator, RandomCodeGenerator};
pub use login::{CODE_SENT_MESSAGE, LoginOutcome, SmsLogin, SmsLoginSubmission};
pub use registration::{RegistrationOutcome, SmsRegistration, SmsRegistrationSubmission};
pub use service::{AuthenticationService, OtpSettings, SmsAuthenticationService};
