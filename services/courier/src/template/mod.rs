//! 模板注册表
//!
//! `TemplateType` 标签与具体模板变体之间的双向映射。模板模型序列化为
//! 消息上的 `template_data`，投递时按标签还原后再派生其他表示。

mod engine;

use std::fmt;
use std::str::FromStr;

use courier_errors::{AppError, AppResult};
use courier_ports::Message;
use serde::{Deserialize, Serialize};

pub use engine::*;

/// 模板类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateType {
    SmsCode,
    LoginEmail,
    /// 集成测试用，邮件与短信共用
    TestStub,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SmsCode => "sms_code",
            Self::LoginEmail => "login_email",
            Self::TestStub => "stub",
        }
    }
}

impl FromStr for TemplateType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sms_code" => Ok(Self::SmsCode),
            "login_email" => Ok(Self::LoginEmail),
            "stub" => Ok(Self::TestStub),
            other => Err(unexpected_template_type(other)),
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unexpected_template_type(tag: &str) -> AppError {
    AppError::template_resolution(format!("received unexpected message template type: {}", tag))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsLoginModel {
    pub code: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSmsStubModel {
    pub phone: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailLoginModel {
    pub to: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEmailStubModel {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// 短信模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmsTemplate {
    Login(SmsLoginModel),
    TestStub(TestSmsStubModel),
}

impl SmsTemplate {
    pub fn template_type(&self) -> TemplateType {
        match self {
            Self::Login(_) => TemplateType::SmsCode,
            Self::TestStub(_) => TemplateType::TestStub,
        }
    }

    pub fn recipient_phone(&self) -> &str {
        match self {
            Self::Login(m) => &m.phone,
            Self::TestStub(m) => &m.phone,
        }
    }

    pub fn body(&self, engine: &TemplateEngine) -> AppResult<String> {
        match self {
            Self::Login(m) => engine.render(LOGIN_SMS_BODY, m),
            Self::TestStub(m) => engine.render(STUB_SMS_BODY, m),
        }
    }

    /// 序列化模板模型
    pub fn to_payload(&self) -> AppResult<Vec<u8>> {
        let payload = match self {
            Self::Login(m) => serde_json::to_vec(m)?,
            Self::TestStub(m) => serde_json::to_vec(m)?,
        };
        Ok(payload)
    }

    /// 按标签还原模板
    pub fn from_payload(tag: &str, payload: &[u8]) -> AppResult<Self> {
        match tag.parse::<TemplateType>()? {
            TemplateType::SmsCode => Ok(Self::Login(serde_json::from_slice(payload)?)),
            TemplateType::TestStub => Ok(Self::TestStub(serde_json::from_slice(payload)?)),
            TemplateType::LoginEmail => Err(unexpected_template_type(tag)),
        }
    }

    pub fn from_message(message: &Message) -> AppResult<Self> {
        Self::from_payload(&message.template_type, &message.template_data)
    }
}

/// 邮件模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    Login(EmailLoginModel),
    TestStub(TestEmailStubModel),
}

impl EmailTemplate {
    pub fn template_type(&self) -> TemplateType {
        match self {
            Self::Login(_) => TemplateType::LoginEmail,
            Self::TestStub(_) => TemplateType::TestStub,
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Self::Login(m) => &m.to,
            Self::TestStub(m) => &m.to,
        }
    }

    pub fn subject(&self, engine: &TemplateEngine) -> AppResult<String> {
        match self {
            Self::Login(m) => engine.render(LOGIN_EMAIL_SUBJECT, m),
            Self::TestStub(m) => engine.render(STUB_EMAIL_SUBJECT, m),
        }
    }

    pub fn body_plaintext(&self, engine: &TemplateEngine) -> AppResult<String> {
        match self {
            Self::Login(m) => engine.render(LOGIN_EMAIL_BODY_PLAINTEXT, m),
            Self::TestStub(m) => engine.render(STUB_EMAIL_BODY_PLAINTEXT, m),
        }
    }

    pub fn body_html(&self, engine: &TemplateEngine) -> AppResult<String> {
        match self {
            Self::Login(m) => engine.render(LOGIN_EMAIL_BODY, m),
            Self::TestStub(m) => engine.render(STUB_EMAIL_BODY, m),
        }
    }

    pub fn to_payload(&self) -> AppResult<Vec<u8>> {
        let payload = match self {
            Self::Login(m) => serde_json::to_vec(m)?,
            Self::TestStub(m) => serde_json::to_vec(m)?,
        };
        Ok(payload)
    }

    pub fn from_payload(tag: &str, payload: &[u8]) -> AppResult<Self> {
        match tag.parse::<TemplateType>()? {
            TemplateType::LoginEmail => Ok(Self::Login(serde_json::from_slice(payload)?)),
            TemplateType::TestStub => Ok(Self::TestStub(serde_json::from_slice(payload)?)),
            TemplateType::SmsCode => Err(unexpected_template_type(tag)),
        }
    }

    pub fn from_message(message: &Message) -> AppResult<Self> {
        Self::from_payload(&message.template_type, &message.template_data)
    }
}
