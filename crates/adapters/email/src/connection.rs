//! SMTP 连接串解析

use courier_errors::{AppError, AppResult};
use secrecy::Secret;
use url::Url;

const SMTP_PORT: u16 = 25;
const SUBMISSIONS_PORT: u16 = 465;

/// TLS 策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// 明文连接后强制升级
    StartTls { skip_verify: bool },
    /// 连接建立即 TLS
    ImplicitTls { skip_verify: bool },
    /// 不加密
    None,
}

/// 解析后的 SMTP 连接参数
#[derive(Debug, Clone)]
pub struct SmtpConnection {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    pub security: SmtpSecurity,
}

impl SmtpConnection {
    pub fn parse(uri: &str) -> AppResult<Self> {
        let url = Url::parse(uri).map_err(|e| {
            AppError::configuration_missing(format!("Invalid SMTP connection URI: {}", e))
        })?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::configuration_missing("SMTP connection URI has no host"))?
            .to_string();

        let flag = |name: &str| {
            url.query_pairs()
                .any(|(key, value)| key == name && value.eq_ignore_ascii_case("true"))
        };
        let skip_verify = flag("skip_ssl_verify");

        let (security, default_port) = match url.scheme() {
            "smtps" => (SmtpSecurity::ImplicitTls { skip_verify }, SUBMISSIONS_PORT),
            "smtp" if flag("disable_starttls") => (SmtpSecurity::None, SMTP_PORT),
            "smtp" => (SmtpSecurity::StartTls { skip_verify }, SMTP_PORT),
            other => {
                return Err(AppError::configuration_missing(format!(
                    "Unsupported SMTP scheme: {}",
                    other
                )));
            }
        };

        let username = decode(url.username())?;
        let password = url.password().map(decode).transpose()?.flatten();

        Ok(Self {
            host,
            port: url.port().unwrap_or(default_port),
            username,
            password: password.map(Secret::new),
            security,
        })
    }
}

fn decode(raw: &str) -> AppResult<Option<String>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let decoded = urlencoding::decode(raw).map_err(|e| {
        AppError::configuration_missing(format!("Invalid SMTP credentials encoding: {}", e))
    })?;
    Ok(Some(decoded.into_owned()))
}
