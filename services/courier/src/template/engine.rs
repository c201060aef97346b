//! 模板渲染引擎

use std::collections::HashMap;
use std::path::Path;

use courier_errors::{AppError, AppResult};
use serde::Serialize;
use tera::Tera;
use tracing::{debug, warn};

pub const LOGIN_SMS_BODY: &str = "login/sms.body.txt";
pub const LOGIN_EMAIL_SUBJECT: &str = "login/email.subject.txt";
pub const LOGIN_EMAIL_BODY: &str = "login/email.body.html";
pub const LOGIN_EMAIL_BODY_PLAINTEXT: &str = "login/email.body.plaintext.txt";
pub const STUB_SMS_BODY: &str = "test_stub/sms.body.txt";
pub const STUB_EMAIL_SUBJECT: &str = "test_stub/email.subject.txt";
pub const STUB_EMAIL_BODY: &str = "test_stub/email.body.html";
pub const STUB_EMAIL_BODY_PLAINTEXT: &str = "test_stub/email.body.plaintext.txt";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (LOGIN_SMS_BODY, "Your login code is: {{ code }}"),
    (LOGIN_EMAIL_SUBJECT, "Your login code"),
    (
        LOGIN_EMAIL_BODY,
        "<p>Hi,</p><p>please use the following code to sign in: <strong>{{ code }}</strong></p>",
    ),
    (
        LOGIN_EMAIL_BODY_PLAINTEXT,
        "Hi,\n\nplease use the following code to sign in: {{ code }}",
    ),
    (STUB_SMS_BODY, "{{ body }}"),
    (STUB_EMAIL_SUBJECT, "{{ subject }}"),
    (STUB_EMAIL_BODY, "<p>{{ body }}</p>"),
    (STUB_EMAIL_BODY_PLAINTEXT, "{{ body }}"),
];

/// 模板管理器
///
/// 内置模板覆盖所有模板类型；覆盖目录中相同相对路径的文件优先。
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// 仅使用内置模板
    pub fn new() -> AppResult<Self> {
        Self::from_tera(Tera::default())
    }

    /// 从覆盖目录加载模板，缺失的模板回落到内置版本
    pub fn with_overrides(template_dir: &str) -> AppResult<Self> {
        if !Path::new(template_dir).is_dir() {
            warn!(template_dir = %template_dir, "Template override directory not found, using built-in templates");
            return Self::new();
        }

        let pattern = format!("{}/**/*", template_dir);
        let tera = Tera::new(&pattern)
            .map_err(|e| AppError::internal(format!("Failed to load templates: {}", e)))?;

        debug!(template_dir = %template_dir, "Template overrides loaded");

        Self::from_tera(tera)
    }

    /// 从内存中的模板字符串创建覆盖（用于测试）
    pub fn from_strings(templates: HashMap<String, String>) -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in templates {
            tera.add_raw_template(&name, &content).map_err(|e| {
                AppError::internal(format!("Failed to add template {}: {}", name, e))
            })?;
        }

        Self::from_tera(tera)
    }

    fn from_tera(mut tera: Tera) -> AppResult<Self> {
        let missing: Vec<(&str, &str)> = BUILTIN_TEMPLATES
            .iter()
            .filter(|(name, _)| !tera.get_template_names().any(|loaded| loaded == *name))
            .copied()
            .collect();

        tera.add_raw_templates(missing)
            .map_err(|e| AppError::internal(format!("Failed to add built-in templates: {}", e)))?;

        Ok(Self { tera })
    }

    /// 渲染模板
    pub fn render(&self, template_name: &str, context: &impl Serialize) -> AppResult<String> {
        let context = tera::Context::from_serialize(context).map_err(|e| {
            AppError::template_resolution(format!("Failed to create template context: {}", e))
        })?;

        self.tera.render(template_name, &context).map_err(|e| {
            AppError::template_resolution(format!(
                "Failed to render template {}: {}",
                template_name, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_templates_render() {
        let engine = TemplateEngine::new().unwrap();

        let body = engine.render(LOGIN_SMS_BODY, &json!({ "code": "4821" })).unwrap();
        assert_eq!(body, "Your login code is: 4821");
    }

    #[test]
    fn test_override_from_strings() {
        let mut templates = HashMap::new();
        templates.insert(
            LOGIN_SMS_BODY.to_string(),
            "Code {{ code }} for {{ phone }}".to_string(),
        );

        let engine = TemplateEngine::from_strings(templates).unwrap();

        let body = engine
            .render(LOGIN_SMS_BODY, &json!({ "code": "4821", "phone": "+12065550101" }))
            .unwrap();
        assert_eq!(body, "Code 4821 for +12065550101");

        // 未覆盖的模板仍然可用
        let subject = engine.render(LOGIN_EMAIL_SUBJECT, &json!({})).unwrap();
        assert_eq!(subject, "Your login code");
    }

    #[test]
    fn test_override_directory() {
        let dir = std::env::temp_dir().join(format!("courier-templates-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("login")).unwrap();
        std::fs::write(dir.join("login/sms.body.txt"), "Use {{ code }}").unwrap();

        let engine = TemplateEngine::with_overrides(dir.to_str().unwrap()).unwrap();
        let body = engine.render(LOGIN_SMS_BODY, &json!({ "code": "4821" })).unwrap();
        assert_eq!(body, "Use 4821");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_override_directory_falls_back() {
        let engine = TemplateEngine::with_overrides("/nonexistent/courier/templates").unwrap();
        assert!(engine.render(STUB_SMS_BODY, &json!({ "body": "hi" })).is_ok());
    }

    #[test]
    fn test_html_is_escaped() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine
            .render(STUB_EMAIL_BODY, &json!({ "body": "<script>" }))
            .unwrap();
        assert_eq!(html, "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_missing_variable_is_template_error() {
        let engine = TemplateEngine::new().unwrap();
        let err = engine.render(LOGIN_SMS_BODY, &json!({})).unwrap_err();
        assert!(matches!(err, AppError::TemplateResolution(_)));
    }
}
