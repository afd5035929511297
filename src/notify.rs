//! 邮件通知
//! 注册验证与重置密码邮件，SendGrid 发送或仅写日志

use crate::{
    config::{EmailConfig, EmailProvider},
    error::{AppError, Result},
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde_json::json;
use std::{sync::Arc, time::Duration};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_sign_up_verification(&self, email: &str, first_name: &str, link: &str) -> Result<()>;
    async fn send_password_reset(&self, email: &str, first_name: &str, link: &str) -> Result<()>;
}

/// 按配置创建通知器
pub fn from_config(config: &EmailConfig) -> Result<Arc<dyn Notifier>> {
    match config.provider {
        EmailProvider::Log => Ok(Arc::new(LogNotifier)),
        EmailProvider::Sendgrid => Ok(Arc::new(SendGridNotifier::new(config)?)),
    }
}

/// 邮件内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
}

struct Template<'a> {
    title: &'a str,
    heading: &'a str,
    paragraph: &'a str,
    button: &'a str,
}

const SIGN_UP: Template<'static> = Template {
    title: "Verify your account",
    heading: "Welcome aboard!",
    paragraph: "Thanks for signing up. Please confirm your email address by clicking the button below.",
    button: "Verify Email",
};

const PASSWORD_RESET: Template<'static> = Template {
    title: "Reset your password",
    heading: "Password reset request",
    paragraph: "We received a request to reset your password. Click the button below to choose a new one. If you did not request this, you can ignore this email.",
    button: "Reset Password",
};

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render(template: &Template<'_>, first_name: &str, link: &str, sender_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">{heading}</h1>
    <p>Hi {name},</p>
    <p>{paragraph}</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{link}" style="background-color: #2196F3; color: white; padding: 14px 28px; text-decoration: none; border-radius: 4px; display: inline-block;">
            {button}
        </a>
    </p>
    <p>Or copy and paste this link into your browser:</p>
    <p style="word-break: break-all; color: #666;">{link}</p>
    <p style="color: #999; font-size: 12px; margin-top: 30px;">{sender}</p>
</body>
</html>"#,
        title = escape_html(template.title),
        heading = escape_html(template.heading),
        name = escape_html(first_name),
        paragraph = escape_html(template.paragraph),
        link = escape_html(link),
        button = escape_html(template.button),
        sender = escape_html(sender_name),
    )
}

/// 注册验证邮件
pub fn sign_up_email(sender_name: &str, first_name: &str, link: &str) -> EmailContent {
    EmailContent {
        subject: format!("Verify your {} account", sender_name),
        html: render(&SIGN_UP, first_name, link, sender_name),
    }
}

/// 重置密码邮件
pub fn password_reset_email(sender_name: &str, first_name: &str, link: &str) -> EmailContent {
    EmailContent {
        subject: format!("Reset your {} account password", sender_name),
        html: render(&PASSWORD_RESET, first_name, link, sender_name),
    }
}

/// SendGrid v3 HTTP API
pub struct SendGridNotifier {
    client: reqwest::Client,
    api_url: String,
    api_key: Secret<String>,
    sender_name: String,
    sender_address: String,
}

impl SendGridNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            sender_name: config.sender_name.clone(),
            sender_address: config.sender_address.clone(),
        })
    }

    async fn send(&self, to: &str, to_name: &str, content: EmailContent) -> Result<()> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": to, "name": to_name }] }],
            "from": { "email": self.sender_address, "name": self.sender_name },
            "subject": content.subject,
            "content": [{ "type": "text/html", "value": content.html }],
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Email request failed");
                AppError::Notification(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), detail = %detail, "Email provider rejected message");
            return Err(AppError::Notification(format!("provider returned {}", status)));
        }

        tracing::info!(to = %to, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send_sign_up_verification(&self, email: &str, first_name: &str, link: &str) -> Result<()> {
        self.send(email, first_name, sign_up_email(&self.sender_name, first_name, link))
            .await
    }

    async fn send_password_reset(&self, email: &str, first_name: &str, link: &str) -> Result<()> {
        self.send(email, first_name, password_reset_email(&self.sender_name, first_name, link))
            .await
    }
}

/// 开发环境：只把链接写到日志
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_sign_up_verification(&self, email: &str, first_name: &str, link: &str) -> Result<()> {
        tracing::info!(to = %email, name = %first_name, link = %link, "Sign-up verification email (log only)");
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, first_name: &str, link: &str) -> Result<()> {
        tracing::info!(to = %email, name = %first_name, link = %link, "Password reset email (log only)");
        Ok(())
    }
}
