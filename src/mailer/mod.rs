//! 资料页联系表单的邮件发送

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("email provider rejected the message: {0}")]
    Rejected(String),
}

/// 访客留言，发送到资料主人的联系邮箱
#[derive(Debug, Clone)]
pub struct ContactEmail {
    pub name: String,
    pub email: String,
    pub message: String,
    pub profile_email: String,
}

impl ContactEmail {
    pub fn subject(&self) -> String {
        format!("New message from {} on Vitrito", self.name)
    }

    pub fn html(&self) -> String {
        format!(
            "<p>You have a new message from {} ({}):</p><p>{}</p>",
            escape_html(&self.name),
            escape_html(&self.email),
            escape_html(&self.message)
        )
    }
}

#[async_trait]
pub trait ContactMailer: Send + Sync {
    async fn send_contact(&self, email: ContactEmail) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    html: String,
}

pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl ContactMailer for ResendMailer {
    async fn send_contact(&self, email: ContactEmail) -> Result<(), MailError> {
        let body = ResendRequest {
            from: &self.from,
            to: &email.profile_email,
            subject: email.subject(),
            html: email.html(),
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(format!("{}: {}", status, text)));
        }

        tracing::info!("Contact email sent to {}", email.profile_email);
        Ok(())
    }
}

/// 未配置发信服务时只记录日志
pub struct LogMailer;

#[async_trait]
impl ContactMailer for LogMailer {
    async fn send_contact(&self, email: ContactEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.profile_email,
            subject = %email.subject(),
            "Email delivery disabled, contact message logged only"
        );
        Ok(())
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
