use color_eyre::Result;
use serde::Serialize;

use crate::services::auth::EmailSender;

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const FROM_ADDRESS: &str = "Daily Quiz <noreply@dailyquiz.app>";

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

/// Delivers mail through the Resend HTTP API. With an empty API key nothing
/// is sent and callers fall back to logging.
#[derive(Clone)]
pub struct ResendEmailSender {
    client: reqwest::Client,
    api_key: String,
}

impl ResendEmailSender {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    async fn send(&self, to_email: &str, subject: &str, html: String) -> Result<()> {
        let body = SendEmailRequest {
            from: FROM_ADDRESS.to_string(),
            to: vec![to_email.to_string()],
            subject: subject.to_string(),
            html,
        };

        let resp = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::error!("Resend API error: {status} - {text}");
            color_eyre::eyre::bail!("Resend API returned {status}");
        }

        Ok(())
    }
}

impl EmailSender for ResendEmailSender {
    fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn send_otp_email(&self, to_email: &str, code: &str) -> Result<()> {
        self.send(to_email, "Your one-time code", otp_email_html(code))
            .await?;
        tracing::info!("OTP email sent to {to_email}");
        Ok(())
    }
}

fn otp_email_html(code: &str) -> String {
    format!(
        r#"<div style="padding: 20px; border-radius: 10px; background-color: #83c9c5;">
<p>Your one-time code is <strong style="background: orange; padding: 5px; border-radius: 5px; letter-spacing: 0.5px;">{code}</strong>.</p>
<p>It expires in 10 minutes. If you did not ask to reset your password, you can ignore this email.</p>
</div>"#
    )
}
