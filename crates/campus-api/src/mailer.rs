use anyhow::{Result, bail};
use serde_json::json;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

pub const VERIFY_SUBJECT: &str = "Verify your UFV Campus Market email";

/// Transactional mail through the Resend HTTP API.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl Mailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }

    pub async fn send_verification(&self, to: &str, name: &str, verify_url: &str) -> Result<()> {
        let body = json!({
            "from": self.from,
            "to": to,
            "subject": VERIFY_SUBJECT,
            "html": verification_html(name, verify_url),
        });

        let resp = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("mail provider returned {}: {}", status, text);
        }
        Ok(())
    }
}

fn verification_html(name: &str, verify_url: &str) -> String {
    let greeting = if name.is_empty() {
        "Hi,".to_string()
    } else {
        format!("Hi {},", escape_html(name))
    };
    format!(
        "<p>{greeting}</p>\
         <p>Click the link below to verify your UFV student email for Campus Market:</p>\
         <p><a href=\"{url}\">Verify my email</a></p>\
         <p>If you didn't request this, you can ignore this email.</p>",
        url = escape_html(verify_url),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_greets_by_name_and_escapes() {
        let html = verification_html("<Ann>", "http://x/verify-email?token=a&email=b");
        assert!(html.contains("Hi &lt;Ann&gt;,"));
        assert!(html.contains("href=\"http://x/verify-email?token=a&amp;email=b\""));

        let anonymous = verification_html("", "http://x");
        assert!(anonymous.starts_with("<p>Hi,</p>"));
    }
}
