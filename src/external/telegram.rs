//! Telegram Bot API client for outbound stock alerts

use serde::{Deserialize, Serialize};

/// Minimal sendMessage client bound to one bot token and one chat
#[derive(Clone)]
pub struct TelegramClient {
    bot_token: String,
    chat_id: String,
    http_client: reqwest::Client,
}

/// sendMessage request body
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramClient {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            http_client: reqwest::Client::new(),
        }
    }

    /// Send a Markdown message to the configured chat
    pub async fn send_message(&self, text: &str) -> Result<(), String> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Failed to reach Telegram API: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body: ApiResponse = response.json().await.unwrap_or(ApiResponse {
                ok: false,
                description: None,
            });
            return Err(body
                .description
                .unwrap_or_else(|| format!("Telegram API returned {}", status)));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| format!("Invalid Telegram API response: {}", e))?;
        if body.ok {
            Ok(())
        } else {
            Err(body
                .description
                .unwrap_or_else(|| "Unknown Telegram API error".to_string()))
        }
    }
}
