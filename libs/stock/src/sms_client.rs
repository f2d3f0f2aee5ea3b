use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::{Result, error_for_status};

const PROVIDER: &str = "twilio";

/// Sends text messages through the Twilio Messages API from one fixed number.
#[derive(Clone)]
pub struct SmsClient {
    client: Client,
    base_api: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl SmsClient {
    pub fn new(
        base_api: String,
        account_sid: String,
        auth_token: String,
        from: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_api,
            account_sid,
            auth_token,
            from,
        })
    }

    /// Sends one message and returns the provider-assigned SID.
    #[instrument(name = "send_sms", skip(self, body), fields(len = body.len()))]
    pub async fn send(&self, to: &str, body: &str) -> Result<String> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_api.trim_end_matches('/'),
            self.account_sid
        );

        let res = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from.as_str()), ("Body", body)])
            .send()
            .await?;
        let body = error_for_status(PROVIDER, res).await?.text().await?;

        let message: MessageResponse = serde_json::from_str(&body)?;
        info!(sid = %message.sid, status = ?message.status, "message sent");

        Ok(message.sid)
    }
}

//
// Match Twilio Message resource JSON
// https://www.twilio.com/docs/messaging/api/message-resource
//
#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,

    #[serde(default)]
    status: Option<String>,
}
