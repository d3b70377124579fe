use std::{env, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use super::SmsTransport;

pub const TWILIO_API_URL: &str = "https://api.twilio.com";
pub const DEFAULT_SMS_TIMEOUT: Duration = Duration::from_secs(10);

/// Credentials of the sending account. All three are required.
#[derive(Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    /// Sms capable number of the account in E.164.
    pub from: String,
}

impl std::fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl TwilioCredentials {
    /// Reads `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and `TWILIO_FROM_E164`. Blank values count
    /// as missing.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Some(Self {
            account_sid: read("TWILIO_ACCOUNT_SID")?,
            auth_token: read("TWILIO_AUTH_TOKEN")?,
            from: read("TWILIO_FROM_E164")?,
        })
    }
}

#[derive(Deserialize)]
struct MessageResponse {
    sid: Option<String>,
}

/// [SmsTransport] backed by the Twilio messages api.
pub struct TwilioTransport {
    client: Client,
    credentials: Option<TwilioCredentials>,
    api_url: String,
}

impl TwilioTransport {
    pub fn new(credentials: Option<TwilioCredentials>, timeout: Duration) -> reqwest::Result<Self> {
        Self::with_api_url(credentials, timeout, TWILIO_API_URL)
    }

    pub fn with_api_url(
        credentials: Option<TwilioCredentials>,
        timeout: Duration,
        api_url: impl Into<String>,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
            api_url: api_url.into(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send_inner(
        &self,
        credentials: &TwilioCredentials,
        to: &str,
        body: &str,
    ) -> anyhow::Result<String> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_url.trim_end_matches('/'),
            credentials.account_sid
        );
        let response = self
            .client
            .post(url)
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&[("To", to), ("From", credentials.from.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Twilio responded with {status}: {text}");
        }
        let message: MessageResponse = response.json().await?;
        message
            .sid
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Twilio response has no message sid"))
    }
}

#[async_trait]
impl SmsTransport for TwilioTransport {
    #[instrument(skip(self, body))]
    async fn send_sms(&self, to: &str, body: &str) -> bool {
        let Some(credentials) = &self.credentials else {
            warn!("Twilio not configured: set TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN, TWILIO_FROM_E164");
            return false;
        };
        match self.send_inner(credentials, to, body).await {
            Ok(sid) => {
                info!("Sms accepted with sid {sid}");
                true
            }
            Err(e) => {
                error!("Twilio send failed {e:?}");
                false
            }
        }
    }
}
