//! Telegram Mini App init-data verification.
//!
//! The Mini App forwards `Telegram.WebApp.initData` (a URL-encoded query
//! string) with every request. It is signed by Telegram with a key derived
//! from the bot token:
//!
//! ```text
//! secret_key = HMAC_SHA256(key = "WebAppData", msg = bot_token)
//! hash       = hex(HMAC_SHA256(key = secret_key, msg = data_check_string))
//! ```
//!
//! where `data_check_string` is every field except `hash`, formatted as
//! `key=value`, sorted by key and joined with `\n`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::types::UserId;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// Errors produced while verifying init data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitDataError {
    /// The `hash` field is absent.
    #[error("init data has no hash")]
    MissingHash,

    /// The hash is not valid hex or does not match the payload.
    #[error("init data signature mismatch")]
    SignatureMismatch,

    /// The `user` field is absent or not valid JSON.
    #[error("init data has no valid user: {0}")]
    InvalidUser(String),

    /// `auth_date` is older than the accepted window.
    #[error("init data expired")]
    Expired,

    /// The signing key was rejected by the MAC implementation.
    #[error("invalid signing key")]
    InvalidKey,
}

/// The Telegram user carried by verified init data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    /// Telegram user id.
    pub id: i64,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Username without `@`.
    #[serde(default)]
    pub username: Option<String>,
    /// IETF language tag of the client.
    #[serde(default)]
    pub language_code: Option<String>,
}

impl TelegramUser {
    /// Returns the application user id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::from(self.id)
    }
}

/// Verifies init data against a bot token.
#[derive(Clone)]
pub struct InitDataVerifier {
    secret_key: Vec<u8>,
    max_age: Option<chrono::Duration>,
}

impl std::fmt::Debug for InitDataVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitDataVerifier")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl InitDataVerifier {
    /// Creates a verifier for the given bot token.
    ///
    /// `max_age_secs == 0` disables the `auth_date` freshness check.
    pub fn new(bot_token: &str, max_age_secs: u64) -> Result<Self, InitDataError> {
        let secret_key = hmac_sha256(WEB_APP_DATA_KEY, bot_token.as_bytes())?;
        let max_age = (max_age_secs > 0).then(|| {
            i64::try_from(max_age_secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .unwrap_or(chrono::Duration::MAX)
        });
        Ok(Self {
            secret_key,
            max_age,
        })
    }

    /// Verifies the signature and extracts the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is missing or wrong, the payload is
    /// stale, or the `user` field cannot be parsed.
    pub fn verify(&self, init_data: &str, now: DateTime<Utc>) -> Result<TelegramUser, InitDataError> {
        let mut received_hash = None;
        let mut fields: Vec<(String, String)> = Vec::new();
        for (key, value) in url::form_urlencoded::parse(init_data.as_bytes()) {
            if key == "hash" {
                received_hash = Some(value.into_owned());
            } else {
                fields.push((key.into_owned(), value.into_owned()));
            }
        }

        let received_hash = received_hash.ok_or(InitDataError::MissingHash)?;
        let expected = hex::decode(received_hash).map_err(|_| InitDataError::SignatureMismatch)?;

        fields.sort_by(|a, b| a.0.cmp(&b.0));
        let data_check_string = fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).map_err(|_| InitDataError::InvalidKey)?;
        mac.update(data_check_string.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| InitDataError::SignatureMismatch)?;

        if let Some(max_age) = self.max_age {
            let auth_date = fields
                .iter()
                .find(|(k, _)| k == "auth_date")
                .and_then(|(_, v)| v.parse::<i64>().ok())
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
            match auth_date {
                Some(issued) if now - issued <= max_age => {}
                _ => return Err(InitDataError::Expired),
            }
        }

        let user_json = fields
            .iter()
            .find(|(k, _)| k == "user")
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| InitDataError::InvalidUser("missing".to_string()))?;

        serde_json::from_str(user_json).map_err(|e| InitDataError::InvalidUser(e.to_string()))
    }

    /// Produces the hex signature Telegram would attach to `fields`.
    ///
    /// Used to build init data for tests and local tooling.
    pub fn sign(&self, fields: &[(&str, &str)]) -> Result<String, InitDataError> {
        let mut sorted: Vec<_> = fields.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let data_check_string = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");
        hmac_sha256(&self.secret_key, data_check_string.as_bytes()).map(hex::encode)
    }
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> Result<Vec<u8>, InitDataError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| InitDataError::InvalidKey)?;
    mac.update(msg);
    Ok(mac.finalize().into_bytes().to_vec())
}
