//! Basic-auth credential derivation for the internal data API.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderValue, InvalidHeaderValue};
use secrecy::{ExposeSecret, SecretString};

/// Encoded `username:password` pair sent as a Basic credential.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// The `Authorization` header value, marked sensitive.
    pub fn header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Basic {}", self.0.expose_secret()))?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// The raw base64 token.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Derive the Basic token for a username/password pair.
pub fn compute_token(username: &str, password: &SecretString) -> AccessToken {
    let encoded = STANDARD.encode(format!("{}:{}", username, password.expose_secret()));
    AccessToken(SecretString::from(encoded))
}
