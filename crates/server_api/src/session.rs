//! Per-visitor session state and its signed cookie encoding.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::domain::VisitorId;
use thiserror::Error;

pub const VISITOR_ID_KEY: &str = "user_id";
pub const ROLE_KEY: &str = "role";

/// Key/value state scoped to one browsing session.
///
/// Besides plain values the session carries a queue of one-shot flash
/// messages that the next rendered page consumes.
#[derive(Debug, Clone, Default)]
pub struct Session {
    values: BTreeMap<String, String>,
    flashes: Vec<String>,
    modified: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if self.values.get(&key) != Some(&value) {
            self.values.insert(key, value);
            self.modified = true;
        }
    }

    pub fn visitor_id(&self) -> Option<VisitorId> {
        self.get(VISITOR_ID_KEY)
            .map(|value| VisitorId::from(value.to_string()))
    }

    pub fn role(&self) -> Option<&str> {
        self.get(ROLE_KEY)
    }

    pub fn flash(&mut self, message: impl Into<String>) {
        self.flashes.push(message.into());
        self.modified = true;
    }

    pub fn pending_flashes(&self) -> &[String] {
        &self.flashes
    }

    /// Drains queued flash messages.
    pub fn take_flashes(&mut self) -> Vec<String> {
        if self.flashes.is_empty() {
            return Vec::new();
        }
        self.modified = true;
        std::mem::take(&mut self.flashes)
    }

    /// Whether the session changed since it was loaded.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

#[derive(Debug, Error)]
#[error("session token rejected: {0}")]
pub struct SessionError(#[from] jsonwebtoken::errors::Error);

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    iat: i64,
    #[serde(default)]
    values: BTreeMap<String, String>,
    #[serde(default)]
    flashes: Vec<String>,
}

/// Signs sessions into HS256 tokens and verifies them on the way back.
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionCodec {
    pub fn new(secret: &str) -> Self {
        // browser-session lifetime: no exp claim to check
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn encode(&self, session: &Session) -> Result<String, SessionError> {
        let claims = SessionClaims {
            iat: Utc::now().timestamp(),
            values: session.values.clone(),
            flashes: session.flashes.clone(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn decode(&self, token: &str) -> Result<Session, SessionError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        Ok(Session {
            values: data.claims.values,
            flashes: data.claims.flashes,
            modified: false,
        })
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
