use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const ANONYMOUS: &str = "anon";

/// Per-user namespace all persisted recommendation state is partitioned by
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn anonymous() -> Self {
        Self(ANONYMOUS.to_string())
    }

    pub fn user(user_id: u64) -> Self {
        Self(user_id.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS
    }

    /// Derives the identity from a bearer token's payload segment.
    ///
    /// The payload is read, never verified: `user_id`, `id` and `sub` are tried in
    /// that order and the first numeric one wins. Anything unreadable is anonymous.
    pub fn from_access_token(token: Option<&str>) -> Self {
        token
            .and_then(decode_user_id)
            .map(Self::user)
            .unwrap_or_else(Self::anonymous)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn decode_user_id(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;

    ["user_id", "id", "sub"]
        .iter()
        .find_map(|field| claims.get(*field).filter(|v| !v.is_null()))
        .and_then(numeric_claim)
}

fn numeric_claim(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
