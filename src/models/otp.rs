use chrono::{DateTime, Duration, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};

/// One outstanding password-reset code, keyed by account identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpChallenge {
    pub identifier: String,
    pub code: String,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub consumed: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub issued_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    pub fn new(
        identifier: impl Into<String>,
        code: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            code: code.into(),
            attempts: 0,
            consumed: false,
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Same issued code for the same identifier. Attempt count and the
    /// consumed flag are ignored.
    pub fn same_issue(&self, other: &OtpChallenge) -> bool {
        self.identifier == other.identifier
            && self.code == other.code
            && self.issued_at == other.issued_at
    }

    /// A verified challenge can still be committed until `expires_at + window`.
    pub fn is_committable(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.consumed && now <= self.expires_at + window
    }

    pub fn matches(&self, submitted: &str) -> bool {
        let (a, b) = (self.code.as_bytes(), submitted.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        // constant-time over equal lengths
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}
