//! Persistence seams for accounts and reset challenges.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::errors::Result;
use crate::models::otp::OtpChallenge;
use crate::models::user::User;

pub mod accounts;
pub mod challenges;
pub mod connection;
pub mod memory;

pub use accounts::MongoAccountStore;
pub use challenges::MongoChallengeStore;
pub use memory::{MemoryAccountStore, MemoryChallengeStore};

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>>;

    /// Inserts and returns the user with its assigned id.
    async fn insert(&self, user: User) -> Result<User>;

    /// Returns false when no account has this email.
    async fn update_password_hash(&self, email: &str, password_hash: &str) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

/// Keyed challenge repository: at most one record per identifier.
///
/// Writes that follow a `find` take the record that was read and only apply
/// while `identifier`, `code` and `issued_at` still match, so a concurrent
/// `replace` is never modified by a stale caller.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Atomically replaces whatever is stored for `challenge.identifier`.
    /// Returns the superseded record, if any.
    async fn replace(&self, challenge: &OtpChallenge) -> Result<Option<OtpChallenge>>;

    async fn find(&self, identifier: &str) -> Result<Option<OtpChallenge>>;

    /// Sets `consumed` on `read` only if it is still the stored record.
    /// Returns false if it was superseded or removed meanwhile.
    async fn mark_consumed(&self, read: &OtpChallenge) -> Result<bool>;

    /// Increments the failed-attempt counter of `read` and returns the new
    /// count, or `None` if `read` is no longer the stored record.
    async fn record_failed_attempt(&self, read: &OtpChallenge) -> Result<Option<u32>>;

    /// Atomically removes and returns the record only if it is consumed.
    async fn take_consumed(&self, identifier: &str) -> Result<Option<OtpChallenge>>;

    /// Removes `read` only if it is still the stored record.
    async fn remove_exact(&self, read: &OtpChallenge) -> Result<bool>;

    /// Deletes unconsumed records that expired before `unverified_before` and
    /// consumed records that expired before `verified_before`.
    async fn purge_expired(
        &self,
        unverified_before: DateTime<Utc>,
        verified_before: DateTime<Utc>,
    ) -> Result<u64>;
}
