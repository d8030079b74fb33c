// In-memory stores backed by `HashMap`s behind `tokio::sync::RwLock`.
//
// Used for tests and for running the API without MongoDB. Every operation
// holds the write lock for its whole read-modify-write, which gives the same
// single-record atomicity the MongoDB implementations rely on.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{AccountStore, ChallengeStore};
use crate::errors::{AppError, Result};
use crate::models::otp::OtpChallenge;
use crate::models::user::User;

#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u._id.as_ref() == Some(id))
            .cloned())
    }

    async fn insert(&self, mut user: User) -> Result<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(AppError::DuplicateKey);
        }
        user._id.get_or_insert_with(ObjectId::new);
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn update_password_hash(&self, email: &str, password_hash: &str) -> Result<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(email) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryChallengeStore {
    challenges: Arc<RwLock<HashMap<String, OtpChallenge>>>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.challenges.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn replace(&self, challenge: &OtpChallenge) -> Result<Option<OtpChallenge>> {
        Ok(self
            .challenges
            .write()
            .await
            .insert(challenge.identifier.clone(), challenge.clone()))
    }

    async fn find(&self, identifier: &str) -> Result<Option<OtpChallenge>> {
        Ok(self.challenges.read().await.get(identifier).cloned())
    }

    async fn mark_consumed(&self, read: &OtpChallenge) -> Result<bool> {
        let mut challenges = self.challenges.write().await;
        match challenges.get_mut(&read.identifier) {
            Some(stored) if stored.same_issue(read) => {
                stored.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_failed_attempt(&self, read: &OtpChallenge) -> Result<Option<u32>> {
        let mut challenges = self.challenges.write().await;
        match challenges.get_mut(&read.identifier) {
            Some(stored) if stored.same_issue(read) => {
                stored.attempts += 1;
                Ok(Some(stored.attempts))
            }
            _ => Ok(None),
        }
    }

    async fn take_consumed(&self, identifier: &str) -> Result<Option<OtpChallenge>> {
        let mut challenges = self.challenges.write().await;
        let consumed = challenges.get(identifier).is_some_and(|c| c.consumed);
        if consumed {
            Ok(challenges.remove(identifier))
        } else {
            Ok(None)
        }
    }

    async fn remove_exact(&self, read: &OtpChallenge) -> Result<bool> {
        let mut challenges = self.challenges.write().await;
        let current = challenges
            .get(&read.identifier)
            .is_some_and(|stored| stored.same_issue(read));
        if current {
            challenges.remove(&read.identifier);
        }
        Ok(current)
    }

    async fn purge_expired(
        &self,
        unverified_before: DateTime<Utc>,
        verified_before: DateTime<Utc>,
    ) -> Result<u64> {
        let mut challenges = self.challenges.write().await;
        let before = challenges.len();
        challenges.retain(|_, c| {
            let cutoff = if c.consumed { verified_before } else { unverified_before };
            c.expires_at >= cutoff
        });
        Ok((before - challenges.len()) as u64)
    }
}
