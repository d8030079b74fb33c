use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{self, doc, Document},
    options::ReturnDocument,
    Collection, Database,
};

use super::ChallengeStore;
use crate::errors::Result;
use crate::models::otp::OtpChallenge;

pub const COLLECTION: &str = "password_resets";

/// Matches `read` only while it is still the stored issue for its identifier.
fn same_record(read: &OtpChallenge) -> Document {
    doc! {
        "identifier": read.identifier.as_str(),
        "code": read.code.as_str(),
        "issued_at": bson::DateTime::from_chrono(read.issued_at),
    }
}

#[derive(Clone)]
pub struct MongoChallengeStore {
    challenges: Collection<OtpChallenge>,
}

impl MongoChallengeStore {
    pub fn new(db: &Database) -> Self {
        Self {
            challenges: db.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl ChallengeStore for MongoChallengeStore {
    async fn replace(&self, challenge: &OtpChallenge) -> Result<Option<OtpChallenge>> {
        // Single-document upsert keyed on the unique identifier index: last writer wins.
        let previous = self
            .challenges
            .find_one_and_replace(doc! { "identifier": &challenge.identifier }, challenge)
            .upsert(true)
            .return_document(ReturnDocument::Before)
            .await?;

        Ok(previous)
    }

    async fn find(&self, identifier: &str) -> Result<Option<OtpChallenge>> {
        Ok(self
            .challenges
            .find_one(doc! { "identifier": identifier })
            .await?)
    }

    async fn mark_consumed(&self, read: &OtpChallenge) -> Result<bool> {
        let result = self
            .challenges
            .update_one(same_record(read), doc! { "$set": { "consumed": true } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn record_failed_attempt(&self, read: &OtpChallenge) -> Result<Option<u32>> {
        let updated = self
            .challenges
            .find_one_and_update(same_record(read), doc! { "$inc": { "attempts": 1 } })
            .return_document(ReturnDocument::After)
            .await?;

        Ok(updated.map(|c| c.attempts))
    }

    async fn take_consumed(&self, identifier: &str) -> Result<Option<OtpChallenge>> {
        Ok(self
            .challenges
            .find_one_and_delete(doc! { "identifier": identifier, "consumed": true })
            .await?)
    }

    async fn remove_exact(&self, read: &OtpChallenge) -> Result<bool> {
        let result = self.challenges.delete_one(same_record(read)).await?;
        Ok(result.deleted_count > 0)
    }

    async fn purge_expired(
        &self,
        unverified_before: DateTime<Utc>,
        verified_before: DateTime<Utc>,
    ) -> Result<u64> {
        let filter = doc! {
            "$or": [
                { "consumed": false, "expires_at": { "$lt": bson::DateTime::from_chrono(unverified_before) } },
                { "consumed": true, "expires_at": { "$lt": bson::DateTime::from_chrono(verified_before) } },
            ]
        };

        let result = self.challenges.delete_many(filter).await?;
        Ok(result.deleted_count)
    }
}
