use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::{self, doc, oid::ObjectId},
    Collection, Database,
};

use super::AccountStore;
use crate::errors::{AppError, Result};
use crate::models::user::User;

pub const COLLECTION: &str = "users";

#[derive(Clone)]
pub struct MongoAccountStore {
    db: Database,
    users: Collection<User>,
}

impl MongoAccountStore {
    pub fn new(db: Database) -> Self {
        let users = db.collection(COLLECTION);
        Self { db, users }
    }
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>> {
        Ok(self.users.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut user: User) -> Result<User> {
        let result = self
            .users
            .insert_one(&user)
            .await
            .map_err(AppError::from_write)?;

        user._id = result.inserted_id.as_object_id();
        Ok(user)
    }

    async fn update_password_hash(&self, email: &str, password_hash: &str) -> Result<bool> {
        let now = bson::DateTime::from_chrono(Utc::now());
        let result = self
            .users
            .update_one(
                doc! { "email": email },
                doc! { "$set": { "password_hash": password_hash, "updated_at": now } },
            )
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
