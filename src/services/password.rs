use std::sync::Arc;

use crate::errors::{AppError, Result};

/// Hashes secrets into opaque digests and checks them back.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, secret: &str) -> Result<String>;

    fn verify(&self, secret: &str, digest: &str) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, secret: &str) -> Result<String> {
        Ok(bcrypt::hash(secret, self.cost)?)
    }

    fn verify(&self, secret: &str, digest: &str) -> Result<bool> {
        Ok(bcrypt::verify(secret, digest)?)
    }
}

// bcrypt is CPU-bound; keep it off the async workers.

pub async fn hash_blocking(hasher: Arc<dyn CredentialHasher>, secret: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&secret))
        .await
        .map_err(|e| AppError::service(format!("hashing task failed: {}", e)))?
}

pub async fn verify_blocking(
    hasher: Arc<dyn CredentialHasher>,
    secret: String,
    digest: String,
) -> Result<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&secret, &digest))
        .await
        .map_err(|e| AppError::service(format!("verification task failed: {}", e)))?
}
