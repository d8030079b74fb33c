use std::sync::Arc;

use crate::config::ResetPolicy;
use crate::database::{AccountStore, ChallengeStore};
use crate::services::clock::Clock;
use crate::services::mail_service::DeliveryChannel;
use crate::services::otp_service::PasswordResetService;
use crate::services::password::CredentialHasher;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub password_reset: PasswordResetService,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        challenges: Arc<dyn ChallengeStore>,
        delivery: Arc<dyn DeliveryChannel>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
        policy: ResetPolicy,
        jwt_secret: impl Into<Arc<str>>,
    ) -> Self {
        let password_reset = PasswordResetService::new(
            accounts.clone(),
            challenges,
            delivery,
            hasher.clone(),
            clock,
            policy,
        );

        AppState {
            accounts,
            hasher,
            password_reset,
            jwt_secret: jwt_secret.into(),
        }
    }
}
