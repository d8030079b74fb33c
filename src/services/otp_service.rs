use std::sync::Arc;

use rand::{rngs::OsRng, Rng};

use crate::config::ResetPolicy;
use crate::database::{AccountStore, ChallengeStore};
use crate::errors::{AppError, Result};
use crate::models::otp::OtpChallenge;
use crate::services::clock::Clock;
use crate::services::mail_service::DeliveryChannel;
use crate::services::password::{hash_blocking, CredentialHasher};

/// Fixed-width, zero-padded numeric code from the OS CSPRNG.
pub fn generate_otp(length: usize) -> String {
    let upper = 10u64.pow(length as u32);
    format!("{:0width$}", OsRng.gen_range(0..upper), width = length)
}

/// Draws from `next` until the code differs from the one being superseded.
fn distinct_code(previous: Option<&str>, mut next: impl FnMut() -> String) -> String {
    loop {
        let code = next();
        if previous != Some(code.as_str()) {
            return code;
        }
    }
}

pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// The password-reset state machine: request, verify, commit.
#[derive(Clone)]
pub struct PasswordResetService {
    accounts: Arc<dyn AccountStore>,
    challenges: Arc<dyn ChallengeStore>,
    delivery: Arc<dyn DeliveryChannel>,
    hasher: Arc<dyn CredentialHasher>,
    clock: Arc<dyn Clock>,
    policy: ResetPolicy,
}

impl PasswordResetService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        challenges: Arc<dyn ChallengeStore>,
        delivery: Arc<dyn DeliveryChannel>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
        policy: ResetPolicy,
    ) -> Self {
        Self {
            accounts,
            challenges,
            delivery,
            hasher,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &ResetPolicy {
        &self.policy
    }

    /// Issues a fresh code for `identifier`, superseding any earlier one.
    ///
    /// Unknown identifiers succeed silently so callers cannot probe for
    /// accounts. A delivery failure leaves the stored challenge in place.
    pub async fn request_challenge(&self, identifier: &str) -> Result<()> {
        let identifier = normalize_identifier(identifier);

        if self.accounts.find_by_email(&identifier).await?.is_none() {
            tracing::debug!("reset requested for unknown identifier");
            return Ok(());
        }

        let previous_code = self.challenges.find(&identifier).await?.map(|c| c.code);
        let code = distinct_code(previous_code.as_deref(), || {
            generate_otp(self.policy.code_length)
        });

        let challenge =
            OtpChallenge::new(&identifier, code, self.clock.now(), self.policy.code_ttl);
        if self.challenges.replace(&challenge).await?.is_some() {
            tracing::info!("superseded earlier reset code for {}", identifier);
        }

        self.delivery
            .send_code(&identifier, &challenge.code, self.policy.code_ttl)
            .await
            .map_err(|e| {
                tracing::warn!("reset code delivery to {} failed: {}", identifier, e);
                match e {
                    AppError::DeliveryFailed(_) => e,
                    other => AppError::delivery(other.to_string()),
                }
            })?;

        tracing::info!("reset code issued for {}", identifier);
        Ok(())
    }

    /// Checks `code` against the stored challenge and marks it consumed.
    ///
    /// Re-submitting the correct code before commit succeeds again. Every
    /// write is guarded on the record that was read, so a code issued in the
    /// meantime is never consumed, counted or removed by this call.
    pub async fn verify_challenge(&self, identifier: &str, code: &str) -> Result<()> {
        let identifier = normalize_identifier(identifier);
        let code = code.trim();
        let now = self.clock.now();

        let challenge = self
            .challenges
            .find(&identifier)
            .await?
            .ok_or(AppError::OtpNotFound)?;

        let expired = if challenge.consumed {
            !challenge.is_committable(now, self.policy.reset_window)
        } else {
            challenge.is_expired(now)
        };
        if expired {
            self.challenges.remove_exact(&challenge).await?;
            tracing::debug!("reset code for {} expired", identifier);
            return Err(AppError::OtpExpired);
        }

        let length = self.policy.code_length;
        if code.len() != length || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::invalid_data(format!("OTP must be {} digits", length)));
        }

        if !challenge.matches(code) {
            return Err(self.record_miss(&challenge).await?);
        }

        if !challenge.consumed {
            if !self.challenges.mark_consumed(&challenge).await? {
                return Err(self.superseded(&identifier).await?);
            }
            tracing::info!("reset code verified for {}", identifier);
        }
        Ok(())
    }

    async fn record_miss(&self, challenge: &OtpChallenge) -> Result<AppError> {
        // A verified challenge is not reopened by later typos.
        if challenge.consumed {
            return Ok(AppError::InvalidOtp);
        }

        let identifier = &challenge.identifier;
        let attempts = match self.challenges.record_failed_attempt(challenge).await? {
            Some(n) => n,
            None => return self.superseded(identifier).await,
        };

        match self.policy.max_attempts {
            Some(max) if attempts >= max => {
                self.challenges.remove_exact(challenge).await?;
                tracing::warn!(
                    "reset code for {} invalidated after {} failed attempts",
                    identifier,
                    attempts
                );
                Ok(AppError::OtpAttemptsExhausted)
            }
            _ => Ok(AppError::InvalidOtp),
        }
    }

    /// Outcome for a code whose record changed after it was read.
    async fn superseded(&self, identifier: &str) -> Result<AppError> {
        tracing::debug!("reset code for {} changed during verification", identifier);
        Ok(match self.challenges.find(identifier).await? {
            Some(_) => AppError::InvalidOtp,
            None => AppError::OtpNotFound,
        })
    }

    /// Replaces the credential for a verified challenge and finalizes it.
    /// Succeeds at most once per verification.
    pub async fn commit_new_password(&self, identifier: &str, new_secret: &str) -> Result<()> {
        let identifier = normalize_identifier(identifier);

        if new_secret.chars().count() < self.policy.min_password_length {
            return Err(AppError::WeakPassword(self.policy.min_password_length));
        }

        let pending = self.challenges.find(&identifier).await?;
        if !pending.is_some_and(|c| c.consumed) {
            return Err(AppError::NoVerifiedChallenge);
        }

        let digest = hash_blocking(self.hasher.clone(), new_secret.to_string()).await?;

        let challenge = self
            .challenges
            .take_consumed(&identifier)
            .await?
            .ok_or(AppError::NoVerifiedChallenge)?;

        if !challenge.is_committable(self.clock.now(), self.policy.reset_window) {
            tracing::debug!("verified reset for {} outlived its window", identifier);
            return Err(AppError::NoVerifiedChallenge);
        }

        if !self.accounts.update_password_hash(&identifier, &digest).await? {
            return Err(AppError::DocumentNotFound);
        }

        tracing::info!("password reset committed for {}", identifier);
        Ok(())
    }

    /// Housekeeping: drops challenges no later call could accept.
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = self.clock.now();
        self.challenges
            .purge_expired(now, now - self.policy.reset_window)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use tokio::sync::Mutex;

    use crate::database::{MemoryAccountStore, MemoryChallengeStore};
    use crate::models::user::User;
    use crate::services::clock::ManualClock;
    use crate::services::password::BcryptHasher;

    const EMAIL: &str = "user@example.com";

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingChannel {
        async fn last_code(&self) -> String {
            self.sent.lock().await.last().map(|(_, c)| c.clone()).unwrap()
        }

        async fn count(&self) -> usize {
            self.sent.lock().await.len()
        }
    }

    #[async_trait]
    impl DeliveryChannel for RecordingChannel {
        async fn send_code(&self, identifier: &str, code: &str, _ttl: Duration) -> Result<()> {
            self.sent
                .lock()
                .await
                .push((identifier.to_string(), code.to_string()));
            if self.fail {
                return Err(AppError::delivery("mailbox unavailable"));
            }
            Ok(())
        }
    }

    struct Harness {
        service: PasswordResetService,
        accounts: MemoryAccountStore,
        challenges: MemoryChallengeStore,
        channel: Arc<RecordingChannel>,
        clock: Arc<ManualClock>,
        hasher: BcryptHasher,
    }

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    async fn harness_with(policy: ResetPolicy, fail_delivery: bool) -> Harness {
        let accounts = MemoryAccountStore::new();
        let challenges = MemoryChallengeStore::new();
        let channel = Arc::new(RecordingChannel {
            fail: fail_delivery,
            ..Default::default()
        });
        let clock = Arc::new(ManualClock::new(start()));
        let hasher = BcryptHasher::new(4);

        accounts
            .insert(User {
                _id: None,
                name: "User".into(),
                email: EMAIL.into(),
                password_hash: hasher.hash("original-secret").unwrap(),
                role: Default::default(),
                created_at: start(),
                updated_at: start(),
            })
            .await
            .unwrap();

        let service = PasswordResetService::new(
            Arc::new(accounts.clone()),
            Arc::new(challenges.clone()),
            channel.clone(),
            Arc::new(hasher.clone()),
            clock.clone(),
            policy,
        );

        Harness {
            service,
            accounts,
            challenges,
            channel,
            clock,
            hasher,
        }
    }

    async fn harness() -> Harness {
        harness_with(ResetPolicy::default(), false).await
    }

    /// Stores `next` right after the first `find` returns, the way a request
    /// landing between a read and its follow-up write would.
    struct SupersedingStore {
        inner: MemoryChallengeStore,
        next: Mutex<Option<OtpChallenge>>,
    }

    #[async_trait]
    impl ChallengeStore for SupersedingStore {
        async fn replace(&self, challenge: &OtpChallenge) -> Result<Option<OtpChallenge>> {
            self.inner.replace(challenge).await
        }

        async fn find(&self, identifier: &str) -> Result<Option<OtpChallenge>> {
            let found = self.inner.find(identifier).await?;
            if let Some(next) = self.next.lock().await.take() {
                self.inner.replace(&next).await?;
            }
            Ok(found)
        }

        async fn mark_consumed(&self, read: &OtpChallenge) -> Result<bool> {
            self.inner.mark_consumed(read).await
        }

        async fn record_failed_attempt(&self, read: &OtpChallenge) -> Result<Option<u32>> {
            self.inner.record_failed_attempt(read).await
        }

        async fn take_consumed(&self, identifier: &str) -> Result<Option<OtpChallenge>> {
            self.inner.take_consumed(identifier).await
        }

        async fn remove_exact(&self, read: &OtpChallenge) -> Result<bool> {
            self.inner.remove_exact(read).await
        }

        async fn purge_expired(
            &self,
            unverified_before: DateTime<Utc>,
            verified_before: DateTime<Utc>,
        ) -> Result<u64> {
            self.inner
                .purge_expired(unverified_before, verified_before)
                .await
        }
    }

    /// A service over the harness stores that sees `stale` on its next read
    /// while `fresh` has already replaced it.
    async fn racing_service(
        h: &Harness,
        policy: ResetPolicy,
        stale: OtpChallenge,
        fresh: OtpChallenge,
    ) -> PasswordResetService {
        h.challenges.replace(&stale).await.unwrap();
        let store = SupersedingStore {
            inner: h.challenges.clone(),
            next: Mutex::new(Some(fresh)),
        };

        PasswordResetService::new(
            Arc::new(h.accounts.clone()),
            Arc::new(store),
            h.channel.clone(),
            Arc::new(h.hasher.clone()),
            h.clock.clone(),
            policy,
        )
    }

    fn issued(code: &str, at: DateTime<Utc>) -> OtpChallenge {
        OtpChallenge::new(EMAIL, code, at, Duration::minutes(10))
    }

    fn wrong_code(code: &str) -> String {
        if code == "000000" {
            "111111".into()
        } else {
            "000000".into()
        }
    }

    #[test]
    fn generated_codes_are_fixed_width_digits() {
        for _ in 0..200 {
            let code = generate_otp(6);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
        assert_eq!(generate_otp(8).len(), 8);
    }

    #[test]
    fn regenerates_until_code_differs_from_previous() {
        let mut script = ["111111", "111111", "222222"].into_iter();
        let mut draws = 0;
        let code = distinct_code(Some("111111"), || {
            draws += 1;
            script.next().unwrap().to_string()
        });

        assert_eq!(code, "222222");
        assert_eq!(draws, 3);
        assert_eq!(distinct_code(None, || "111111".to_string()), "111111");
    }

    #[test]
    fn identifiers_are_normalized() {
        assert_eq!(normalize_identifier("  User@Example.COM "), "user@example.com");
    }

    #[tokio::test]
    async fn verify_without_request_is_not_found() {
        let h = harness().await;
        let result = h.service.verify_challenge(EMAIL, "123456").await;
        assert!(matches!(result, Err(AppError::OtpNotFound)));
    }

    #[tokio::test]
    async fn unknown_identifier_succeeds_without_side_effects() {
        let h = harness().await;
        h.service.request_challenge("ghost@example.com").await.unwrap();

        assert!(h.challenges.is_empty().await);
        assert_eq!(h.channel.count().await, 0);
    }

    #[tokio::test]
    async fn full_reset_flow() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;

        let stored = h.challenges.find(EMAIL).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, start() + Duration::minutes(10));
        assert!(!stored.consumed);

        assert!(matches!(
            h.service.verify_challenge(EMAIL, &wrong_code(&code)).await,
            Err(AppError::InvalidOtp)
        ));
        assert!(!h.challenges.find(EMAIL).await.unwrap().unwrap().consumed);

        h.service.verify_challenge(EMAIL, &code).await.unwrap();
        h.service.commit_new_password(EMAIL, "hunter2").await.unwrap();

        assert!(matches!(
            h.service.commit_new_password(EMAIL, "hunter2").await,
            Err(AppError::NoVerifiedChallenge)
        ));
        assert!(h.challenges.is_empty().await);

        let user = h.accounts.find_by_email(EMAIL).await.unwrap().unwrap();
        assert!(h.hasher.verify("hunter2", &user.password_hash).unwrap());
        assert!(!h.hasher.verify("original-secret", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn second_request_supersedes_first() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let first = h.channel.last_code().await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let second = h.channel.last_code().await;

        assert_ne!(first, second);
        assert!(matches!(
            h.service.verify_challenge(EMAIL, &first).await,
            Err(AppError::InvalidOtp)
        ));
        h.service.verify_challenge(EMAIL, &second).await.unwrap();
    }

    #[tokio::test]
    async fn re_verification_is_idempotent_until_commit() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;

        h.service.verify_challenge(EMAIL, &code).await.unwrap();
        h.service.verify_challenge(EMAIL, &code).await.unwrap();
        h.service.commit_new_password(EMAIL, "hunter2").await.unwrap();

        assert!(matches!(
            h.service.verify_challenge(EMAIL, &code).await,
            Err(AppError::OtpNotFound)
        ));
    }

    #[tokio::test]
    async fn expired_challenge_fails_then_disappears() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;

        h.clock.advance(Duration::minutes(10) + Duration::seconds(1));

        assert!(matches!(
            h.service.verify_challenge(EMAIL, &code).await,
            Err(AppError::OtpExpired)
        ));
        assert!(matches!(
            h.service.verify_challenge(EMAIL, &code).await,
            Err(AppError::OtpNotFound)
        ));
    }

    #[tokio::test]
    async fn expiry_wins_over_wrong_code() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;

        h.clock.advance(Duration::minutes(11));
        assert!(matches!(
            h.service.verify_challenge(EMAIL, &wrong_code(&code)).await,
            Err(AppError::OtpExpired)
        ));
    }

    #[tokio::test]
    async fn commit_requires_verification() {
        let h = harness().await;
        assert!(matches!(
            h.service.commit_new_password(EMAIL, "hunter2").await,
            Err(AppError::NoVerifiedChallenge)
        ));

        h.service.request_challenge(EMAIL).await.unwrap();
        assert!(matches!(
            h.service.commit_new_password(EMAIL, "hunter2").await,
            Err(AppError::NoVerifiedChallenge)
        ));
        assert!(h.challenges.find(EMAIL).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn weak_secret_is_rejected_without_consuming_verification() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;
        h.service.verify_challenge(EMAIL, &code).await.unwrap();

        assert!(matches!(
            h.service.commit_new_password(EMAIL, "12345").await,
            Err(AppError::WeakPassword(6))
        ));
        h.service.commit_new_password(EMAIL, "123456").await.unwrap();
    }

    #[tokio::test]
    async fn verified_challenge_lapses_after_reset_window() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;
        h.service.verify_challenge(EMAIL, &code).await.unwrap();

        h.clock.advance(Duration::minutes(21));
        assert!(matches!(
            h.service.commit_new_password(EMAIL, "hunter2").await,
            Err(AppError::NoVerifiedChallenge)
        ));
        assert!(h.challenges.is_empty().await);
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_but_challenge_kept() {
        let h = harness_with(ResetPolicy::default(), true).await;

        assert!(matches!(
            h.service.request_challenge(EMAIL).await,
            Err(AppError::DeliveryFailed(_))
        ));

        let code = h.channel.last_code().await;
        h.service.verify_challenge(EMAIL, &code).await.unwrap();
    }

    #[tokio::test]
    async fn attempt_lockout_invalidates_challenge() {
        let policy = ResetPolicy {
            max_attempts: Some(3),
            ..ResetPolicy::default()
        };
        let h = harness_with(policy, false).await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;
        let wrong = wrong_code(&code);

        for _ in 0..2 {
            assert!(matches!(
                h.service.verify_challenge(EMAIL, &wrong).await,
                Err(AppError::InvalidOtp)
            ));
        }
        assert!(matches!(
            h.service.verify_challenge(EMAIL, &wrong).await,
            Err(AppError::OtpAttemptsExhausted)
        ));
        assert!(matches!(
            h.service.verify_challenge(EMAIL, &code).await,
            Err(AppError::OtpNotFound)
        ));
    }

    #[tokio::test]
    async fn misses_are_unlimited_by_default() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;

        for _ in 0..10 {
            let _ = h.service.verify_challenge(EMAIL, &wrong_code(&code)).await;
        }
        h.service.verify_challenge(EMAIL, &code).await.unwrap();
        assert_eq!(h.challenges.find(EMAIL).await.unwrap().unwrap().attempts, 10);
    }

    #[tokio::test]
    async fn identifier_case_does_not_matter() {
        let h = harness().await;
        h.service.request_challenge(" USER@example.com").await.unwrap();
        let code = h.channel.last_code().await;

        h.service.verify_challenge("user@EXAMPLE.com", &code).await.unwrap();
        h.service.commit_new_password(EMAIL, "hunter2").await.unwrap();
    }

    #[tokio::test]
    async fn purge_drops_only_dead_challenges() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();

        assert_eq!(h.service.purge_expired().await.unwrap(), 0);
        h.clock.advance(Duration::minutes(11));
        assert_eq!(h.service.purge_expired().await.unwrap(), 1);
        assert!(h.challenges.is_empty().await);
    }

    #[tokio::test]
    async fn stale_verify_does_not_consume_a_newer_code() {
        let h = harness().await;
        let service = racing_service(
            &h,
            ResetPolicy::default(),
            issued("111111", start()),
            issued("222222", start() + Duration::seconds(1)),
        )
        .await;

        assert!(matches!(
            service.verify_challenge(EMAIL, "111111").await,
            Err(AppError::InvalidOtp)
        ));

        let stored = h.challenges.find(EMAIL).await.unwrap().unwrap();
        assert_eq!(stored.code, "222222");
        assert!(!stored.consumed);
        assert!(matches!(
            h.service.commit_new_password(EMAIL, "hunter2").await,
            Err(AppError::NoVerifiedChallenge)
        ));

        h.service.verify_challenge(EMAIL, "222222").await.unwrap();
        h.service.commit_new_password(EMAIL, "hunter2").await.unwrap();
    }

    #[tokio::test]
    async fn stale_expiry_keeps_the_newer_code() {
        let h = harness().await;
        let service = racing_service(
            &h,
            ResetPolicy::default(),
            issued("111111", start() - Duration::minutes(11)),
            issued("222222", start()),
        )
        .await;

        assert!(matches!(
            service.verify_challenge(EMAIL, "111111").await,
            Err(AppError::OtpExpired)
        ));
        h.service.verify_challenge(EMAIL, "222222").await.unwrap();
    }

    #[tokio::test]
    async fn stale_miss_is_not_counted_against_the_newer_code() {
        let policy = ResetPolicy {
            max_attempts: Some(1),
            ..ResetPolicy::default()
        };
        let h = harness_with(policy.clone(), false).await;
        let service = racing_service(
            &h,
            policy,
            issued("111111", start()),
            issued("222222", start() + Duration::seconds(1)),
        )
        .await;

        assert!(matches!(
            service.verify_challenge(EMAIL, "333333").await,
            Err(AppError::InvalidOtp)
        ));

        let stored = h.challenges.find(EMAIL).await.unwrap().unwrap();
        assert_eq!(stored.code, "222222");
        assert_eq!(stored.attempts, 0);
        h.service.verify_challenge(EMAIL, "222222").await.unwrap();
    }

    #[tokio::test]
    async fn misses_after_verification_do_not_count() {
        let policy = ResetPolicy {
            max_attempts: Some(1),
            ..ResetPolicy::default()
        };
        let h = harness_with(policy, false).await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;
        h.service.verify_challenge(EMAIL, &code).await.unwrap();

        for _ in 0..3 {
            assert!(matches!(
                h.service.verify_challenge(EMAIL, &wrong_code(&code)).await,
                Err(AppError::InvalidOtp)
            ));
        }
        assert_eq!(h.challenges.find(EMAIL).await.unwrap().unwrap().attempts, 0);
        h.service.commit_new_password(EMAIL, "hunter2").await.unwrap();
    }

    #[tokio::test]
    async fn malformed_code_is_rejected_without_counting() {
        let policy = ResetPolicy {
            max_attempts: Some(1),
            ..ResetPolicy::default()
        };
        let h = harness_with(policy, false).await;
        h.service.request_challenge(EMAIL).await.unwrap();
        let code = h.channel.last_code().await;

        for malformed in ["12ab56", "1234567", "12345"] {
            assert!(matches!(
                h.service.verify_challenge(EMAIL, malformed).await,
                Err(AppError::ValidationError(_))
            ));
        }
        assert_eq!(h.challenges.find(EMAIL).await.unwrap().unwrap().attempts, 0);
        h.service.verify_challenge(EMAIL, &code).await.unwrap();
    }

    #[tokio::test]
    async fn expiry_wins_over_malformed_code() {
        let h = harness().await;
        h.service.request_challenge(EMAIL).await.unwrap();

        h.clock.advance(Duration::minutes(11));
        assert!(matches!(
            h.service.verify_challenge(EMAIL, "12ab56").await,
            Err(AppError::OtpExpired)
        ));
        assert!(h.challenges.is_empty().await);
    }
}
