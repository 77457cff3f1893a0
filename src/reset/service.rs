use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{error, warn};
use subtle::ConstantTimeEq;
use tokio::time::timeout;

use crate::database::RedisService;
use crate::identity::service::IdentityDirectory;
use crate::reset::model::Challenge;
use crate::reset::store::OtpStore;
use crate::utils::error::CustomError;
use crate::utils::helpers::{OTP_EXPIRATION_MINUTES, generate_otp_code};
use crate::utils::validation::{validate_email, validate_new_password};

/// Out-of-band delivery of a reset code. Best-effort: the challenge is
/// stored before delivery and stays valid when delivery fails.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, email: &str, code: &str) -> Result<(), String>;
}

/// Max OTP requests per email within the rate limit window
pub const OTP_REQUEST_LIMIT: u64 = 5;
/// Rate limit window in seconds
pub const OTP_REQUEST_WINDOW_SECS: u64 = 3600;

const DELIVERY_TIMEOUT_SECS: u64 = 5;

pub struct PasswordResetService {
    store: Arc<dyn OtpStore>,
    directory: Arc<dyn IdentityDirectory>,
    notifier: Arc<dyn Notifier>,
    limiter: Option<RedisService>,
}

impl PasswordResetService {
    pub fn new(
        store: Arc<dyn OtpStore>,
        directory: Arc<dyn IdentityDirectory>,
        notifier: Arc<dyn Notifier>,
        limiter: Option<RedisService>,
    ) -> Self {
        PasswordResetService {
            store,
            directory,
            notifier,
            limiter,
        }
    }

    /// Issue a reset challenge: store a fresh code for the account and send
    /// it out-of-band. Any prior pending code for the email is replaced.
    pub async fn request_otp(&self, email: &str) -> Result<(), CustomError> {
        if email.is_empty() {
            return Err(CustomError::BadRequestError("Email is required.".into()));
        }
        validate_email(email)?;

        if let Some(limiter) = &self.limiter {
            let key = format!("otp:{}", email);
            match limiter
                .is_rate_limited(&key, OTP_REQUEST_LIMIT, OTP_REQUEST_WINDOW_SECS)
                .await
            {
                Ok(true) => {
                    return Err(CustomError::TooManyRequestsError(
                        "Too many OTP requests. Try again later.".into(),
                    ));
                }
                Ok(false) => {}
                // Fail open: a broken limiter must not block password resets
                Err(e) => warn!("Rate limiter unavailable, allowing request: {}", e),
            }
        }

        let exists = self.directory.exists(email).await.map_err(|e| {
            error!("Account lookup failed: {}", e);
            CustomError::InternalServerError("Unable to send OTP.".into())
        })?;
        if !exists {
            return Err(CustomError::NotFoundError(
                "No account found for this email.".into(),
            ));
        }

        let now = Utc::now();
        let challenge = Challenge {
            email: email.to_string(),
            code: generate_otp_code(),
            created_at: now,
            expires_at: now + Duration::minutes(OTP_EXPIRATION_MINUTES),
        };

        self.store.put(&challenge).await.map_err(|e| {
            error!("Failed to store OTP challenge: {}", e);
            CustomError::InternalServerError("Unable to send OTP.".into())
        })?;

        // Delivery is best-effort and never rolls back the stored challenge.
        // The code itself is never logged.
        match timeout(
            StdDuration::from_secs(DELIVERY_TIMEOUT_SECS),
            self.notifier.deliver(email, &challenge.code),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("OTP delivery to {} failed: {}", email, e),
            Err(_) => warn!("OTP delivery to {} timed out", email),
        }

        Ok(())
    }

    /// Verify a presented code and, on match, set the new credential and
    /// consume the challenge.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), CustomError> {
        if email.is_empty() || otp.is_empty() || new_password.is_empty() {
            return Err(CustomError::BadRequestError("Missing fields.".into()));
        }
        validate_email(email)?;
        validate_new_password(new_password)?;

        let challenge = self
            .store
            .get(email)
            .await
            .map_err(|e| {
                error!("Failed to load OTP challenge: {}", e);
                CustomError::InternalServerError("Failed to reset password.".into())
            })?
            .ok_or_else(|| {
                CustomError::NotFoundError("Invalid or expired OTP request.".into())
            })?;

        // Expired records are left in place; they are unusable from here on
        // and get overwritten by the next request.
        if Utc::now() > challenge.expires_at {
            return Err(CustomError::ExpiredError("OTP has expired.".into()));
        }

        if !bool::from(otp.as_bytes().ct_eq(challenge.code.as_bytes())) {
            // The challenge stays put, so the user can retry until expiry
            return Err(CustomError::ForbiddenError("Incorrect OTP.".into()));
        }

        // Update before consuming: a failed update must leave the challenge
        // usable for a retry with the same code.
        self.directory
            .set_password(email, new_password)
            .await
            .map_err(|e| {
                error!("Password update for {} failed: {}", email, e);
                CustomError::InternalServerError("Failed to reset password.".into())
            })?;

        let consumed = self
            .store
            .delete_if_code_matches(email, &challenge.code)
            .await
            .map_err(|e| {
                error!("Failed to consume OTP challenge: {}", e);
                CustomError::InternalServerError("Failed to reset password.".into())
            })?;
        if consumed.is_none() {
            // A concurrent reset consumed the challenge first
            return Err(CustomError::NotFoundError(
                "Invalid or expired OTP request.".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::reset::fakes::{MemDirectory, MemNotifier, MemStore};

    fn engine(
        store: &Arc<MemStore>,
        directory: &Arc<MemDirectory>,
        notifier: &Arc<MemNotifier>,
    ) -> PasswordResetService {
        PasswordResetService::new(store.clone(), directory.clone(), notifier.clone(), None)
    }

    fn setup() -> (
        Arc<MemStore>,
        Arc<MemDirectory>,
        Arc<MemNotifier>,
        PasswordResetService,
    ) {
        let store = Arc::new(MemStore::new());
        let directory = Arc::new(MemDirectory::with_account("a@x.com", "oldpass1"));
        let notifier = Arc::new(MemNotifier::new());
        let service = engine(&store, &directory, &notifier);
        (store, directory, notifier, service)
    }

    fn different_code(code: &str) -> String {
        if code == "000000" {
            "111111".to_string()
        } else {
            "000000".to_string()
        }
    }

    #[actix_web::test]
    async fn issue_then_reset_succeeds_exactly_once() {
        let (store, directory, notifier, service) = setup();

        service.request_otp("a@x.com").await.unwrap();
        let code = notifier.last_code().unwrap();
        assert_eq!(store.stored_code("a@x.com"), Some(code.clone()));

        service
            .reset_password("a@x.com", &code, "newpass1")
            .await
            .unwrap();
        assert_eq!(
            directory.password_of("a@x.com"),
            Some("newpass1".to_string())
        );
        assert!(!store.contains("a@x.com"));

        // The consumed code must be unusable
        let replay = service.reset_password("a@x.com", &code, "newpass2").await;
        assert!(matches!(replay, Err(CustomError::NotFoundError(_))));
    }

    #[actix_web::test]
    async fn expired_challenge_is_rejected_and_left_in_place() {
        let (store, _directory, _notifier, service) = setup();
        store.insert(Challenge {
            email: "a@x.com".to_string(),
            code: "482913".to_string(),
            created_at: Utc::now() - Duration::minutes(30),
            expires_at: Utc::now() - Duration::minutes(15),
        });

        let result = service.reset_password("a@x.com", "482913", "newpass1").await;
        assert!(matches!(result, Err(CustomError::ExpiredError(_))));
        assert!(store.contains("a@x.com"));
    }

    #[actix_web::test]
    async fn wrong_code_leaves_challenge_retryable() {
        let (store, _directory, notifier, service) = setup();

        service.request_otp("a@x.com").await.unwrap();
        let code = notifier.last_code().unwrap();

        let wrong = different_code(&code);
        let result = service.reset_password("a@x.com", &wrong, "newpass1").await;
        assert!(matches!(result, Err(CustomError::ForbiddenError(_))));
        assert!(store.contains("a@x.com"));

        service
            .reset_password("a@x.com", &code, "newpass1")
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn reissue_replaces_previous_code() {
        let (store, _directory, notifier, service) = setup();

        service.request_otp("a@x.com").await.unwrap();
        let first_code = notifier.last_code().unwrap();

        service.request_otp("a@x.com").await.unwrap();
        let second_code = notifier.last_code().unwrap();
        assert_eq!(store.stored_code("a@x.com"), Some(second_code.clone()));

        if first_code != second_code {
            let stale = service
                .reset_password("a@x.com", &first_code, "newpass1")
                .await;
            assert!(matches!(stale, Err(CustomError::ForbiddenError(_))));
        }

        service
            .reset_password("a@x.com", &second_code, "newpass1")
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn short_password_is_rejected_before_store_access() {
        let (store, _directory, _notifier, service) = setup();

        let result = service.reset_password("a@x.com", "482913", "abc").await;
        assert!(matches!(result, Err(CustomError::BadRequestError(_))));
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn missing_fields_are_rejected() {
        let (_store, _directory, _notifier, service) = setup();

        let result = service.request_otp("").await;
        assert!(matches!(result, Err(CustomError::BadRequestError(_))));

        let result = service.reset_password("a@x.com", "", "newpass1").await;
        assert!(matches!(result, Err(CustomError::BadRequestError(_))));
    }

    #[actix_web::test]
    async fn malformed_email_is_rejected() {
        let (_store, _directory, _notifier, service) = setup();

        let result = service.request_otp("not-an-email").await;
        assert!(matches!(result, Err(CustomError::ValidationError(_))));
    }

    #[actix_web::test]
    async fn unknown_account_gets_not_found_and_no_challenge() {
        let (store, _directory, notifier, service) = setup();

        let result = service.request_otp("nobody@x.com").await;
        assert!(matches!(result, Err(CustomError::NotFoundError(_))));
        assert!(!store.contains("nobody@x.com"));
        assert!(notifier.last_code().is_none());
    }

    #[actix_web::test]
    async fn delivery_failure_keeps_challenge_valid() {
        let (store, _directory, notifier, service) = setup();
        notifier.fail.store(true, Ordering::SeqCst);

        service.request_otp("a@x.com").await.unwrap();
        let code = store.stored_code("a@x.com").unwrap();

        service
            .reset_password("a@x.com", &code, "newpass1")
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn failed_credential_update_keeps_challenge_for_retry() {
        let (store, directory, notifier, service) = setup();

        service.request_otp("a@x.com").await.unwrap();
        let code = notifier.last_code().unwrap();

        directory.fail_updates.store(true, Ordering::SeqCst);
        let result = service.reset_password("a@x.com", &code, "newpass1").await;
        assert!(matches!(result, Err(CustomError::InternalServerError(_))));
        assert!(store.contains("a@x.com"));

        directory.fail_updates.store(false, Ordering::SeqCst);
        service
            .reset_password("a@x.com", &code, "newpass1")
            .await
            .unwrap();
        assert!(!store.contains("a@x.com"));
    }

    #[actix_web::test]
    async fn concurrent_consumption_maps_to_not_found() {
        let (store, directory, notifier, service) = setup();

        service.request_otp("a@x.com").await.unwrap();
        let code = notifier.last_code().unwrap();

        // Challenge vanishes between the read and the conditional delete
        store.vanish_on_delete.store(true, Ordering::SeqCst);
        let result = service.reset_password("a@x.com", &code, "newpass1").await;
        assert!(matches!(result, Err(CustomError::NotFoundError(_))));
        // The credential update had already been confirmed at that point
        assert_eq!(
            directory.password_of("a@x.com"),
            Some("newpass1".to_string())
        );
    }
}
