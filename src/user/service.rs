//! Identity orchestration: registration, authentication, admin resets.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::crypto::{self, Crypto};
use crate::error::{Result, ServerError};
use crate::policy;
use crate::user::{Role, User, UserStore};

/// Registration input, already parsed but not yet policed.
#[derive(Clone, Debug, Default)]
pub struct Candidate {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub occupation: Option<String>,
    pub preferred_language: Option<String>,
}

const DEFAULT_LANGUAGE: &str = "en";

/// Identity manager.
///
/// One-shot operations; no state is carried between calls.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    crypto: Arc<Crypto>,
    /// Digest verified against when the email is unknown, so lookup misses
    /// and password mismatches cost the same.
    dummy_digest: String,
}

impl IdentityService {
    /// Create a new [`IdentityService`].
    pub fn new(users: Arc<dyn UserStore>, crypto: Arc<Crypto>) -> Result<Self> {
        let dummy_digest =
            crypto.pwd.hash_password(crypto::generate_password())?;

        Ok(Self {
            users,
            crypto,
            dummy_digest,
        })
    }

    /// Register a new user.
    ///
    /// The early duplicate lookup keeps the common case from paying for a
    /// hash; the store's unique index stays the authoritative tie-breaker
    /// under concurrent registrations.
    pub async fn register(&self, candidate: Candidate) -> Result<User> {
        policy::validate_candidate(
            &candidate.password,
            &candidate.full_name,
            candidate.phone.as_deref(),
        )?;

        let email = candidate.email.to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ServerError::Conflict("email"));
        }

        let password_hash = self.crypto.pwd.hash_password(&candidate.password)?;

        let mut user = User {
            id: Uuid::new_v4(),
            student_id: User::generate_student_id(),
            email,
            password_hash,
            full_name: candidate.full_name,
            phone: candidate.phone,
            country: candidate.country,
            occupation: candidate.occupation,
            profile_picture: None,
            role: Role::Student,
            preferred_language: candidate
                .preferred_language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned()),
            email_verified: false,
            profile_completion: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        user.profile_completion = user.calculate_profile_completion();

        self.users.insert(&user).await?;
        Ok(user)
    }

    /// Authenticate with email and password.
    ///
    /// Unknown emails and wrong passwords fail identically; token issuance
    /// stays with the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = email.to_lowercase();

        match self.users.find_by_email(&email).await? {
            Some(user) => {
                if !self.crypto.pwd.verify_password(password, &user.password_hash) {
                    return Err(ServerError::InvalidCredentials);
                }
                Ok(user)
            },
            None => {
                // Burn the same verification work as the found case.
                let _ = self.crypto.pwd.verify_password(password, &self.dummy_digest);
                Err(ServerError::InvalidCredentials)
            },
        }
    }

    /// Replace a user's password wholesale.
    ///
    /// The password policy applies regardless of caller privilege.
    pub async fn reset_password(
        &self,
        user_id: Uuid,
        new_password: &str,
    ) -> Result<User> {
        let mut user = self.find_non_admin(user_id, "cannot reset admin password").await?;

        policy::password_errors(new_password)?;
        user.password_hash = self.crypto.pwd.hash_password(new_password)?;
        self.users.update(&user).await?;

        Ok(user)
    }

    /// Generate a one-time password and set it on the target user.
    ///
    /// The plaintext is returned exactly once and never logged.
    pub async fn generate_password(&self, user_id: Uuid) -> Result<(User, String)> {
        let mut user = self.find_non_admin(user_id, "cannot reset admin password").await?;

        let password = crypto::generate_password();
        user.password_hash = self.crypto.pwd.hash_password(&password)?;
        self.users.update(&user).await?;

        Ok((user, password))
    }

    /// Delete a non-admin user.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let user = self.find_non_admin(user_id, "cannot delete admin users").await?;
        self.users.delete(user.id).await
    }

    async fn find_non_admin(
        &self,
        user_id: Uuid,
        denial: &'static str,
    ) -> Result<User> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ServerError::NotFound("user"))?;

        if user.role == Role::Admin {
            return Err(ServerError::Forbidden(denial));
        }

        Ok(user)
    }
}
