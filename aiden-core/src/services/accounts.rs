use std::{fmt, sync::Arc};

use aiden_model::{OrganisationId, User};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::crypto::AuthCrypto;
use crate::database::ports::{NewUser, OrganisationsRepository, UsersRepository};
use crate::error::{AidenError, Result};
use crate::validation;

const NAME_MAX: usize = 120;
const PASSWORD_MIN: usize = 8;

/// First admin for a newly created organisation.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Successful login. `token` is shown to the client once.
#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub token: String,
    pub user: User,
}

/// Admin registration plus bearer-token sessions.
pub struct AccountService {
    users: Arc<dyn UsersRepository>,
    organisations: Arc<dyn OrganisationsRepository>,
    crypto: Arc<AuthCrypto>,
    token_ttl: Duration,
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService")
            .field("users_repo", &Arc::strong_count(&self.users))
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        organisations: Arc<dyn OrganisationsRepository>,
        crypto: Arc<AuthCrypto>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            organisations,
            crypto,
            token_ttl,
        }
    }

    /// Each organisation gets exactly one admin, created during sign-up.
    pub async fn create_admin(
        &self,
        organisation_id: OrganisationId,
        registration: &AdminRegistration,
    ) -> Result<User> {
        if self
            .organisations
            .get_organisation(organisation_id)
            .await?
            .is_none()
        {
            return Err(AidenError::NotFound(format!(
                "organisation {organisation_id}"
            )));
        }
        if self.users.organisation_has_admin(organisation_id).await? {
            return Err(AidenError::Conflict(
                "Admin already exists for this organisation.".into(),
            ));
        }

        let name = validation::required("name", &registration.name, NAME_MAX)?;
        let email = validation::email("email", &registration.email)?;
        if registration.password.chars().count() < PASSWORD_MIN {
            return Err(AidenError::Validation(format!(
                "password must be at least {PASSWORD_MIN} characters"
            )));
        }
        if registration.password != registration.password_confirmation {
            return Err(AidenError::Validation(
                "password confirmation does not match".into(),
            ));
        }
        if self.users.email_taken(&email).await? {
            return Err(AidenError::Conflict(
                "email has already been taken".into(),
            ));
        }

        let password_hash = self.crypto.hash_password(&registration.password)?;
        let user = self
            .users
            .create_user(&NewUser {
                organisation_id,
                name,
                email,
                password_hash,
            })
            .await?;
        info!(
            target: "aiden::auth",
            user_id = %user.id,
            organisation_id = %organisation_id,
            "organisation admin created"
        );
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession> {
        let email = validation::normalize_email(email);
        let invalid = || AidenError::Unauthorized("Invalid credentials".into());

        let Some((user, password_hash)) =
            self.users.get_credentials(&email).await?
        else {
            return Err(invalid());
        };
        if !self.crypto.verify_password(password, &password_hash)? {
            warn!(target: "aiden::auth", user_id = %user.id, "login rejected");
            return Err(invalid());
        }

        let token = self.crypto.generate_token()?;
        let expires_at = Utc::now() + self.token_ttl;
        self.users
            .store_token(&user, &self.crypto.hash_token(&token), expires_at)
            .await?;
        info!(target: "aiden::auth", user_id = %user.id, "login succeeded");
        Ok(LoginSession { token, user })
    }

    /// Resolve a bearer token to its unexpired user.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let digest = self.crypto.hash_token(token);
        self.users
            .user_for_token(&digest, Utc::now())
            .await?
            .ok_or_else(|| AidenError::Unauthorized("Unauthenticated.".into()))
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.users
            .revoke_token(&self.crypto.hash_token(token))
            .await
    }
}
