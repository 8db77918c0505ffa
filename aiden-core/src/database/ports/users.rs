use aiden_model::{OrganisationId, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub organisation_id: OrganisationId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    async fn organisation_has_admin(
        &self,
        organisation_id: OrganisationId,
    ) -> Result<bool>;

    async fn email_taken(&self, email: &str) -> Result<bool>;

    /// User and stored password hash.
    async fn get_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>>;

    async fn store_token(
        &self,
        user: &User,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Resolve an unexpired token digest.
    async fn user_for_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;

    async fn revoke_token(&self, token_hash: &str) -> Result<()>;
}
