/// Authentication service
///
/// Resolves bearer tokens to actors and runs the username/password token
/// exchange. Argon2 work is pushed onto the blocking pool.
use crate::db::CredentialStore;
use crate::error::{AppError, Result};
use crate::middleware::BearerCredentials;
use crate::models::Actor;
use crate::security::{generate_token, hash_password, is_well_formed, token_digest, verify_password};
use std::sync::Arc;

const LOGIN_FAILED: &str = "Unable to log in with provided credentials.";

pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
}

impl AuthService {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }

    /// Resolve a raw token to its owner. Unknown and malformed tokens are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, token: &str) -> Result<Actor> {
        if !is_well_formed(token) {
            return Err(AppError::Unauthorized);
        }

        self.credentials
            .actor_for_token(&token_digest(token))
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Turn request credentials into an optional actor. A missing header is
    /// anonymous; a header that is present but unusable is rejected outright.
    pub async fn identify(&self, credentials: &BearerCredentials) -> Result<Option<Actor>> {
        match credentials {
            BearerCredentials::Missing => Ok(None),
            BearerCredentials::Malformed => Err(AppError::Unauthorized),
            BearerCredentials::Token(token) => self.authenticate(token).await.map(Some),
        }
    }

    /// Exchange a username and password for a freshly minted token. The
    /// user's previous token stops working.
    pub async fn obtain_token(&self, username: &str, password: &str) -> Result<String> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(LOGIN_FAILED.to_string()));
        }

        let Some(login) = self.credentials.find_login(username).await? else {
            tracing::debug!(username, "token exchange for unknown user");
            return Err(AppError::Validation(LOGIN_FAILED.to_string()));
        };

        let password = password.to_string();
        let stored_hash = login.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await?;

        match verified {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(user_id = login.actor.id, "token exchange with wrong password");
                return Err(AppError::Validation(LOGIN_FAILED.to_string()));
            }
            Err(e) => {
                tracing::warn!(user_id = login.actor.id, error = %e, "stored password hash unusable");
                return Err(AppError::Validation(LOGIN_FAILED.to_string()));
            }
        }

        let token = generate_token();
        self.credentials
            .store_token(login.actor.id, &token_digest(&token))
            .await?;

        tracing::info!(user_id = login.actor.id, "api token issued");
        Ok(token)
    }

    /// Create a user with an argon2-hashed password.
    pub async fn register(&self, username: &str, password: &str) -> Result<Actor> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation(
                "username: This field may not be blank.".to_string(),
            ));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
        let actor = self.credentials.create_user(username, &password_hash).await?;

        tracing::info!(user_id = actor.id, "user registered");
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn token_exchange_rotates_token() {
        let auth = service();
        let alice = auth.register("alice", "s3cret-pass").await.unwrap();

        let token = auth.obtain_token("alice", "s3cret-pass").await.unwrap();
        assert!(is_well_formed(&token));
        assert_eq!(auth.authenticate(&token).await.unwrap(), alice);

        let second = auth.obtain_token("alice", "s3cret-pass").await.unwrap();
        assert_ne!(token, second);
        assert_eq!(auth.authenticate(&second).await.unwrap(), alice);
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn bad_credentials_are_a_validation_error() {
        let auth = service();
        auth.register("alice", "s3cret-pass").await.unwrap();

        for (username, password) in [("alice", "wrong"), ("nobody", "s3cret-pass"), ("alice", "")] {
            assert!(matches!(
                auth.obtain_token(username, password).await,
                Err(AppError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn identify_distinguishes_missing_from_invalid() {
        let auth = service();
        assert_eq!(auth.identify(&BearerCredentials::Missing).await.unwrap(), None);
        assert!(matches!(
            auth.identify(&BearerCredentials::Malformed).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            auth.identify(&BearerCredentials::Token("not-a-token".into())).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            auth.identify(&BearerCredentials::Token(generate_token())).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let auth = service();
        auth.register("alice", "one").await.unwrap();
        assert!(matches!(
            auth.register("alice", "two").await,
            Err(AppError::Conflict(_))
        ));
    }
}
