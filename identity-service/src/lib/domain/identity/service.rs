use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenType;
use chrono::Utc;

use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::FederatedProfile;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::SignupCommand;
use crate::domain::identity::models::TokenPair;
use crate::domain::identity::models::UpdateProfileCommand;
use crate::identity::errors::AuthError;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;

/// Domain service orchestrating credential verification and the token
/// lifecycle.
///
/// Stateless between calls: the only mutable state is the identity record
/// in the store, and the only contended field on it is
/// `current_refresh_token`, serialized by the store's conditional update.
pub struct AuthEngine<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    password_hasher: PasswordHasher,
    token_codec: Arc<TokenCodec>,
}

impl<CS> AuthEngine<CS>
where
    CS: CredentialStore,
{
    /// Create a new engine with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential persistence implementation
    /// * `password_hasher` - Configured password hasher
    /// * `token_codec` - Configured token codec (shared with the transport
    ///   layer's access guard)
    pub fn new(store: Arc<CS>, password_hasher: PasswordHasher, token_codec: Arc<TokenCodec>) -> Self {
        Self {
            store,
            password_hasher,
            token_codec,
        }
    }

    fn issue_token_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        let subject = identity.id.to_string();
        let role = identity.role.as_str();

        let access_token = self.token_codec.issue(&subject, role, TokenType::Access)?;
        let refresh_token = self.token_codec.issue(&subject, role, TokenType::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Issue a fresh pair for an existing identity and persist the refresh
    /// token, unconditionally ending any prior session.
    async fn start_session(
        &self,
        mut identity: Identity,
    ) -> Result<(Identity, TokenPair), AuthError> {
        let pair = self.issue_token_pair(&identity)?;

        self.store
            .update_refresh_token(&identity.id, None, Some(pair.refresh_token.clone()))
            .await?;

        identity.current_refresh_token = Some(pair.refresh_token.clone());
        Ok((identity, pair))
    }
}

#[async_trait]
impl<CS> AuthServicePort for AuthEngine<CS>
where
    CS: CredentialStore,
{
    async fn signup(&self, command: SignupCommand) -> Result<(Identity, TokenPair), AuthError> {
        if self.store.find_by_email(&command.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists(
                command.email.as_str().to_string(),
            ));
        }

        let password_hash = self.password_hasher.hash(command.password.as_str())?;

        // Role is pinned to `user`; there is no way to self-escalate at
        // signup.
        let mut identity = Identity {
            id: IdentityId::new(),
            email: command.email,
            password_hash: Some(password_hash),
            name: command.name,
            role: Role::User,
            federated_id: None,
            current_refresh_token: None,
            created_at: Utc::now(),
        };

        let pair = self.issue_token_pair(&identity)?;
        identity.current_refresh_token = Some(pair.refresh_token.clone());

        let created = self.store.create(identity).await?;

        tracing::info!(identity_id = %created.id, "Identity registered");
        Ok((created, pair))
    }

    async fn login(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<(Identity, TokenPair), AuthError> {
        // Unknown email, passwordless (federated-only) account, and wrong
        // password all surface the identical error.
        let identity = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let stored_hash = identity
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        self.start_session(identity).await
    }

    async fn login_federated(
        &self,
        profile: FederatedProfile,
    ) -> Result<(Identity, TokenPair), AuthError> {
        if let Some(identity) = self
            .store
            .find_by_federated_id(&profile.federated_id)
            .await?
        {
            return self.start_session(identity).await;
        }

        if let Some(existing) = self.store.find_by_email(&profile.email).await? {
            // Same email already registered: attach the provider id to it.
            let linked = self
                .store
                .link_federated_id(&existing.id, &profile.federated_id)
                .await?;
            tracing::info!(identity_id = %linked.id, "Federated id linked to existing identity");
            return self.start_session(linked).await;
        }

        let mut identity = Identity {
            id: IdentityId::new(),
            email: profile.email,
            password_hash: None,
            name: profile.name,
            role: Role::User,
            federated_id: Some(profile.federated_id),
            current_refresh_token: None,
            created_at: Utc::now(),
        };

        let pair = self.issue_token_pair(&identity)?;
        identity.current_refresh_token = Some(pair.refresh_token.clone());

        let created = self.store.create(identity).await?;

        tracing::info!(identity_id = %created.id, "Federated identity registered");
        Ok((created, pair))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.token_codec.verify(refresh_token).map_err(|e| {
            tracing::warn!(error = %e, "Refresh token failed verification");
            AuthError::InvalidRefreshToken
        })?;

        if claims.token_type != TokenType::Refresh {
            tracing::warn!("Access token presented for refresh");
            return Err(AuthError::InvalidRefreshToken);
        }

        // The store match is the revocation authority: a token cleared by
        // logout or rotated away is dead even while cryptographically valid.
        let identity = self
            .store
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let pair = self.issue_token_pair(&identity)?;

        // Compare-and-swap against the presented token: of two concurrent
        // rotations at most one applies, the loser sees an invalid token.
        let applied = self
            .store
            .update_refresh_token(
                &identity.id,
                Some(refresh_token.to_string()),
                Some(pair.refresh_token.clone()),
            )
            .await?;

        if !applied {
            return Err(AuthError::InvalidRefreshToken);
        }

        Ok(pair)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        // Unknown tokens succeed silently; a logout endpoint must not act
        // as a token-validity oracle.
        if let Some(identity) = self.store.find_by_refresh_token(refresh_token).await? {
            self.store
                .update_refresh_token(&identity.id, Some(refresh_token.to_string()), None)
                .await?;
        }

        Ok(())
    }

    async fn get_identity(&self, id: &IdentityId) -> Result<Identity, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::NotFound(id.to_string()))
    }

    async fn update_profile(
        &self,
        id: &IdentityId,
        command: UpdateProfileCommand,
    ) -> Result<Identity, AuthError> {
        if command.email.is_none() && command.name.is_none() {
            return self.get_identity(id).await;
        }

        self.store
            .update_profile(id, command.email, command.name)
            .await
    }

    async fn list_identities(&self) -> Result<Vec<Identity>, AuthError> {
        self.store.list_all().await
    }

    async fn update_role(&self, id: &IdentityId, role: Role) -> Result<Identity, AuthError> {
        let updated = self.store.update_role(id, role).await?;

        // Outstanding tokens keep their role snapshot until expiry; the new
        // role is picked up at the next issuance.
        tracing::info!(identity_id = %id, role = %role, "Role updated");
        Ok(updated)
    }

    async fn delete_identity(&self, id: &IdentityId) -> Result<(), AuthError> {
        self.store.delete(id).await?;

        tracing::info!(identity_id = %id, "Identity deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auth::WorkFactor;
    use chrono::Duration;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::identity::models::DisplayName;
    use crate::domain::identity::models::Password;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn create(&self, identity: Identity) -> Result<Identity, AuthError>;
            async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, AuthError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Identity>, AuthError>;
            async fn find_by_federated_id(&self, federated_id: &str) -> Result<Option<Identity>, AuthError>;
            async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Identity>, AuthError>;
            async fn list_all(&self) -> Result<Vec<Identity>, AuthError>;
            async fn update_refresh_token(&self, id: &IdentityId, expected_old: Option<String>, new: Option<String>) -> Result<bool, AuthError>;
            async fn update_profile(&self, id: &IdentityId, email: Option<EmailAddress>, name: Option<DisplayName>) -> Result<Identity, AuthError>;
            async fn link_federated_id(&self, id: &IdentityId, federated_id: &str) -> Result<Identity, AuthError>;
            async fn update_role(&self, id: &IdentityId, role: Role) -> Result<Identity, AuthError>;
            async fn delete(&self, id: &IdentityId) -> Result<(), AuthError>;
        }
    }

    fn cheap_hasher() -> PasswordHasher {
        PasswordHasher::new(WorkFactor {
            memory_kib: 8,
            iterations: 1,
        })
        .expect("valid work factor")
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::minutes(15), Duration::days(7))
    }

    fn engine(store: MockTestCredentialStore) -> AuthEngine<MockTestCredentialStore> {
        AuthEngine::new(Arc::new(store), cheap_hasher(), Arc::new(codec()))
    }

    fn sample_identity(password_hash: Option<String>) -> Identity {
        Identity {
            id: IdentityId::new(),
            email: EmailAddress::new("test@example.com".to_string()).unwrap(),
            password_hash,
            name: DisplayName::new("Test".to_string()).unwrap(),
            role: Role::User,
            federated_id: None,
            current_refresh_token: None,
            created_at: Utc::now(),
        }
    }

    fn signup_command() -> SignupCommand {
        SignupCommand::new(
            EmailAddress::new("test@example.com".to_string()).unwrap(),
            Password::new("pass123".to_string()).unwrap(),
            DisplayName::new("Test".to_string()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_signup_hashes_password_and_pins_user_role() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        store
            .expect_create()
            .withf(|identity| {
                identity.role == Role::User
                    && identity
                        .password_hash
                        .as_deref()
                        .is_some_and(|h| h.starts_with("$argon2"))
                    && identity.current_refresh_token.is_some()
            })
            .times(1)
            .returning(|identity| Ok(identity));

        let engine = engine(store);

        let (identity, pair) = engine
            .signup(signup_command())
            .await
            .expect("signup failed");

        assert_eq!(identity.role, Role::User);
        assert_eq!(
            identity.current_refresh_token.as_deref(),
            Some(pair.refresh_token.as_str())
        );

        // Both tokens decode and are correctly typed
        let verifier = codec();
        let access = verifier.verify(&pair.access_token).unwrap();
        let refresh = verifier.verify(&pair.refresh_token).unwrap();
        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_eq!(access.sub, identity.id.to_string());
        assert_eq!(access.role, "user");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(sample_identity(None))));

        store.expect_create().times(0);

        let engine = engine(store);

        let result = engine.signup(signup_command()).await;
        assert!(matches!(
            result.unwrap_err(),
            AuthError::EmailAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_login_success_overwrites_refresh_token() {
        let hasher = cheap_hasher();
        let hash = hasher.hash("pass123").unwrap();
        let existing = sample_identity(Some(hash));
        let existing_id = existing.id;

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        store
            .expect_update_refresh_token()
            .withf(move |id, old, new| *id == existing_id && old.is_none() && new.is_some())
            .times(1)
            .returning(|_, _, _| Ok(true));

        let engine = engine(store);

        let email = EmailAddress::new("test@example.com".to_string()).unwrap();
        let (identity, pair) = engine.login(&email, "pass123").await.expect("login failed");

        assert_eq!(identity.id, existing_id);
        assert_eq!(
            identity.current_refresh_token.as_deref(),
            Some(pair.refresh_token.as_str())
        );
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let email = EmailAddress::new("test@example.com".to_string()).unwrap();

        // Unknown email
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        let unknown_email = engine(store).login(&email, "pass123").await.unwrap_err();

        // Wrong password
        let hash = cheap_hasher().hash("pass123").unwrap();
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(sample_identity(Some(hash.clone())))));
        let wrong_password = engine(store).login(&email, "wrong99").await.unwrap_err();

        // Federated-only account, no password at all
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(sample_identity(None))));
        let passwordless = engine(store).login(&email, "pass123").await.unwrap_err();

        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(passwordless, AuthError::InvalidCredentials));
        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
        assert_eq!(wrong_password.to_string(), passwordless.to_string());
    }

    #[tokio::test]
    async fn test_login_federated_existing_identity() {
        let mut existing = sample_identity(None);
        existing.federated_id = Some("google:123".to_string());
        let existing_id = existing.id;

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_federated_id()
            .withf(|federated_id| federated_id == "google:123")
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        store
            .expect_update_refresh_token()
            .times(1)
            .returning(|_, _, _| Ok(true));

        let engine = engine(store);

        let profile = FederatedProfile {
            federated_id: "google:123".to_string(),
            email: EmailAddress::new("test@example.com".to_string()).unwrap(),
            name: DisplayName::new("Test".to_string()).unwrap(),
        };

        let (identity, _pair) = engine
            .login_federated(profile)
            .await
            .expect("federated login failed");
        assert_eq!(identity.id, existing_id);
    }

    #[tokio::test]
    async fn test_login_federated_links_by_email() {
        let existing = sample_identity(Some("$argon2id$existing".to_string()));
        let existing_id = existing.id;

        let mut linked = existing.clone();
        linked.federated_id = Some("google:123".to_string());

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_federated_id()
            .times(1)
            .returning(|_| Ok(None));
        store
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        store
            .expect_link_federated_id()
            .withf(move |id, federated_id| *id == existing_id && federated_id == "google:123")
            .times(1)
            .returning(move |_, _| Ok(linked.clone()));
        store
            .expect_update_refresh_token()
            .times(1)
            .returning(|_, _, _| Ok(true));
        store.expect_create().times(0);

        let engine = engine(store);

        let profile = FederatedProfile {
            federated_id: "google:123".to_string(),
            email: EmailAddress::new("test@example.com".to_string()).unwrap(),
            name: DisplayName::new("Test".to_string()).unwrap(),
        };

        let (identity, _pair) = engine
            .login_federated(profile)
            .await
            .expect("federated login failed");
        assert_eq!(identity.id, existing_id);
        assert_eq!(identity.federated_id.as_deref(), Some("google:123"));
    }

    #[tokio::test]
    async fn test_login_federated_creates_passwordless_identity() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_federated_id()
            .times(1)
            .returning(|_| Ok(None));
        store
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        store
            .expect_create()
            .withf(|identity| {
                identity.password_hash.is_none()
                    && identity.federated_id.as_deref() == Some("google:123")
                    && identity.role == Role::User
                    && identity.current_refresh_token.is_some()
            })
            .times(1)
            .returning(|identity| Ok(identity));

        let engine = engine(store);

        let profile = FederatedProfile {
            federated_id: "google:123".to_string(),
            email: EmailAddress::new("new@example.com".to_string()).unwrap(),
            name: DisplayName::new("New".to_string()).unwrap(),
        };

        let (identity, pair) = engine
            .login_federated(profile)
            .await
            .expect("federated login failed");
        assert!(identity.password_hash.is_none());
        assert_eq!(
            identity.current_refresh_token.as_deref(),
            Some(pair.refresh_token.as_str())
        );
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let identity = sample_identity(None);
        let identity_id = identity.id;
        let refresh_token = codec()
            .issue(&identity.id.to_string(), "user", TokenType::Refresh)
            .unwrap();

        let mut store = MockTestCredentialStore::new();
        let stored = identity.clone();
        store
            .expect_find_by_refresh_token()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let presented = refresh_token.clone();
        store
            .expect_update_refresh_token()
            .withf(move |id, old, new| {
                *id == identity_id
                    && old.as_deref() == Some(presented.as_str())
                    && new.as_deref().is_some_and(|n| n != presented)
            })
            .times(1)
            .returning(|_, _, _| Ok(true));

        let engine = engine(store);

        let pair = engine.refresh(&refresh_token).await.expect("refresh failed");
        assert_ne!(pair.refresh_token, refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let access_token = codec()
            .issue(&IdentityId::new().to_string(), "user", TokenType::Access)
            .unwrap();

        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_refresh_token().times(0);

        let engine = engine(store);

        let result = engine.refresh(&access_token).await;
        assert!(matches!(result.unwrap_err(), AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_refresh_rejects_garbage() {
        let store = MockTestCredentialStore::new();
        let engine = engine(store);

        let result = engine.refresh("not.a.token").await;
        assert!(matches!(result.unwrap_err(), AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_refresh_unknown_token() {
        let refresh_token = codec()
            .issue(&IdentityId::new().to_string(), "user", TokenType::Refresh)
            .unwrap();

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_refresh_token()
            .times(1)
            .returning(|_| Ok(None));

        let engine = engine(store);

        let result = engine.refresh(&refresh_token).await;
        assert!(matches!(result.unwrap_err(), AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_refresh_race_loser_observes_invalid_token() {
        let identity = sample_identity(None);
        let refresh_token = codec()
            .issue(&identity.id.to_string(), "user", TokenType::Refresh)
            .unwrap();

        let mut store = MockTestCredentialStore::new();
        let stored = identity.clone();
        store
            .expect_find_by_refresh_token()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        // Another rotation got there first: the conditional update misses
        store
            .expect_update_refresh_token()
            .times(1)
            .returning(|_, _, _| Ok(false));

        let engine = engine(store);

        let result = engine.refresh(&refresh_token).await;
        assert!(matches!(result.unwrap_err(), AuthError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_logout_clears_stored_token() {
        let identity = sample_identity(None);
        let identity_id = identity.id;
        let refresh_token = codec()
            .issue(&identity.id.to_string(), "user", TokenType::Refresh)
            .unwrap();

        let mut store = MockTestCredentialStore::new();
        let stored = identity.clone();
        store
            .expect_find_by_refresh_token()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let presented = refresh_token.clone();
        store
            .expect_update_refresh_token()
            .withf(move |id, old, new| {
                *id == identity_id && old.as_deref() == Some(presented.as_str()) && new.is_none()
            })
            .times(1)
            .returning(|_, _, _| Ok(true));

        let engine = engine(store);

        engine.logout(&refresh_token).await.expect("logout failed");
    }

    #[tokio::test]
    async fn test_logout_unknown_token_is_silent_noop() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_refresh_token()
            .times(1)
            .returning(|_| Ok(None));
        store.expect_update_refresh_token().times(0);

        let engine = engine(store);

        let result = engine.logout("unknown-token").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_get_identity_not_found() {
        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_id().times(1).returning(|_| Ok(None));

        let engine = engine(store);

        let result = engine.get_identity(&IdentityId::new()).await;
        assert!(matches!(result.unwrap_err(), AuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_role_delegates_to_store() {
        let identity = sample_identity(None);
        let identity_id = identity.id;

        let mut promoted = identity.clone();
        promoted.role = Role::Admin;

        let mut store = MockTestCredentialStore::new();
        store
            .expect_update_role()
            .withf(move |id, role| *id == identity_id && *role == Role::Admin)
            .times(1)
            .returning(move |_, _| Ok(promoted.clone()));

        let engine = engine(store);

        let updated = engine
            .update_role(&identity_id, Role::Admin)
            .await
            .expect("update_role failed");
        assert_eq!(updated.role, Role::Admin);
    }
}
