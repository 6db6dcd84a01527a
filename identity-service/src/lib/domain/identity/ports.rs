use async_trait::async_trait;

use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::FederatedProfile;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::SignupCommand;
use crate::domain::identity::models::TokenPair;
use crate::domain::identity::models::UpdateProfileCommand;
use crate::identity::errors::AuthError;

/// Port for authentication and identity operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new identity with password credentials.
    ///
    /// The new identity's role is always `user`; privilege is only granted
    /// later through [`AuthServicePort::update_role`].
    ///
    /// # Returns
    /// Created identity and a fresh token pair
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Store` - Store operation failed
    async fn signup(&self, command: SignupCommand) -> Result<(Identity, TokenPair), AuthError>;

    /// Authenticate with email and password.
    ///
    /// A successful login overwrites any previously stored refresh token:
    /// there is a single active session per identity.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (identical)
    /// * `Store` - Store operation failed
    async fn login(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<(Identity, TokenPair), AuthError>;

    /// Authenticate with a provider-verified federated profile.
    ///
    /// Resolution order: existing identity holding the federated id, then
    /// an existing identity with the same email (which gets the provider id
    /// linked), then a fresh passwordless identity.
    ///
    /// # Errors
    /// * `Store` - Store operation failed
    async fn login_federated(
        &self,
        profile: FederatedProfile,
    ) -> Result<(Identity, TokenPair), AuthError>;

    /// Exchange a refresh token for a new token pair, rotating the stored
    /// token.
    ///
    /// The store match, not signature validity alone, is the revocation
    /// authority: a token rotated away or cleared by logout is dead even
    /// while cryptographically valid. Rotation makes the presented token
    /// single-use. Not safely retryable after a timeout; a prior attempt
    /// may already have rotated the token.
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - Malformed, expired, wrong type, unknown,
    ///   or already rotated
    /// * `Store` - Store operation failed
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// End the session holding this refresh token.
    ///
    /// Idempotent: unknown or already-cleared tokens succeed silently so
    /// the operation leaks nothing about token validity.
    ///
    /// # Errors
    /// * `Store` - Store operation failed
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Retrieve an identity by id.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Store` - Store operation failed
    async fn get_identity(&self, id: &IdentityId) -> Result<Identity, AuthError>;

    /// Update an identity's own profile (email and/or display name).
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `Store` - Store operation failed
    async fn update_profile(
        &self,
        id: &IdentityId,
        command: UpdateProfileCommand,
    ) -> Result<Identity, AuthError>;

    /// List every registered identity (admin operation).
    ///
    /// # Errors
    /// * `Store` - Store operation failed
    async fn list_identities(&self) -> Result<Vec<Identity>, AuthError>;

    /// Change an identity's role (admin operation).
    ///
    /// Tokens issued before the change keep their role snapshot until they
    /// expire; the new role takes effect at the next issuance.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Store` - Store operation failed
    async fn update_role(&self, id: &IdentityId, role: Role) -> Result<Identity, AuthError>;

    /// Delete an identity (admin operation).
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Store` - Store operation failed
    async fn delete_identity(&self, id: &IdentityId) -> Result<(), AuthError>;
}

/// Persistence operations for the identity aggregate.
///
/// The store is the single serialization point for refresh-token rotation;
/// implementations must make [`CredentialStore::update_refresh_token`] an
/// atomic conditional update.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist a new identity.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Store` - Store operation failed
    async fn create(&self, identity: Identity) -> Result<Identity, AuthError>;

    /// Retrieve identity by id.
    ///
    /// # Errors
    /// * `Store` - Store operation failed
    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, AuthError>;

    /// Retrieve identity by normalized email.
    ///
    /// # Errors
    /// * `Store` - Store operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Identity>, AuthError>;

    /// Retrieve identity by federated provider id.
    ///
    /// # Errors
    /// * `Store` - Store operation failed
    async fn find_by_federated_id(
        &self,
        federated_id: &str,
    ) -> Result<Option<Identity>, AuthError>;

    /// Retrieve the identity currently holding this refresh token.
    ///
    /// # Errors
    /// * `Store` - Store operation failed
    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Identity>, AuthError>;

    /// Retrieve all identities.
    ///
    /// # Errors
    /// * `Store` - Store operation failed
    async fn list_all(&self) -> Result<Vec<Identity>, AuthError>;

    /// Atomically replace `current_refresh_token`.
    ///
    /// With `expected_old = Some(t)` the update applies only while the
    /// stored value still equals `t` (compare-and-swap); `None` overwrites
    /// unconditionally. `new = None` clears the token.
    ///
    /// # Returns
    /// Whether the update was applied
    ///
    /// # Errors
    /// * `Store` - Store operation failed
    async fn update_refresh_token(
        &self,
        id: &IdentityId,
        expected_old: Option<String>,
        new: Option<String>,
    ) -> Result<bool, AuthError>;

    /// Update email and/or display name.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `Store` - Store operation failed
    async fn update_profile(
        &self,
        id: &IdentityId,
        email: Option<EmailAddress>,
        name: Option<DisplayName>,
    ) -> Result<Identity, AuthError>;

    /// Attach a federated provider id to an existing identity.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Store` - Provider id already linked elsewhere, or operation failed
    async fn link_federated_id(
        &self,
        id: &IdentityId,
        federated_id: &str,
    ) -> Result<Identity, AuthError>;

    /// Change an identity's role.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Store` - Store operation failed
    async fn update_role(&self, id: &IdentityId, role: Role) -> Result<Identity, AuthError>;

    /// Remove an identity.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Store` - Store operation failed
    async fn delete(&self, id: &IdentityId) -> Result<(), AuthError>;
}
