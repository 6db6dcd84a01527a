use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::Role;
use crate::identity::errors::AuthError;
use crate::identity::ports::CredentialStore;

/// In-memory credential store.
///
/// Honors the same contract as the Postgres implementation, including the
/// conditional refresh-token update (the single mutex makes it atomic).
/// Backs the API test suite; not meant for production use.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    identities: Mutex<HashMap<Uuid, Identity>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Identity>> {
        self.identities.lock().expect("identity map mutex poisoned")
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, identity: Identity) -> Result<Identity, AuthError> {
        let mut identities = self.lock();

        if identities
            .values()
            .any(|existing| existing.email == identity.email)
        {
            return Err(AuthError::EmailAlreadyExists(
                identity.email.as_str().to_string(),
            ));
        }

        if let Some(federated_id) = &identity.federated_id {
            if identities
                .values()
                .any(|existing| existing.federated_id.as_deref() == Some(federated_id))
            {
                return Err(AuthError::Store(
                    "federated id already linked to another identity".to_string(),
                ));
            }
        }

        identities.insert(identity.id.0, identity.clone());
        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, AuthError> {
        Ok(self.lock().get(&id.0).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Identity>, AuthError> {
        Ok(self
            .lock()
            .values()
            .find(|identity| identity.email == *email)
            .cloned())
    }

    async fn find_by_federated_id(
        &self,
        federated_id: &str,
    ) -> Result<Option<Identity>, AuthError> {
        Ok(self
            .lock()
            .values()
            .find(|identity| identity.federated_id.as_deref() == Some(federated_id))
            .cloned())
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Identity>, AuthError> {
        Ok(self
            .lock()
            .values()
            .find(|identity| identity.current_refresh_token.as_deref() == Some(refresh_token))
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Identity>, AuthError> {
        let mut identities: Vec<Identity> = self.lock().values().cloned().collect();
        identities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(identities)
    }

    async fn update_refresh_token(
        &self,
        id: &IdentityId,
        expected_old: Option<String>,
        new: Option<String>,
    ) -> Result<bool, AuthError> {
        let mut identities = self.lock();

        let Some(identity) = identities.get_mut(&id.0) else {
            return Ok(false);
        };

        if let Some(expected) = expected_old {
            if identity.current_refresh_token.as_deref() != Some(expected.as_str()) {
                return Ok(false);
            }
        }

        identity.current_refresh_token = new;
        Ok(true)
    }

    async fn update_profile(
        &self,
        id: &IdentityId,
        email: Option<EmailAddress>,
        name: Option<DisplayName>,
    ) -> Result<Identity, AuthError> {
        let mut identities = self.lock();

        if let Some(new_email) = &email {
            if identities
                .values()
                .any(|existing| existing.id.0 != id.0 && existing.email == *new_email)
            {
                return Err(AuthError::EmailAlreadyExists(
                    new_email.as_str().to_string(),
                ));
            }
        }

        let identity = identities
            .get_mut(&id.0)
            .ok_or(AuthError::NotFound(id.to_string()))?;

        if let Some(new_email) = email {
            identity.email = new_email;
        }
        if let Some(new_name) = name {
            identity.name = new_name;
        }

        Ok(identity.clone())
    }

    async fn link_federated_id(
        &self,
        id: &IdentityId,
        federated_id: &str,
    ) -> Result<Identity, AuthError> {
        let mut identities = self.lock();

        if identities.values().any(|existing| {
            existing.id.0 != id.0 && existing.federated_id.as_deref() == Some(federated_id)
        }) {
            return Err(AuthError::Store(
                "federated id already linked to another identity".to_string(),
            ));
        }

        let identity = identities
            .get_mut(&id.0)
            .ok_or(AuthError::NotFound(id.to_string()))?;

        identity.federated_id = Some(federated_id.to_string());
        Ok(identity.clone())
    }

    async fn update_role(&self, id: &IdentityId, role: Role) -> Result<Identity, AuthError> {
        let mut identities = self.lock();

        let identity = identities
            .get_mut(&id.0)
            .ok_or(AuthError::NotFound(id.to_string()))?;

        identity.role = role;
        Ok(identity.clone())
    }

    async fn delete(&self, id: &IdentityId) -> Result<(), AuthError> {
        self.lock()
            .remove(&id.0)
            .map(|_| ())
            .ok_or(AuthError::NotFound(id.to_string()))
    }
}
