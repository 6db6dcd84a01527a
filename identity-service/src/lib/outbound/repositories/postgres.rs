use std::str::FromStr;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::Role;
use crate::identity::errors::AuthError;
use crate::identity::ports::CredentialStore;

const COLUMNS: &str =
    "id, email, password_hash, name, role, federated_id, current_refresh_token, created_at";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw identities row; reconstructed into the domain type through the
/// validating constructors.
#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    name: String,
    role: String,
    federated_id: Option<String>,
    current_refresh_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl IdentityRow {
    fn try_into_identity(self) -> Result<Identity, AuthError> {
        Ok(Identity {
            id: IdentityId(self.id),
            email: EmailAddress::new(self.email)?,
            password_hash: self.password_hash,
            name: DisplayName::new(self.name)?,
            role: Role::from_str(&self.role)?,
            federated_id: self.federated_id,
            current_refresh_token: self.current_refresh_token,
            created_at: self.created_at,
        })
    }
}

fn store_error(e: sqlx::Error) -> AuthError {
    AuthError::Store(e.to_string())
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create(&self, identity: Identity) -> Result<Identity, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO identities
                (id, email, password_hash, name, role, federated_id, current_refresh_token, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.email.as_str())
        .bind(identity.password_hash.as_deref())
        .bind(identity.name.as_str())
        .bind(identity.role.as_str())
        .bind(identity.federated_id.as_deref())
        .bind(identity.current_refresh_token.as_deref())
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    if db_err.constraint() == Some("identities_email_key") {
                        return AuthError::EmailAlreadyExists(
                            identity.email.as_str().to_string(),
                        );
                    }
                    if db_err.constraint() == Some("identities_federated_id_key") {
                        return AuthError::Store(
                            "federated id already linked to another identity".to_string(),
                        );
                    }
                }
            }
            store_error(e)
        })?;

        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {COLUMNS} FROM identities WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(IdentityRow::try_into_identity).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Identity>, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {COLUMNS} FROM identities WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(IdentityRow::try_into_identity).transpose()
    }

    async fn find_by_federated_id(
        &self,
        federated_id: &str,
    ) -> Result<Option<Identity>, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {COLUMNS} FROM identities WHERE federated_id = $1"
        ))
        .bind(federated_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(IdentityRow::try_into_identity).transpose()
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Identity>, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {COLUMNS} FROM identities WHERE current_refresh_token = $1"
        ))
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(IdentityRow::try_into_identity).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Identity>, AuthError> {
        let rows = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {COLUMNS} FROM identities ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(IdentityRow::try_into_identity)
            .collect()
    }

    async fn update_refresh_token(
        &self,
        id: &IdentityId,
        expected_old: Option<String>,
        new: Option<String>,
    ) -> Result<bool, AuthError> {
        // Single conditional UPDATE: the database row is the serialization
        // point for rotation, so two racing calls cannot both apply.
        let result = match expected_old {
            Some(expected) => {
                sqlx::query(
                    r#"
                    UPDATE identities
                    SET current_refresh_token = $1
                    WHERE id = $2 AND current_refresh_token = $3
                    "#,
                )
                .bind(new)
                .bind(id.0)
                .bind(expected)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE identities
                    SET current_refresh_token = $1
                    WHERE id = $2
                    "#,
                )
                .bind(new)
                .bind(id.0)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(store_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_profile(
        &self,
        id: &IdentityId,
        email: Option<EmailAddress>,
        name: Option<DisplayName>,
    ) -> Result<Identity, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            r#"
            UPDATE identities
            SET email = COALESCE($1, email), name = COALESCE($2, name)
            WHERE id = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(email.as_ref().map(|e| e.as_str().to_string()))
        .bind(name.as_ref().map(|n| n.as_str().to_string()))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("identities_email_key")
                {
                    if let Some(email) = &email {
                        return AuthError::EmailAlreadyExists(email.as_str().to_string());
                    }
                }
            }
            store_error(e)
        })?;

        row.ok_or(AuthError::NotFound(id.to_string()))?
            .try_into_identity()
    }

    async fn link_federated_id(
        &self,
        id: &IdentityId,
        federated_id: &str,
    ) -> Result<Identity, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            r#"
            UPDATE identities
            SET federated_id = $1
            WHERE id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(federated_id)
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("identities_federated_id_key")
                {
                    return AuthError::Store(
                        "federated id already linked to another identity".to_string(),
                    );
                }
            }
            store_error(e)
        })?;

        row.ok_or(AuthError::NotFound(id.to_string()))?
            .try_into_identity()
    }

    async fn update_role(&self, id: &IdentityId, role: Role) -> Result<Identity, AuthError> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            r#"
            UPDATE identities
            SET role = $1
            WHERE id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(role.as_str())
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.ok_or(AuthError::NotFound(id.to_string()))?
            .try_into_identity()
    }

    async fn delete(&self, id: &IdentityId) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
