use std::sync::Arc;

use auth::PasswordHasher;
use auth::TokenCodec;
use auth::WorkFactor;
use chrono::Duration;
use identity_service::config::GoogleConfig;
use identity_service::domain::identity::models::EmailAddress;
use identity_service::domain::identity::models::Role;
use identity_service::domain::identity::service::AuthEngine;
use identity_service::identity::ports::CredentialStore;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::oauth::GoogleOAuthClient;
use identity_service::outbound::repositories::InMemoryCredentialStore;

pub const TEST_JWT_SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

/// Test application serving the real router over the in-memory store
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub store: Arc<InMemoryCredentialStore>,
}

impl TestApp {
    /// Spawn the application on a random port in a background task
    pub async fn spawn() -> Self {
        let store = Arc::new(InMemoryCredentialStore::new());

        // Minimum-cost hashing keeps the suite fast
        let password_hasher = PasswordHasher::new(WorkFactor {
            memory_kib: 8,
            iterations: 1,
        })
        .expect("valid work factor");

        let token_codec = Arc::new(TokenCodec::new(
            TEST_JWT_SECRET,
            Duration::minutes(15),
            Duration::days(7),
        ));

        let auth_engine = Arc::new(AuthEngine::new(
            Arc::clone(&store),
            password_hasher,
            Arc::clone(&token_codec),
        ));

        let google = Arc::new(
            GoogleOAuthClient::new(&GoogleConfig {
                client_id: "test-client".to_string(),
                client_secret: "test-secret".to_string(),
                redirect_url: "http://localhost:8080/api/auth/google/callback".to_string(),
            })
            .expect("valid oauth configuration"),
        );

        let router = create_router(
            auth_engine,
            token_codec,
            google,
            "http://localhost:5173".to_string(),
        );

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server crashed");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            store,
        }
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.patch(format!("{}{}", self.address, path))
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.delete(format!("{}{}", self.address, path))
    }

    /// Promote the identity registered under this email directly in the
    /// store, the way an operator would outside the API.
    pub async fn promote_to_admin(&self, email: &str) {
        let email = EmailAddress::new(email.to_string()).expect("valid email");
        let identity = self
            .store
            .find_by_email(&email)
            .await
            .expect("store lookup failed")
            .expect("identity exists");
        self.store
            .update_role(&identity.id, Role::Admin)
            .await
            .expect("role update failed");
    }
}
