use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::TokenClaims;
use super::claims::TokenType;
use super::errors::TokenError;

/// Signs and verifies self-contained access/refresh tokens.
///
/// Tokens are compact HS256 JWTs carrying [`TokenClaims`], safe for JSON
/// bodies and URL query strings without extra escaping. Verification is
/// pure CPU work with no store round-trip; revocation is therefore only
/// possible at refresh-token granularity, by whoever owns the stored token.
///
/// # Security Notes
/// - The secret should be at least 256 bits (32 bytes) for HS256
/// - Store secrets in environment variables or secure vaults, never in code
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Create a codec with a signing secret and per-kind lifetimes.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `access_ttl` - Lifetime of issued access tokens
    /// * `refresh_ttl` - Lifetime of issued refresh tokens
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue a signed token for a subject.
    ///
    /// # Arguments
    /// * `subject_id` - Identity the token is issued to
    /// * `role` - Role snapshot to embed
    /// * `token_type` - Access or refresh; selects the lifetime
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(
        &self,
        subject_id: &str,
        role: &str,
        token_type: TokenType,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = TokenClaims {
            sub: subject_id.to_string(),
            role: role.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Decode a token, checking signature integrity and expiry.
    ///
    /// Expiry is validated without leeway so `exp` is exact. The two
    /// failure classes stay distinguishable to callers; collapsing them
    /// into one uniform signal is the transport boundary's job.
    ///
    /// # Errors
    /// * `Expired` - The token's `exp` is in the past
    /// * `Invalid` - Signature mismatch or unrecognized structure
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let token_data =
            decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}
