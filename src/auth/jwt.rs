use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::error::AuthError;
use crate::models::Claims;

/// Issues and validates the signed tokens callers present on every request.
///
/// Stateless: holds only the keys derived from the process-wide secret and
/// the configured token lifetime. Signature comparison is done by the
/// underlying crypto in constant effort.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        // An expired token must be rejected the second it expires, not after
        // a grace period.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            header: Header::new(Algorithm::HS512),
            validation,
            ttl_secs: ttl_secs as i64,
        }
    }

    /// Build and sign a token for the given subject.
    pub fn issue(
        &self,
        subject: &str,
        role: &str,
        user_id: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            user_id,
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&self.header, &claims, &self.encoding_key)
    }

    /// Verify signature and expiry and return the embedded claims. Any
    /// single failure discards all claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                _ => AuthError::Malformed,
            })
    }
}
