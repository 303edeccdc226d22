use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::authz::Role;
use crate::config::JwtConfig;
use crate::state::AppState;

/// Accepted clock skew between issuer and verifier, in seconds.
const LEEWAY_SECS: u64 = 5;

/// Why a token failed verification. Never sent to clients as-is; the
/// extractor collapses all of these into a uniform 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed token")]
    Malformed,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub remember_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            remember_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::minutes(ttl_minutes),
            remember_ttl: Duration::minutes(remember_ttl_minutes),
        }
    }
}

impl JwtKeys {
    fn sign_with_ttl(&self, user_id: Uuid, role: Role, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.unix_timestamp() as usize,
            exp: (now + ttl).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn sign(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.sign_with_ttl(user_id, role, self.ttl)
    }

    /// "Remember me" variant: same claims, longer window.
    pub fn sign_remember(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.sign_with_ttl(user_id, role, self.remember_ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = LEEWAY_SECS;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, ttl: Duration) -> JwtKeys {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl,
            remember_ttl: Duration::days(14),
        }
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret", Duration::minutes(5));
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, Role::User).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn remember_token_carries_same_claims() {
        let keys = make_keys("dev-secret", Duration::minutes(5));
        let user_id = Uuid::new_v4();
        let token = keys.sign_remember(user_id, Role::Admin).expect("sign remember");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp - claims.iat > 5 * 60);
    }

    #[test]
    fn expired_token_is_classified_as_expired() {
        // TTL far enough in the past to clear the leeway window.
        let keys = make_keys("dev-secret", Duration::minutes(-10));
        let token = keys.sign(Uuid::new_v4(), Role::User).expect("sign");
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn wrong_secret_is_classified_as_invalid_signature() {
        let good = make_keys("secret-one", Duration::minutes(5));
        let bad = make_keys("secret-two", Duration::minutes(5));
        let token = good.sign(Uuid::new_v4(), Role::User).expect("sign");
        assert_eq!(bad.verify(&token).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn garbage_is_classified_as_malformed() {
        let keys = make_keys("dev-secret", Duration::minutes(5));
        assert_eq!(
            keys.verify("definitely.not.a-jwt").unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn issuer_mismatch_is_rejected() {
        let keys = make_keys("dev-secret", Duration::minutes(5));
        let mut other = make_keys("dev-secret", Duration::minutes(5));
        other.issuer = "someone-else".into();
        let token = other.sign(Uuid::new_v4(), Role::User).expect("sign");
        assert!(keys.verify(&token).is_err());
    }
}
