use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthUser};

/// Audience the hosted auth service stamps on user access tokens.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Access-token claims. The provider's own `role` claim is ignored for authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, email: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: sub.into(),
            email,
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Verifies HS256 access tokens locally with the project's JWT secret.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }
        Ok(AuthUser { id: data.claims.sub, email: data.claims.email })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_subject_and_email() {
        let verifier = JwtVerifier::new("test-secret");
        let token = verifier
            .sign(&Claims::new("user-1", Some("ana@oficina.test".into()), Duration::minutes(5)))
            .unwrap();
        let user = verifier.verify(&token).unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email.as_deref(), Some("ana@oficina.test"));
    }

    #[test]
    fn rejects_expired_tokens() {
        let verifier = JwtVerifier::new("test-secret");
        let token = verifier.sign(&Claims::new("user-1", None, Duration::hours(-2))).unwrap();
        assert!(matches!(verifier.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn rejects_foreign_signatures() {
        let token = JwtVerifier::new("other")
            .sign(&Claims::new("user-1", None, Duration::minutes(5)))
            .unwrap();
        assert!(JwtVerifier::new("test-secret").verify(&token).is_err());
    }

    #[test]
    fn rejects_wrong_audience() {
        let verifier = JwtVerifier::new("test-secret");
        let mut claims = Claims::new("user-1", None, Duration::minutes(5));
        claims.aud = "anon".into();
        let token = verifier.sign(&claims).unwrap();
        assert!(verifier.verify(&token).is_err());
    }
}
