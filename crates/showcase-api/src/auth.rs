use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};

use showcase_types::api::Claims;

/// Verifies bearer tokens issued by the OAuth front-end.
///
/// Tokens are HS256 JWTs signed with the shared secret. The gateway never
/// talks to the identity provider itself.
pub struct IdentityGateway {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl IdentityGateway {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Claims of a valid, unexpired token that names an email; `None` otherwise.
    pub fn resolve(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) if !data.claims.email.trim().is_empty() => Some(data.claims),
            Ok(data) => {
                warn!("Token for subject '{}' carries no email", data.claims.sub);
                None
            }
            Err(e) => {
                debug!("Token rejected: {}", e);
                None
            }
        }
    }

    /// Signs `claims` with the gateway's key.
    pub fn issue(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(&Header::default(), claims, &self.encoding)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(email: &str, ttl: chrono::Duration) -> Claims {
        Claims {
            sub: "github|42".into(),
            email: email.into(),
            name: Some("Ada".into()),
            picture: None,
            exp: (chrono::Utc::now() + ttl).timestamp() as usize,
        }
    }

    #[test]
    fn issued_token_resolves_to_same_claims() {
        let gateway = IdentityGateway::new("test-secret");
        let token = gateway.issue(&claims("ada@example.com", chrono::Duration::hours(1))).unwrap();

        let resolved = gateway.resolve(&token).unwrap();
        assert_eq!(resolved.email, "ada@example.com");
        assert_eq!(resolved.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = IdentityGateway::new("other-secret")
            .issue(&claims("ada@example.com", chrono::Duration::hours(1)))
            .unwrap();
        assert!(IdentityGateway::new("test-secret").resolve(&token).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let gateway = IdentityGateway::new("test-secret");
        let token = gateway.issue(&claims("ada@example.com", chrono::Duration::hours(-2))).unwrap();
        assert!(gateway.resolve(&token).is_none());
    }

    #[test]
    fn token_without_email_is_rejected() {
        let gateway = IdentityGateway::new("test-secret");
        let token = gateway.issue(&claims("  ", chrono::Duration::hours(1))).unwrap();
        assert!(gateway.resolve(&token).is_none());
        assert!(gateway.resolve("not-a-jwt").is_none());
    }
}
