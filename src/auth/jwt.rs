use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

/// Signing and verification keys plus the session lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub session_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            session_ttl_hours,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }
}

impl JwtKeys {
    /// Sign a session token carrying subject, user id and role.
    pub fn sign(&self, username: &str, uid: i64, role: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: username.to_string(),
            uid,
            role: role.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: (now + self.session_ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(username, uid, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        debug!(username = %data.claims.sub, uid = data.claims.uid, "session token verified");
        Ok(data.claims)
    }

    /// Expiry for the persisted token row, computed at issuance time
    /// independently of the claim embedded in the signature.
    pub fn session_expiry(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc() + self.session_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, ttl: Duration) -> JwtKeys {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl: ttl,
        }
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret", Duration::hours(24));
        let token = keys.sign("alice1", 7, "customer").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, "alice1");
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.role, "customer");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys("dev-secret", Duration::hours(24));
        let mut token = keys.sign("alice1", 7, "customer").expect("sign");
        token.push('x');
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let keys = make_keys("dev-secret", Duration::hours(24));
        let other = make_keys("other-secret", Duration::hours(24));
        let token = keys.sign("alice1", 7, "customer").expect("sign");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_claims() {
        let keys = make_keys("dev-secret", Duration::hours(-1));
        let token = keys.sign("alice1", 7, "customer").expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret", Duration::hours(24));
        assert!(keys.verify("not.a.jwt").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn session_expiry_tracks_ttl() {
        let keys = make_keys("dev-secret", Duration::hours(24));
        let expiry = keys.session_expiry();
        let delta = expiry - OffsetDateTime::now_utc();
        assert!(delta > Duration::hours(23) && delta <= Duration::hours(24));
    }
}
