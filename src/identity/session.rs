//! Stateless session tokens: HS256-signed JWTs carrying the session user and an expiry.
//!
//! The codec owns the signing secret; it is the only thing in the crate able to mint or
//! check a token. There is no server-side session table and no revocation list: a token
//! is valid iff its signature matches and the current time is before `exp`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::principal::{Role, SessionUser};
use crate::config::{session_secs, AuthConfig};
use crate::error::AuthError;

/// Claims embedded in a session token. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn user(&self) -> SessionUser {
        SessionUser { email: self.email.clone(), name: self.name.clone(), role: self.role }
    }
}

/// Opaque signed token as carried in the `session` cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_string(self) -> String { self.0 }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionCodec {
    pub fn from_secret(secret: &str, session_days: f64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingConfiguration("session signing secret is empty".into()));
        }
        let ttl = session_secs(session_days)
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AuthError::MissingConfiguration(format!("invalid session lifetime: {} days", session_days)))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn from_config(cfg: &AuthConfig) -> Result<Self, AuthError> {
        Self::from_secret(&cfg.jwt_secret, cfg.session_days)
    }

    pub fn sign(&self, user: &SessionUser) -> Result<SessionToken, AuthError> {
        self.sign_at(user, Utc::now())
    }

    /// Sign with an explicit issue time; `exp = now + ttl`.
    pub fn sign_at(&self, user: &SessionUser, now: DateTime<Utc>) -> Result<SessionToken, AuthError> {
        let claims = SessionClaims {
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let raw = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(SessionToken(raw))
    }

    pub fn verify(&self, token: &str) -> Result<SessionUser, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionUser, AuthError> {
        self.verify_claims_at(token, now).map(|c| c.user())
    }

    /// Check signature then expiry against `now`, returning the full claim set.
    pub fn verify_claims_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is compared against the caller's clock below
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);
        let data = decode::<SessionClaims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::MalformedToken,
        })?;
        if now.timestamp() >= data.claims.exp {
            return Err(AuthError::Expired);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SessionUser {
        SessionUser { email: "a@x.com".into(), name: "A".into(), role: Role::Admin }
    }

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(matches!(SessionCodec::from_secret("", 7.0), Err(AuthError::MissingConfiguration(_))));
        assert!(SessionCodec::from_secret("secret", 0.0).is_err());
    }

    #[test]
    fn sign_then_verify_reproduces_user() {
        let codec = SessionCodec::from_secret("secret", 7.0).unwrap();
        for u in [
            user(),
            SessionUser { email: "b@x.com".into(), name: "Beatriz Ção".into(), role: Role::ReadOnly },
        ] {
            let tok = codec.sign(&u).unwrap();
            assert_eq!(codec.verify(tok.as_str()).unwrap(), u);
        }
    }

    #[test]
    fn claims_carry_issue_and_expiry() {
        let codec = SessionCodec::from_secret("secret", 7.0).unwrap();
        let now = fixed_now();
        let tok = codec.sign_at(&user(), now).unwrap();
        let claims = codec.verify_claims_at(tok.as_str(), now).unwrap();
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 7 * 86400);
    }

    #[test]
    fn expiry_boundary() {
        let codec = SessionCodec::from_secret("secret", 7.0).unwrap();
        let now = fixed_now();
        let tok = codec.sign_at(&user(), now).unwrap();
        let lifetime = Duration::days(7);
        assert!(codec.verify_at(tok.as_str(), now + lifetime - Duration::seconds(1)).is_ok());
        assert_eq!(codec.verify_at(tok.as_str(), now + lifetime + Duration::seconds(1)), Err(AuthError::Expired));
        assert_eq!(codec.verify_at(tok.as_str(), now + lifetime), Err(AuthError::Expired));
    }

    #[test]
    fn fractional_lifetime() {
        let codec = SessionCodec::from_secret("secret", 0.5).unwrap();
        let now = fixed_now();
        let claims = codec.verify_claims_at(codec.sign_at(&user(), now).unwrap().as_str(), now).unwrap();
        assert_eq!(claims.exp - claims.iat, 43200);
    }

    #[test]
    fn altered_signature_is_rejected() {
        let codec = SessionCodec::from_secret("secret", 7.0).unwrap();
        let tok = codec.sign(&user()).unwrap().into_string();
        let sig_start = tok.rfind('.').unwrap() + 1;
        for pos in [sig_start, sig_start + 10, tok.len() - 1] {
            let mut bytes = tok.clone().into_bytes();
            bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
            let forged = String::from_utf8(bytes).unwrap();
            assert_eq!(codec.verify(&forged), Err(AuthError::InvalidSignature), "pos {}", pos);
        }
    }

    #[test]
    fn other_secret_cannot_forge() {
        let mine = SessionCodec::from_secret("secret", 7.0).unwrap();
        let theirs = SessionCodec::from_secret("not-the-secret", 7.0).unwrap();
        let forged = theirs.sign(&user()).unwrap();
        assert_eq!(mine.verify(forged.as_str()), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn altered_claims_are_rejected() {
        let codec = SessionCodec::from_secret("secret", 7.0).unwrap();
        let reader = SessionUser { email: "r@x.com".into(), name: "R".into(), role: Role::ReadOnly };
        let admin = SessionUser { email: "r@x.com".into(), name: "R".into(), role: Role::Admin };
        let real = codec.sign(&reader).unwrap().into_string();
        let other = codec.sign(&admin).unwrap().into_string();
        // splice the admin payload onto the reader signature
        let mut real_parts = real.split('.');
        let mut other_parts = other.split('.');
        let header = real_parts.next().unwrap();
        let _ = real_parts.next();
        let sig = real_parts.next().unwrap();
        let _ = other_parts.next();
        let payload = other_parts.next().unwrap();
        let spliced = format!("{}.{}.{}", header, payload, sig);
        assert_eq!(codec.verify(&spliced), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = SessionCodec::from_secret("secret", 7.0).unwrap();
        assert_eq!(codec.verify("not-a-token"), Err(AuthError::MalformedToken));
        assert_eq!(codec.verify(""), Err(AuthError::MalformedToken));
    }

    #[test]
    fn debug_redacts_token() {
        let codec = SessionCodec::from_secret("secret", 7.0).unwrap();
        let tok = codec.sign(&user()).unwrap();
        assert_eq!(format!("{:?}", tok), "SessionToken(<redacted>)");
    }
}
