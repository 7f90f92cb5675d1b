use std::collections::HashSet;
use std::fmt;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::hmac;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Coordinador,
    Miembro,
    /// Any role issued by the auth service that this API does not gate on.
    #[serde(other)]
    Other,
}

/// Roles allowed to read any member's statistics.
pub const STAFF_ROLES: &[Role] = &[Role::Admin, Role::Coordinador];

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct JwtHeader {
    alg: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    Malformed,
    UnsupportedAlgorithm(String),
    InvalidSignature,
    Expired,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed token"),
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported algorithm {}", alg),
            Self::InvalidSignature => write!(f, "invalid signature"),
            Self::Expired => write!(f, "token expired"),
        }
    }
}

/// Verifies HS256 access tokens issued by the auth service.
pub struct JwtVerifier {
    key: hmac::Key,
}

impl JwtVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_segment), Some(payload_segment), Some(signature_segment), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed);
        };

        let header: JwtHeader = decode_segment(header_segment)?;
        if header.alg != "HS256" {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_segment)
            .map_err(|_| AuthError::Malformed)?;
        let signing_input = &token[..header_segment.len() + 1 + payload_segment.len()];
        hmac::verify(&self.key, signing_input.as_bytes(), &signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let claims: Claims = decode_segment(payload_segment)?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed)
}

/// The authenticated caller of the current request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub roles: HashSet<Role>,
}

impl Session {
    pub fn has_any_role(&self, required: &[Role]) -> bool {
        required.iter().any(|role| self.roles.contains(role))
    }
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            roles: claims
                .roles
                .into_iter()
                .filter(|role| *role != Role::Other)
                .collect(),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = bearer_token(request.headers()).ok_or(WebError::Unauthorized)?;

    let claims = state
        .verifier
        .verify(token, chrono::Utc::now().timestamp())
        .map_err(|e| {
            tracing::warn!("Rejected access token: {}", e);
            WebError::Unauthorized
        })?;

    request.extensions_mut().insert(Session::from(claims));
    Ok(next.run(request).await)
}

pub async fn require_any_role(
    State(required): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let session = request
        .extensions()
        .get::<Session>()
        .ok_or(WebError::Unauthorized)?;

    if !session.has_any_role(required) {
        tracing::warn!(user_id = %session.user_id, "Role check failed");
        return Err(WebError::Forbidden);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::Engine as _;

    pub(crate) const SECRET: &[u8] = b"test-secret";

    pub(crate) fn sign(secret: &[u8], header: &str, payload: &serde_json::Value) -> String {
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload.to_string())
        );
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
        let signature = hmac::sign(&key, signing_input.as_bytes());
        format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature.as_ref()))
    }

    pub(crate) fn token_for(user_id: Uuid, roles: &[&str], exp: i64) -> String {
        sign(
            SECRET,
            r#"{"alg":"HS256","typ":"JWT"}"#,
            &serde_json::json!({
                "sub": user_id,
                "email": "rider@example.com",
                "roles": roles,
                "exp": exp,
            }),
        )
    }

    #[test]
    fn test_valid_token_yields_claims() {
        let user_id = Uuid::new_v4();
        let token = token_for(user_id, &["MIEMBRO"], 2_000);

        let claims = JwtVerifier::new(SECRET).verify(&token, 1_000).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.roles, vec![Role::Miembro]);
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = token_for(Uuid::new_v4(), &["MIEMBRO"], 1_000);
        assert_eq!(
            JwtVerifier::new(SECRET).verify(&token, 1_000).unwrap_err(),
            AuthError::Expired
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = token_for(Uuid::new_v4(), &["ADMIN"], 2_000);
        assert_eq!(
            JwtVerifier::new(b"other-secret")
                .verify(&token, 1_000)
                .unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = token_for(Uuid::new_v4(), &["MIEMBRO"], 2_000);
        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "sub": Uuid::new_v4(),
                "email": "intruder@example.com",
                "roles": ["ADMIN"],
                "exp": 2_000,
            })
            .to_string(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(
            JwtVerifier::new(SECRET).verify(&forged, 1_000).unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let token = sign(
            SECRET,
            r#"{"alg":"none"}"#,
            &serde_json::json!({"sub": Uuid::new_v4(), "exp": 2_000}),
        );
        assert_eq!(
            JwtVerifier::new(SECRET).verify(&token, 1_000).unwrap_err(),
            AuthError::UnsupportedAlgorithm("none".to_string())
        );
    }

    #[test]
    fn test_garbage_rejected() {
        let verifier = JwtVerifier::new(SECRET);
        assert_eq!(verifier.verify("abc", 0).unwrap_err(), AuthError::Malformed);
        assert_eq!(verifier.verify("a.b.c.d", 0).unwrap_err(), AuthError::Malformed);
    }

    #[test]
    fn test_unrecognized_roles_do_not_invalidate_token() {
        let user_id = Uuid::new_v4();
        let token = token_for(user_id, &["MIEMBRO", "TESORERO"], 2_000);

        let claims = JwtVerifier::new(SECRET).verify(&token, 1_000).unwrap();
        assert_eq!(claims.sub, user_id);

        let session = Session::from(claims);
        assert_eq!(session.roles, [Role::Miembro].into_iter().collect());
        assert!(session.has_any_role(&[Role::Miembro]));
        assert!(!session.has_any_role(STAFF_ROLES));
        assert!(!session.has_any_role(&[Role::Other]));
    }

    #[test]
    fn test_has_any_role_is_set_intersection() {
        let session = Session {
            user_id: Uuid::new_v4(),
            roles: [Role::Coordinador].into_iter().collect(),
        };

        assert!(session.has_any_role(STAFF_ROLES));
        assert!(session.has_any_role(&[Role::Miembro, Role::Coordinador]));
        assert!(!session.has_any_role(&[Role::Admin]));
        assert!(!session.has_any_role(&[]));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }
}
