use crate::data_store::UserId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use ring::hmac;
use serde::{Deserialize, Serialize};

/// A client's authenticated session, identifying the user behind a request.
///
/// The token is handed to the client as a string of the form `{payload}.{signature}`, where the
/// payload is the base64-encoded JSON representation of user id and issuing time and the
/// signature is an HMAC-SHA256 of the encoded payload, keyed with the application secret. Thus,
/// the server does not need to store sessions, but can verify each token on its own.
///
/// A valid session token only proves the user's identity. Role and group memberships are looked
/// up by the data store for each request, see
/// [crate::data_store::GroupPlanStoreFacade::get_auth_token_for_session].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionToken {
    user_id: UserId,
    issued_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct SessionTokenPayload {
    uid: UserId,
    iat: i64,
}

impl SessionToken {
    pub fn new(user_id: UserId) -> Self {
        SessionToken {
            user_id,
            issued_at: Utc::now(),
        }
    }

    /// Parse and verify a session token string, as created by [Self::as_string].
    ///
    /// Fails if the string is malformed, the signature does not match the given secret, or the
    /// token has been issued more than `max_age` ago.
    pub fn from_string(
        data: &str,
        secret: &str,
        max_age: std::time::Duration,
    ) -> Result<Self, SessionError> {
        let (encoded_payload, encoded_signature) = data
            .trim()
            .split_once('.')
            .ok_or(SessionError::InvalidTokenFormat)?;
        let signature = URL_SAFE_NO_PAD
            .decode(encoded_signature)
            .map_err(|_| SessionError::InvalidTokenFormat)?;
        hmac::verify(
            &signing_key(secret),
            encoded_payload.as_bytes(),
            &signature,
        )
        .map_err(|_| SessionError::SignatureVerificationFailed)?;

        let payload: SessionTokenPayload = URL_SAFE_NO_PAD
            .decode(encoded_payload)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or(SessionError::InvalidTokenFormat)?;
        let issued_at = DateTime::<Utc>::from_timestamp(payload.iat, 0)
            .ok_or(SessionError::InvalidTokenFormat)?;

        // A negative age (clock skew) cannot be converted and is not considered expired
        if let Ok(age) = (Utc::now() - issued_at).to_std() {
            if age > max_age {
                return Err(SessionError::ExpiredToken);
            }
        }

        Ok(SessionToken {
            user_id: payload.uid,
            issued_at,
        })
    }

    pub fn as_string(&self, secret: &str) -> String {
        let payload = SessionTokenPayload {
            uid: self.user_id,
            iat: self.issued_at.timestamp(),
        };
        let encoded_payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&payload).expect("Session payload should always be serializable"),
        );
        let signature = hmac::sign(&signing_key(secret), encoded_payload.as_bytes());
        format!(
            "{}.{}",
            encoded_payload,
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        )
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

fn signing_key(secret: &str) -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes())
}

#[derive(Debug, PartialEq)]
pub enum SessionError {
    InvalidTokenFormat,
    SignatureVerificationFailed,
    ExpiredToken,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTokenFormat => f.write_str("Session token is malformed"),
            Self::SignatureVerificationFailed => {
                f.write_str("Session token signature is not valid")
            }
            Self::ExpiredToken => f.write_str("Session token has expired"),
        }
    }
}

impl std::error::Error for SessionError {}
