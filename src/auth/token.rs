//! Issues and validates the signed tokens that authenticate a user.
//!
//! Tokens are HS256 JSON Web Tokens whose subject is the username. The issue
//! and expiry times are whole seconds since the Unix epoch.

use std::fmt::Debug;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::Error;

/// The claims carried by a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The username the token was issued to.
    pub sub: String,
    /// When the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// When the token expires, in seconds since the Unix epoch.
    pub exp: i64,
}

/// Signs new tokens and checks existing ones against a shared secret.
///
/// The secret and expiry duration are fixed for the lifetime of the server.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    /// Create a token authority that signs with `secret` and issues tokens
    /// that are valid for `expiry`.
    ///
    /// Sub-second precision in `expiry` is discarded.
    pub fn new(secret: &str, expiry: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::seconds(expiry.whole_seconds()),
        }
    }

    /// Issue a token for `subject` that expires after the configured duration.
    ///
    /// # Errors
    ///
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn issue(&self, subject: &str) -> Result<String, Error> {
        self.issue_at(subject, OffsetDateTime::now_utc())
    }

    /// Issue a token for `subject` as if the current time were `now`.
    pub fn issue_at(&self, subject: &str, now: OffsetDateTime) -> Result<String, Error> {
        let claims = Claims {
            sub: subject.to_owned(),
            iat: now.unix_timestamp(),
            exp: (now + self.expiry).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| Error::TokenCreation(error.to_string()))
    }

    /// Whether `token` was signed with this authority's secret and has not yet expired.
    ///
    /// Never fails, any problem with the token makes it invalid.
    pub fn validate(&self, token: &str) -> bool {
        self.validate_at(token, OffsetDateTime::now_utc())
    }

    /// Whether `token` is valid at the instant `now`.
    ///
    /// A token is valid strictly before its expiry time, there is no leeway.
    pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> bool {
        match self.decode_claims(token) {
            Ok(claims) => now.unix_timestamp() < claims.exp,
            Err(error) => {
                tracing::debug!("Token failed validation: {error}");
                false
            }
        }
    }

    /// Get the subject of `token` after checking its signature.
    ///
    /// Expiry is not checked, callers should call [TokenAuthority::validate] first.
    ///
    /// # Errors
    ///
    /// Returns [Error::MalformedToken] if the token cannot be decoded or its
    /// signature does not match.
    pub fn subject_of(&self, token: &str) -> Result<String, Error> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    /// The lifetime of issued tokens in whole seconds.
    pub fn expiry_seconds(&self) -> i64 {
        self.expiry.whole_seconds()
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit instant in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|error| Error::MalformedToken(error.to_string()))
    }
}
