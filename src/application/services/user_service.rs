//! User identity: signed tokens and on-demand user creation.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::repositories::UrlStorage;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const ID_LEN: usize = 8;
const MAC_LEN: usize = 32;

/// Issues and verifies opaque user tokens.
///
/// A token is the hex encoding of the user id as 8 big-endian bytes followed
/// by the HMAC-SHA256 of those bytes. Nobody without the server-side secret
/// can mint a token for another user id.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Creates a signer with a random 32-byte secret.
    ///
    /// Tokens issued by it stop verifying after a restart.
    pub fn random() -> Self {
        Self::new(rand::random::<[u8; 32]>().to_vec())
    }

    fn mac(&self, id_bytes: &[u8]) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(id_bytes);
        mac
    }

    pub fn sign(&self, user_id: i64) -> String {
        let id_bytes = user_id.to_be_bytes();
        let mut raw = Vec::with_capacity(ID_LEN + MAC_LEN);
        raw.extend_from_slice(&id_bytes);
        raw.extend_from_slice(&self.mac(&id_bytes).finalize().into_bytes());
        hex::encode(raw)
    }

    /// Returns the user id carried by `token` if its signature checks out.
    pub fn verify(&self, token: &str) -> Option<i64> {
        let raw = hex::decode(token).ok()?;
        if raw.len() != ID_LEN + MAC_LEN {
            return None;
        }

        let (id_bytes, tag) = raw.split_at(ID_LEN);
        self.mac(id_bytes).verify_slice(tag).ok()?;

        Some(i64::from_be_bytes(id_bytes.try_into().ok()?))
    }
}

/// Result of [`UserService::resolve_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub user_id: i64,
    pub token: String,
    /// True when `token` was just issued and must be handed to the client.
    pub issued: bool,
}

/// Maps request tokens to user ids, creating users when needed.
pub struct UserService {
    storage: Arc<dyn UrlStorage>,
    signer: TokenSigner,
}

impl UserService {
    pub fn new(storage: Arc<dyn UrlStorage>, signer: TokenSigner) -> Self {
        Self { storage, signer }
    }

    /// Identifies the caller without creating anything.
    pub fn resolve(&self, token: Option<&str>) -> Option<i64> {
        token.and_then(|token| self.signer.verify(token))
    }

    /// Identifies the caller, creating a new user when the token is missing
    /// or does not verify.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the storage cannot create a user.
    pub async fn resolve_or_create(&self, token: Option<&str>) -> Result<ResolvedUser, AppError> {
        if let Some(token) = token
            && let Some(user_id) = self.signer.verify(token)
        {
            return Ok(ResolvedUser {
                user_id,
                token: token.to_string(),
                issued: false,
            });
        }

        let (user_id, token) = self.create_user().await?;
        Ok(ResolvedUser {
            user_id,
            token,
            issued: true,
        })
    }

    /// Creates a user and signs a token for it.
    pub async fn create_user(&self) -> Result<(i64, String), AppError> {
        let user_id = self.storage.create_user().await?;
        tracing::debug!(user_id, "Created user");
        Ok((user_id, self.signer.sign(user_id)))
    }
}
