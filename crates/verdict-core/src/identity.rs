//! Caller identities.
//!
//! Every operation in Verdict is attributed to a 32-byte identity.
//! How identities are authenticated (keys, signatures, transport auth)
//! is outside the core's contract — the core only compares them.

use rand::RngCore;
use thiserror::Error;

/// Opaque 32-byte caller identity. Hex-encoded at every external boundary.
pub type Identity = [u8; 32];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity is not valid hex")]
    InvalidHex,
    #[error("identity must be 32 bytes, got {0}")]
    WrongLength(usize),
}

/// Generate a fresh random identity.
///
/// Used by the daemon when no identity is configured, and by tests.
pub fn generate() -> Identity {
    let mut id = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut id);
    id
}

/// Parse a hex-encoded 32-byte identity.
pub fn parse(hex_str: &str) -> Result<Identity, IdentityError> {
    let bytes = hex::decode(hex_str).map_err(|_| IdentityError::InvalidHex)?;
    if bytes.len() != 32 {
        return Err(IdentityError::WrongLength(bytes.len()));
    }
    let mut id = [0u8; 32];
    id.copy_from_slice(&bytes);
    Ok(id)
}

/// Short hex prefix for log fields.
pub fn short(id: &Identity) -> String {
    hex::encode(&id[..8])
}
