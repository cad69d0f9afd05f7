use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};

/// Generate an opaque session id: 32 random bytes, URL-safe base64.
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate_session_id() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session id")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}
