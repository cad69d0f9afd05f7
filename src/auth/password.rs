//! Argon2id credential hashing with an optional server-side pepper.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::SaltString, Algorithm, Argon2, Params, PasswordHash, PasswordHasher,
    PasswordVerifier, Version,
};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

#[derive(Clone, Debug)]
pub struct CredentialHasher {
    params: Params,
    pepper: Option<SecretString>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CredentialHasher {
    #[must_use]
    pub fn new(pepper: Option<SecretString>) -> Self {
        Self {
            params: Params::default(),
            pepper,
        }
    }

    /// Use explicit Argon2 cost parameters (memory KiB, iterations, lanes).
    ///
    /// # Errors
    /// Returns an error if Argon2 rejects the parameters.
    pub fn with_params(mut self, m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        self.params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|err| anyhow!("invalid Argon2 parameters: {err}"))?;
        Ok(self)
    }

    fn argon2(&self) -> Result<Argon2<'_>> {
        match &self.pepper {
            Some(pepper) => Argon2::new_with_secret(
                pepper.expose_secret().as_bytes(),
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )
            .map_err(|_| anyhow!("failed to initialize Argon2id")),
            None => Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )),
        }
    }

    /// Hash a password into a PHC string.
    ///
    /// # Errors
    /// Returns an error if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| anyhow!("failed to hash password"))?
            .to_string();
        Ok(hash)
    }

    /// Constant-time check of `password` against a stored PHC string.
    #[must_use]
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            warn!("stored credential is not a valid PHC string");
            return false;
        };
        match self.argon2() {
            Ok(argon2) => argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(err) => {
                warn!("cannot verify credential: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap(pepper: Option<&str>) -> Result<CredentialHasher> {
        CredentialHasher::new(pepper.map(|p| SecretString::from(p.to_string()))).with_params(
            8,
            1,
            1,
        )
    }

    #[test]
    fn hash_then_verify() -> Result<()> {
        let hasher = cheap(None)?;
        let hash = hasher.hash("secret1")?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret1", &hash));
        assert!(!hasher.verify("secret2", &hash));
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let hasher = cheap(None)?;
        assert_ne!(hasher.hash("secret1")?, hasher.hash("secret1")?);
        Ok(())
    }

    #[test]
    fn pepper_is_required_to_verify() -> Result<()> {
        let peppered = cheap(Some("pepper"))?;
        let hash = peppered.hash("secret1")?;
        assert!(peppered.verify("secret1", &hash));
        assert!(!cheap(None)?.verify("secret1", &hash));
        Ok(())
    }

    #[test]
    fn plaintext_is_never_accepted_as_hash() -> Result<()> {
        let hasher = cheap(None)?;
        assert!(!hasher.verify("secret1", "secret1"));
        Ok(())
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert!(CredentialHasher::default().with_params(1, 0, 1).is_err());
    }
}
