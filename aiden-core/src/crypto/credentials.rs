use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
};
use hmac::{Hmac, Mac};
use password_hash::Error as PasswordHashError;
use rand::{TryRngCore, rngs::OsRng};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Credential hashing for organisation admins.
///
/// Passwords are hashed with Argon2id over `password || pepper`. Bearer tokens
/// are opaque random strings; only their HMAC-SHA-256 digest (hex) is stored.
#[derive(Debug)]
pub struct AuthCrypto {
    argon2: Argon2<'static>,
    password_pepper: Zeroizing<Vec<u8>>,
    token_key: Zeroizing<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum AuthCryptoError {
    #[error("password pepper must not be empty")]
    EmptyPasswordPepper,
    #[error("token HMAC key must not be empty")]
    EmptyTokenKey,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidArgon2Params(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("random source unavailable: {0}")]
    Random(String),
}

impl From<PasswordHashError> for AuthCryptoError {
    fn from(err: PasswordHashError) -> Self {
        AuthCryptoError::PasswordHash(err.to_string())
    }
}

impl AuthCrypto {
    const MEMORY_KIB: u32 = 64 * 1024;
    const ITERATIONS: u32 = 3;
    const PARALLELISM: u32 = 1;
    const SALT_LENGTH: usize = password_hash::Salt::RECOMMENDED_LENGTH;
    const TOKEN_BYTES: usize = 32;

    pub fn new(
        password_pepper: impl AsRef<[u8]>,
        token_key: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        let params = ParamsBuilder::new()
            .m_cost(Self::MEMORY_KIB)
            .t_cost(Self::ITERATIONS)
            .p_cost(Self::PARALLELISM)
            .output_len(32)
            .build()
            .map_err(|err| {
                AuthCryptoError::InvalidArgon2Params(err.to_string())
            })?;
        Self::with_params(password_pepper, token_key, params)
    }

    /// Cheap Argon2 parameters for tests.
    pub fn for_tests(
        password_pepper: impl AsRef<[u8]>,
        token_key: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        let params = ParamsBuilder::new()
            .m_cost(8)
            .t_cost(1)
            .p_cost(1)
            .build()
            .map_err(|err| {
                AuthCryptoError::InvalidArgon2Params(err.to_string())
            })?;
        Self::with_params(password_pepper, token_key, params)
    }

    pub fn with_params(
        password_pepper: impl AsRef<[u8]>,
        token_key: impl AsRef<[u8]>,
        params: Params,
    ) -> Result<Self, AuthCryptoError> {
        let pepper = password_pepper.as_ref();
        if pepper.is_empty() {
            return Err(AuthCryptoError::EmptyPasswordPepper);
        }
        let key = token_key.as_ref();
        if key.is_empty() {
            return Err(AuthCryptoError::EmptyTokenKey);
        }

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::default(), params),
            password_pepper: Zeroizing::new(pepper.to_vec()),
            token_key: Zeroizing::new(key.to_vec()),
        })
    }

    fn peppered(&self, password: &str) -> Zeroizing<Vec<u8>> {
        let mut material = Zeroizing::new(Vec::with_capacity(
            password.len() + self.password_pepper.len(),
        ));
        material.extend_from_slice(password.as_bytes());
        material.extend_from_slice(&self.password_pepper);
        material
    }

    /// PHC-formatted Argon2id hash with a random salt.
    pub fn hash_password(
        &self,
        password: &str,
    ) -> Result<String, AuthCryptoError> {
        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| AuthCryptoError::Random(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)?;
        let material = self.peppered(password);
        Ok(self.argon2.hash_password(&material, &salt)?.to_string())
    }

    pub fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthCryptoError> {
        let parsed = PasswordHash::new(password_hash)?;
        let material = self.peppered(password);
        Ok(self.argon2.verify_password(&material, &parsed).is_ok())
    }

    /// Fresh opaque bearer token (hex, 256 bits).
    pub fn generate_token(&self) -> Result<String, AuthCryptoError> {
        let mut bytes = Zeroizing::new([0u8; Self::TOKEN_BYTES]);
        OsRng
            .try_fill_bytes(bytes.as_mut_slice())
            .map_err(|err| AuthCryptoError::Random(err.to_string()))?;
        Ok(hex::encode(bytes.as_slice()))
    }

    /// Hex HMAC-SHA-256 digest used as the stored token key.
    pub fn hash_token(&self, token: &str) -> String {
        let mut mac =
            <HmacSha256 as Mac>::new_from_slice(&self.token_key)
                .unwrap_or_else(|_| unreachable!("HMAC accepts any key size"));
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypto() -> AuthCrypto {
        AuthCrypto::for_tests("pepper", "token-key").unwrap()
    }

    #[test]
    fn password_round_trip_respects_pepper() {
        let crypto = crypto();
        let hash = crypto.hash_password("correct horse").unwrap();
        assert!(crypto.verify_password("correct horse", &hash).unwrap());
        assert!(!crypto.verify_password("battery staple", &hash).unwrap());

        let other = AuthCrypto::for_tests("other", "token-key").unwrap();
        assert!(!other.verify_password("correct horse", &hash).unwrap());
    }

    #[test]
    fn tokens_are_random_and_hash_deterministically() {
        let crypto = crypto();
        let a = crypto.generate_token().unwrap();
        let b = crypto.generate_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);

        let digest = crypto.hash_token(&a);
        assert_eq!(digest, crypto.hash_token(&a));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn rejects_empty_secrets() {
        assert!(matches!(
            AuthCrypto::for_tests("", "token"),
            Err(AuthCryptoError::EmptyPasswordPepper)
        ));
        assert!(matches!(
            AuthCrypto::for_tests("pepper", ""),
            Err(AuthCryptoError::EmptyTokenKey)
        ));
    }
}
