//! Cryptographic helpers: payload encryption at rest and credential hashing.

pub mod credentials;
pub mod payload;

pub use credentials::{AuthCrypto, AuthCryptoError};
pub use payload::{CipherError, PayloadCipher};
