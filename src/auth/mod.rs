//! Authentication: credential hashing, lockout and the engine tying them
//! to the user directory.

mod engine;
mod lockout;
mod password;
mod types;

pub use engine::AuthenticationEngine;
pub use lockout::LoginAttemptRecord;
pub use password::CredentialHasher;
pub use types::LoginSuccess;
