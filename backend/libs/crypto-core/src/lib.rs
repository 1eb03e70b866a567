//! Credential primitives shared by Quill services.
//!
//! - `jwt`: HS256 bearer tokens carrying a user id
//! - `password`: Argon2id password hashing
pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtKeys, TokenError};
pub use password::{hash_password, verify_password, PasswordError};
