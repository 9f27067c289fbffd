/// Credential material: password hashing and API token minting
pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{generate_token, is_well_formed, token_digest};
