//! Typed repositories over the document store
//!
//! Each repository holds a cheap `DocumentStore` handle and runs every
//! operation as one locked read or read-modify-write cycle.

pub mod chirps;
pub mod refresh_tokens;
pub mod users;

pub use chirps::{validate_body, ChirpRepository, SortOrder};
pub use refresh_tokens::RefreshTokenRepository;
pub use users::UserRepository;
