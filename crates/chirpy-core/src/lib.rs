//! Chirpy Core Library
//!
//! This crate provides the core of Chirpy, a small micro-blogging backend:
//! short posts ("chirps"), user accounts and login sessions.
//!
//! # Architecture
//!
//! - **Document store**: the whole state is one JSON snapshot file, read and
//!   written under a process-wide lock with atomic file replacement
//! - **Repositories**: typed chirp, user and refresh token operations, each a
//!   single locked read or read-modify-write
//! - **Sessions**: JWT access tokens and persisted refresh tokens
//!
//! # Quick Start
//!
//! ```text
//! let chirpy = Chirpy::open(Config::load()?)?;
//!
//! chirpy.signup("a@x.com", "pw")?;
//! let login = chirpy.login("a@x.com", "pw", None)?;
//! chirpy.post_chirp(&login.token, "hello world")?;
//!
//! let chirps = chirpy.list_chirps(None, SortOrder::Ascending)?;
//! ```
//!
//! # Modules
//!
//! - `service`: the `Chirpy` facade (main entry point)
//! - `store`: locked snapshot access
//! - `repo`: chirp, user and refresh token repositories
//! - `session`: login, refresh, revoke and token validation
//! - `auth`: password hashing, token primitives and profanity masking
//! - `storage`: snapshot codec and file persistence
//! - `models`: persisted records
//! - `config`: application configuration

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repo;
pub mod service;
pub mod session;
pub mod storage;
pub mod store;

pub use auth::{AccessTokens, BcryptHasher, PasswordHasher};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{Chirp, ChirpId, RefreshToken, User, UserId};
pub use repo::{ChirpRepository, RefreshTokenRepository, SortOrder, UserRepository};
pub use service::{Chirpy, LoginResponse, StoreStatus};
pub use session::{Session, SessionManager};
pub use storage::{Snapshot, StorageError};
pub use store::{AccessMode, DocumentStore};
