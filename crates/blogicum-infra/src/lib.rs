//! # Blogicum Infrastructure
//!
//! Concrete implementations of the ports defined in `blogicum-core`:
//! the entity store, identity handles, password hashing and clocks.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL entity store via SeaORM
//! - `minimal` - No external dependencies, in-memory store only

pub mod auth;
pub mod clock;
pub mod database;
pub mod memory;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use clock::{ManualClock, SystemClock};
pub use database::DatabaseConfig;
pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use database::postgres_repositories;
