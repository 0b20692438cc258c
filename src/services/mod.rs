// Service exports
pub mod identity;
pub mod postgres;

pub use identity::{IdentityError, Role, SessionClaims, SessionVerifier};
pub use postgres::{PoolQuery, PostgresClient, PostgresError};
