//! Command implementations.

pub mod audit;
pub mod pending;
pub mod schema;

pub use self::audit::execute_audit;
pub use self::pending::execute_pending;
pub use self::schema::execute_schema;
