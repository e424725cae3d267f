//! Authentication Module
//!
//! Identity for the collaborative core. Bearer tokens are verified into a
//! [`Principal`](crate::shared::Principal) and registration lookups go
//! through the [`UserDirectory`](directory::UserDirectory) trait.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs        - Module exports and documentation
//! ├── sessions.rs   - JWT token management
//! ├── directory.rs  - Registered-user lookups
//! └── handlers.rs   - GET /api/auth/me
//! ```
//!
//! Account signup and password login belong to the identity provider and are
//! not served here.
//!
//! # Security
//!
//! - Tokens are HS256 JWTs signed with `JWT_SECRET`
//! - Tokens expire after the configured TTL (30 days by default)
//! - Invalid or missing tokens return 401 (no information leakage)

/// JWT token generation and validation
pub mod sessions;

/// Registered-user lookups
pub mod directory;

/// HTTP handlers for authentication endpoints
pub mod handlers;

// Re-export commonly used types and handlers
pub use directory::{MemoryDirectory, PgDirectory, UserDirectory};
pub use handlers::get_me;
pub use sessions::{Claims, SessionKeys, TokenError};
