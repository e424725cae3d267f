//! Server Module
//!
//! Initialization and configuration of the Axum HTTP server.
//!
//! # Architecture
//!
//! - **`state`** - Application state structure and `FromRef` implementations
//! - **`config`** - Storage selection and database setup
//! - **`init`** - Server initialization and app creation
//!
//! # Example
//!
//! ```rust,no_run
//! use notecollab::backend::server::create_app;
//! use notecollab::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let app = create_app(config).await?;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Storage configuration
pub mod config;

/// Server initialization
pub mod init;

pub use init::create_app;
pub use state::AppState;
