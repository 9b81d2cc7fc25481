//! Common library for the facility booking services
//!
//! This crate provides the functionality shared by the auth and API
//! services: the data model and its stores, sessions, authorization,
//! booking rules, validation, settings and database connectivity.
//!
//! ```rust,no_run
//! use booking_common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod booking;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod password;
pub mod policy;
pub mod repositories;
pub mod session;
pub mod slots;
pub mod validation;
