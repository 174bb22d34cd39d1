//! Shared types, errors, and configuration for Tellr.
//!
//! This crate provides common types used across all other crates:
//! - Fixed-point money amounts
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - Bearer token claims and validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};
