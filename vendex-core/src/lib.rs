//! # Vendex Core
//!
//! Core library for the Vendex platform, providing the account domain model,
//! credential storage abstractions, and the registration/login workflows.
//!
//! ## Overview
//!
//! `vendex-core` is the foundation of the Vendex services, offering:
//!
//! - **Account Model**: Users, roles, and the requests that create them
//! - **Session Tokens**: Signed HS256 tokens carrying subject + role claims
//! - **Registration Workflow**: Uniqueness checks, default-role assignment,
//!   confirmation tokens, and verification mail dispatch
//! - **Login Workflow**: Credential verification, enablement gating, and
//!   single-active-token rotation
//! - **Store Abstraction**: Trait-based credential store with PostgreSQL and
//!   in-memory backends
//!
//! ## Feature Flags
//!
//! - `database`: Enables the PostgreSQL store (SQLx support)
//!
//! ## Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`users`]: Account entities and request validation
//! - [`auth`]: Token codec, password crypto, and the auth workflows
//! - [`store`]: Credential store ports and implementations
//! - [`mailer`]: Outbound mail port and gateway client
//!
//! ## Example
//!
//! ```no_run
//! use vendex_core::users::{Gender, RegisterRequest};
//!
//! let request = RegisterRequest {
//!     full_name: "Alice Smith".to_string(),
//!     email: "alice@example.com".to_string(),
//!     username: "alice99".to_string(),
//!     password: "Str0ng@pass".to_string(),
//!     gender: Gender::Female,
//! };
//! assert!(request.validate().is_ok());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Common API types used across the Vendex services
pub mod api_types;

/// Token codec, password crypto, and the registration/login workflows
pub mod auth;

/// Error types shared by the store implementations
pub mod error;

/// Outbound mail port and gateway client
pub mod mailer;

/// Credential store ports and implementations
pub mod store;

/// Account entities and request validation
pub mod users;

#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
