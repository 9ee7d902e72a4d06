//! # Rentfolio API Server Library
//!
//! This library provides the identity & session core of the Rentfolio API
//! server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `email`: Outbound email collaborator seam
//! - `error`: Error handling and HTTP response mapping
//! - `services`: Identity, token, and invitation services
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod email;
pub mod error;
pub mod routes;
pub mod services;
