//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - Access token validation (JWT, mock)
//! - `email` - Transactional email (Resend, recording)
//! - `http` - Axum routes, middleware and server
//! - `memory` - In-memory store for tests and local runs
//! - `mpesa` - M-Pesa Daraja STK push gateway (HTTP, mock)
//! - `pdf` - Invoice PDF rendering and logo sources
//! - `postgres` - sqlx repositories

pub mod auth;
pub mod email;
pub mod http;
pub mod memory;
pub mod mpesa;
pub mod pdf;
pub mod postgres;
