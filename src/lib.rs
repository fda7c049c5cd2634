//! Consultancy Portal - billing and M-Pesa payment backend
//!
//! Generates invoices for due subscriptions, starts M-Pesa STK push
//! payments for invoices and donations, and reconciles the gateway's
//! asynchronous callbacks against stored records.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
