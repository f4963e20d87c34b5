//! Promptshare - prompt sharing API
//!
//! This crate implements a small prompt sharing HTTP API guarded by an
//! in-process sliding-window rate limiter. Every API request is throttled per
//! client IP, and prompt creation is additionally throttled per authenticated
//! user. A background janitor evicts tracking state for idle clients.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
pub mod store;
