//! Todolists Server - session-backed todo list API.
//!
//! This crate provides:
//! - List and item ordering, completion and validation rules ([`ordering`])
//! - An in-memory, per-client session store ([`session`])
//! - The HTTP API that ties them together ([`routes`])
//!
//! # Architecture
//!
//! Each client gets a session holding its own lists. Nothing is persisted;
//! the server keeps every session in memory until it goes idle.

pub mod config;
pub mod error;
pub mod ordering;
pub mod routes;
pub mod session;
pub mod types;
