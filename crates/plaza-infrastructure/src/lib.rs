//! Backend implementations for the Plaza client core.
//!
//! Two interchangeable backends behind the `plaza-core` trait boundary:
//! [`memory::MemoryBackend`] for local development and tests, and
//! [`rest::RestBackend`] for a Supabase-shaped remote service configured
//! via [`config::BackendConfig`].

pub mod config;
pub mod memory;
pub mod rest;

pub use config::BackendConfig;
pub use memory::MemoryBackend;
pub use rest::RestBackend;
