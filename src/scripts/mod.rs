//! Type-safe startup script modules.
//!
//! Each struct maps Rust fields to the exact arguments expected by the
//! corresponding script in the profile repository.

pub mod cluster;
