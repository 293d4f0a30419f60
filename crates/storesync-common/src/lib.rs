//! StoreSync Common Library
//!
//! Shared utilities for the StoreSync workspace members:
//!
//! - **Logging**: centralized tracing initialization
//! - **Checksums**: payload integrity helpers

pub mod checksum;
pub mod logging;
