//! native-core: shared types for native-access
//!
//! This crate provides the foundational types used by all native-access crates:
//! - Error types and Result alias
//! - Per-call OS error codes and their decoded messages
//! - Resource limit identifiers and values
//! - Per-OS `struct stat` layout descriptors

pub mod errno;
pub mod error;
pub mod layout;
pub mod limits;

pub use errno::Errno;
pub use error::{NativeAccessError, Result};
pub use layout::PosixLayout;
pub use limits::{LimitKind, ProcessLimits, RLimit, ResourceLimit};
