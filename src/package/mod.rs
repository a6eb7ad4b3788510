//! Package identity and snapshot model.
//!
//! This module provides the canonical package-id codec used at the protocol
//! boundary and the read-only package snapshot type queries operate on.

mod id;
mod instance;

pub use id::{ID_DELIMITER, PackageId};
pub use instance::PackageInstance;
