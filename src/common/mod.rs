//! Common types
//!
//! This module defines the value types shared by every layer:
//! - ServiceAddress: parsed logical address
//! - Selector / Labels: backend-matching criteria
//! - BackendCandidate: one concrete backend
//! - Stream: boxed async byte stream

mod address;
mod selector;
mod stream;

pub use address::{ServiceAddress, DEFAULT_NAMESPACE};
pub use selector::{BackendCandidate, Labels, Selector};
pub use stream::{AsyncReadWrite, IntoStream, Stream};

// Re-export error types from crate root
pub use crate::error::{Error, Result};
