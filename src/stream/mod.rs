//! Lazy stream node types
//!
//! This module provides the stream contracts and the two concrete node types
//! implementing them.

pub mod core;
pub mod singly;
pub mod doubly;

// Re-export core types
pub use self::core::{LinearStream, Stream, Values};

pub use singly::SinglyLinkedStream;
pub use doubly::{DoublyLinkedStream, TraversalDirection};
