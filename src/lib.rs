pub mod error;
pub mod lazy;
pub mod stream;
pub mod stream_configuration;

mod source;

// Re-export the public surface at the crate root
pub use error::{StreamError, StreamResult};
pub use lazy::{thunk, thunk_init, Slot, Thunk};
pub use stream::{DoublyLinkedStream, LinearStream, SinglyLinkedStream, Stream, TraversalDirection, Values};
pub use stream_configuration::StreamConfig;
