//! Specialized data structures
//!
//! - **[`ring_buffer`]**: Fixed-size history buffer used for metric samples

pub mod ring_buffer;

pub use ring_buffer::RingBuffer;
