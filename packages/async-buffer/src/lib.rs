//! Asynchronous decoupling buffer.
//!
//! A [`Buffer`] is an unbounded FIFO queue sitting between any number of producers and any number
//! of consumers. Producers [`put`](Buffer::put) values without ever blocking, consumers
//! [`get`](Buffer::get) them either by awaiting or by blocking the calling thread, and a
//! [`CancelToken`] starts a graceful shutdown in which every value already admitted is still
//! delivered before the buffer reports itself closed.
//!
//! ```
//! # #[tokio::main(flavor = "multi_thread")]
//! # async fn main() {
//! let (buf, cancel) = async_buffer::buffer::<u32>().unwrap();
//! for i in 0..3 {
//!     buf.put(i).unwrap();
//! }
//! cancel.cancel();
//! while let Some(i) = buf.get().await.unwrap() {
//!     println!("got {}", i);
//! }
//! assert!(buf.is_closed());
//! # }
//! ```

#[macro_use]
extern crate tracing;

mod buffer;
mod util;

pub use crate::buffer::api::*;

/// Error types
pub mod error {
    pub use crate::buffer::error::*;
}

/// Future types
pub mod future {
    pub use crate::buffer::api::future::*;
}

#[cfg(test)]
mod test_util;
