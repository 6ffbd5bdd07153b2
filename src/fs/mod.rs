//! Filesystem utilities for quotedesk.
//!
//! Every durable file the desk owns is written through [`atomic_write`].

pub mod atomic;

pub use atomic::atomic_write;
pub use atomic::atomic_write_file;
