//! Shared process utilities.

pub mod shutdown;

pub use shutdown::{shutdown_signal, ShutdownHandle};
