//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT / SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber wakes → server stops accepting → in-flight
//!     requests drain → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; the server and any background task subscribe
//! - The process keeps the sender alive for its whole lifetime

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
