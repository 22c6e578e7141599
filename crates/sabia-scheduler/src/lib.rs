//! # Sabia Scheduler
//!
//! In-memory message queue and worker pool. No external broker, no
//! persistence: a crash loses only in-flight messages.
//!
//! ## Architecture
//! ```text
//! webhook / polling ──enqueue──▶ MessageQueue ──dequeue──▶ Worker 0..N
//!                                  │                          │
//!                                  └──── stats / history ◀────┘ complete | fail
//! ```

pub mod queue;
pub mod worker;

pub use queue::{InFlight, MessageQueue, Outcome, QueueStats};
pub use worker::WorkerPool;
