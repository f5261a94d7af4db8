//! Synchronization and Concurrency Support
//!
//! The bridge is driven from two contexts at once: the application task
//! (buffer writes, lifecycle calls) and the peripheral's interrupt
//! handler (position updates, transmit completion). This module holds the
//! primitives that keep those contexts from tripping over each other:
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`] - ISR-safe
//!   interior mutability
//! - **Claim** (`claim`): [`TxClaim`] - atomic check-and-claim of the
//!   transmit DMA channel
//!
//! # Implementation Note
//!
//! The critical section implementation is provided by the HAL crate
//! (e.g., `esp-hal`, `cortex-m`). On the host, tests enable the `std`
//! feature of `critical-section`.
//!
//! ```toml
//! [dependencies]
//! cortex-m = { version = "...", features = ["critical-section-single-core"] }
//! ```

mod claim;
mod primitives;

pub use claim::TxClaim;
pub use primitives::CriticalSectionCell;
