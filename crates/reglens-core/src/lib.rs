//! # reglens-core
//!
//! Register, field, and clock-tree inspection primitives for RegLens.
//!
//! This crate lets engineers inspect and reason about a live embedded
//! device's register state and derived clock topology over a remote debug
//! link, without modifying target firmware. It provides:
//! - A bit-precise, cache-aware register/field access model that mediates
//!   every read and write to physical memory
//! - A static device tree (peripherals → registers → fields) built from
//!   externally loaded hardware metadata
//! - A clock-tree evaluation engine computing derived frequency and
//!   gated/enabled state by walking a dependency graph whose mux edges are
//!   resolved through live register reads
//!
//! ## What lives elsewhere
//!
//! The SVD-style metadata loader, the physical transport to the target
//! (JTAG probe drivers, debug servers), watchpoint polling, and all CLI
//! wiring are external collaborators. The transport is abstracted behind
//! one small trait, [`MemoryPort`]; everything this crate does to a live
//! target flows through it.
//!
//! ## Concurrency
//!
//! All operations are synchronous and blocking, and nothing here is
//! internally synchronized. Handles are `Rc`-based; callers sharing a port
//! with another thread must serialize access with an external lock.

pub mod access;
pub mod clock;
pub mod decl;
pub mod device;
pub mod error;
pub mod port;

pub use access::{CachePolicy, Field, Register, RegisterHandle};
pub use clock::{
    Clock, ClockTree, DividerConfig, DividerMode, FixedConfig, GateConfig, MuxConfig, PllConfig,
    TreeNode,
};
// Re-export commonly used types
pub use decl::{DeviceDecl, FieldDecl, PeripheralDecl, RegisterDecl};
pub use device::{Device, Peripheral};
pub use error::{RegLensError, Result};
pub use port::{shared, MemoryPort, SharedPort};
