//! # Memory Access Port
//!
//! The boundary between the inspection core and the physical transport.
//!
//! Everything this crate knows about a live target flows through the
//! [`MemoryPort`] trait: register reads and writes, and nothing else.
//! Concrete implementations wrap a JTAG probe driver, a debug-server
//! socket, or an in-memory fake for tests. The port is the only source of
//! latency in the core and is treated as opaque — its timing and
//! thread-safety are its own concern.
//!
//! ## Design Philosophy
//!
//! The trait methods are designed to be:
//! - **Simple**: one read, one write, both synchronous and blocking
//! - **Unbuffered**: caching happens above this layer, in the register
//!   accessors, never inside a port
//! - **Transparent about failure**: port errors propagate to callers
//!   unchanged; this crate never reinterprets them

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;

/// Synchronous access to target memory.
///
/// `width_bits` is the access width of the register being touched (8, 16,
/// 32, 64, ...); transports that only support word accesses may ignore it
/// or round up as they see fit.
///
/// ## Thread Safety
///
/// A port is **not** required to be thread-safe. If one port is shared with
/// something outside this core (e.g. a watchpoint-polling thread), the
/// caller must serialize access with an external lock; the core neither
/// provides nor assumes one.
pub trait MemoryPort
{
    /// Read a value from target memory.
    ///
    /// ## Errors
    ///
    /// Whatever the transport reports, unchanged.
    fn read(&mut self, width_bits: u32, address: u64) -> Result<u64>;

    /// Write a value to target memory.
    ///
    /// ## Errors
    ///
    /// Whatever the transport reports, unchanged.
    fn write(&mut self, width_bits: u32, address: u64, value: u64) -> Result<()>;
}

/// Shared handle to a memory port.
///
/// Every register accessor of a device holds one of these; cloning the
/// handle is cheap and keeps a single underlying transport. The core is
/// single-threaded by design (see the crate docs), hence `Rc` rather than
/// an atomically counted pointer.
pub type SharedPort = Rc<RefCell<dyn MemoryPort>>;

/// Wrap a concrete port into a [`SharedPort`] handle.
#[must_use]
pub fn shared<P: MemoryPort + 'static>(port: P) -> SharedPort
{
    Rc::new(RefCell::new(port))
}
