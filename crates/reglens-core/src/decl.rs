//! # Device Declarations
//!
//! Plain data records describing a device's memory map.
//!
//! These mirror the shape an external SVD-style loader produces: a nested
//! mapping of peripherals, registers, and bit fields. Nothing here touches
//! the target; the records are consumed once by [`Device::new`] to build
//! the accessor tree and can be thrown away afterwards.
//!
//! Lookups later happen through explicit `name -> entity` tables, never
//! through reflection or dynamic attributes.
//!
//! [`Device::new`]: crate::device::Device::new

use std::collections::HashMap;

/// Declaration of a whole device.
#[derive(Debug, Clone, Default)]
pub struct DeviceDecl
{
    /// Device name, e.g. `"BL123"`.
    pub name: String,
    /// Peripheral declarations, keyed by peripheral name.
    pub peripherals: HashMap<String, PeripheralDecl>,
}

/// Declaration of one peripheral.
#[derive(Debug, Clone, Default)]
pub struct PeripheralDecl
{
    /// Physical base address of the peripheral.
    pub base_address: u64,
    /// Register declarations, keyed by register name.
    pub registers: HashMap<String, RegisterDecl>,
}

/// Declaration of one register.
#[derive(Debug, Clone, Default)]
pub struct RegisterDecl
{
    /// Offset from the peripheral base address.
    pub address_offset: u64,
    /// Register size in bits (8, 16, 32, 64, ...).
    pub size_bits: u32,
    /// Field declarations, keyed by field name.
    pub fields: HashMap<String, FieldDecl>,
}

/// Declaration of one bit field.
///
/// The declared span must satisfy `bit_offset + bit_width <= size_bits` of
/// the owning register; [`Device::new`] rejects declarations that don't.
///
/// [`Device::new`]: crate::device::Device::new
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldDecl
{
    /// Position of the field's least significant bit.
    pub bit_offset: u32,
    /// Width of the field in bits.
    pub bit_width: u32,
}
