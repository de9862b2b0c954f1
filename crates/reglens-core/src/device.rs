//! # Device Tree
//!
//! The static accessor tree: Device → Peripheral → Register → Field.
//!
//! The tree is built once from a [`DeviceDecl`] (produced by an external
//! SVD-style loader) and a port, and is immutable afterwards — only the
//! register cache slots ever change. Lookups are explicit name → entity
//! table lookups and fail with reference errors; there is no dynamic
//! attribute discovery anywhere.
//!
//! ## Example
//!
//! ```rust,no_run
//! # fn load_decl() -> reglens_core::decl::DeviceDecl { unimplemented!() }
//! # fn open_port() -> reglens_core::port::SharedPort { unimplemented!() }
//! use reglens_core::device::Device;
//!
//! let device = Device::new(load_decl(), open_port())?;
//! let field = device.peripheral("TEST1")?.register("TESTA")?.field("A3")?;
//! println!("A3 = {}", field.read(false)?);
//! # Ok::<(), reglens_core::error::RegLensError>(())
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::access::{FieldSpec, Register, RegisterHandle};
use crate::decl::DeviceDecl;
use crate::error::{RegLensError, Result};
use crate::port::SharedPort;

/// One peripheral: a base address and its registers.
#[derive(Debug)]
pub struct Peripheral
{
    name: String,
    base_address: u64,
    registers: HashMap<String, RegisterHandle>,
}

impl Peripheral
{
    /// Name of the peripheral.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Physical base address of the peripheral.
    #[must_use]
    pub const fn base_address(&self) -> u64
    {
        self.base_address
    }

    /// Look up a register accessor by name.
    ///
    /// ## Errors
    ///
    /// [`RegLensError::UnknownRegister`] if the peripheral has no such
    /// register.
    pub fn register(&self, name: &str) -> Result<&RegisterHandle>
    {
        self.registers.get(name).ok_or_else(|| RegLensError::UnknownRegister {
            peripheral: self.name.clone(),
            register: name.to_string(),
        })
    }

    /// Check whether a register exists in this peripheral.
    #[must_use]
    pub fn has_register(&self, name: &str) -> bool
    {
        self.registers.contains_key(name)
    }

    /// Names of all registers, sorted for stable output.
    #[must_use]
    pub fn register_names(&self) -> Vec<&str>
    {
        let mut names: Vec<&str> = self.registers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Force-read every register in the peripheral into its cache.
    ///
    /// Useful before a batch of cached reads: one pass over the port fills
    /// all cache slots, and registers under a non-transparent policy then
    /// answer reads without further port traffic.
    ///
    /// ## Errors
    ///
    /// Port I/O failures, unchanged; the prefetch stops at the first one.
    pub fn prefetch(&self) -> Result<()>
    {
        trace!("prefetch {} ({} registers)", self.name, self.registers.len());
        for register in self.registers.values() {
            register.read(true)?;
        }
        Ok(())
    }
}

/// The device accessor tree.
///
/// Owns every peripheral (and through them every register accessor) for
/// the lifetime of the debug session.
pub struct Device
{
    name: String,
    peripherals: HashMap<String, Peripheral>,
}

impl fmt::Debug for Device
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("peripherals", &self.peripherals.len())
            .finish()
    }
}

impl Device
{
    /// Build the accessor tree from a declaration and a port.
    ///
    /// Every register accessor is created with its absolute address
    /// (peripheral base + register offset) and a clone of the port handle.
    /// Field declarations are checked against the register size here, once,
    /// so accessors never have to re-validate bit spans.
    ///
    /// ## Errors
    ///
    /// [`RegLensError::FieldOutOfRange`] if a declared field does not fit
    /// inside its register.
    pub fn new(decl: DeviceDecl, port: SharedPort) -> Result<Self>
    {
        let mut peripherals = HashMap::with_capacity(decl.peripherals.len());
        for (peripheral_name, peripheral_decl) in decl.peripherals {
            let mut registers = HashMap::with_capacity(peripheral_decl.registers.len());
            for (register_name, register_decl) in peripheral_decl.registers {
                let mut fields = HashMap::with_capacity(register_decl.fields.len());
                for (field_name, field_decl) in register_decl.fields {
                    // widened so a pathological offset+width cannot wrap
                    if u64::from(field_decl.bit_offset) + u64::from(field_decl.bit_width)
                        > u64::from(register_decl.size_bits)
                    {
                        return Err(RegLensError::FieldOutOfRange {
                            register: register_name,
                            field: field_name,
                        });
                    }
                    fields.insert(field_name, FieldSpec {
                        bit_offset: field_decl.bit_offset,
                        bit_width: field_decl.bit_width,
                    });
                }
                let register = Register::new(
                    register_name.clone(),
                    peripheral_decl.base_address + register_decl.address_offset,
                    register_decl.size_bits,
                    fields,
                    port.clone(),
                );
                registers.insert(register_name, register);
            }
            peripherals.insert(peripheral_name.clone(), Peripheral {
                name: peripheral_name,
                base_address: peripheral_decl.base_address,
                registers,
            });
        }
        trace!("device {} built with {} peripherals", decl.name, peripherals.len());
        Ok(Self { name: decl.name, peripherals })
    }

    /// Name of the device.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Look up a peripheral by name.
    ///
    /// ## Errors
    ///
    /// [`RegLensError::UnknownPeripheral`] if the device has no such
    /// peripheral.
    pub fn peripheral(&self, name: &str) -> Result<&Peripheral>
    {
        self.peripherals
            .get(name)
            .ok_or_else(|| RegLensError::UnknownPeripheral(name.to_string()))
    }

    /// Check whether a peripheral exists in this device.
    #[must_use]
    pub fn has_peripheral(&self, name: &str) -> bool
    {
        self.peripherals.contains_key(name)
    }

    /// Names of all peripherals, sorted for stable output.
    #[must_use]
    pub fn peripheral_names(&self) -> Vec<&str>
    {
        let mut names: Vec<&str> = self.peripherals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
