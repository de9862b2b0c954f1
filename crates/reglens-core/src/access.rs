//! # Register and Field Accessors
//!
//! Bit-precise, cache-aware access to device memory.
//!
//! Every read and write against the target goes through a [`Register`]
//! accessor. The register owns exactly one cache slot for its physical
//! address and enforces a [`CachePolicy`] deciding when the slot is good
//! enough and when the port has to be touched. [`Field`] accessors are
//! bit-range views into a register; they never cache independently and
//! always read and write through their owning register.
//!
//! Arithmetic on register values is deliberately not overloaded onto the
//! accessors — device I/O triggered by `+` or `|=` is too easy to miss in
//! review. Use [`Register::read`], [`Register::write`], or
//! [`Register::update`] for an explicit read-modify-write.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{RegLensError, Result};
use crate::port::SharedPort;

/// Cache policy of a register accessor.
///
/// Exactly one policy is active per register at any time; switch it with
/// [`Register::set_cache_policy`]. The policy never changes what a `force`
/// flag does — forcing always wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy
{
    /// Every read and every write touches the port. The cache slot still
    /// tracks the last seen value but is never used to answer a read.
    #[default]
    Transparent,
    /// Repeat reads are served from the cache; writes always go through to
    /// the device immediately (and update the cache).
    ReadThrough,
    /// Reads are served from the cache once it is filled; writes update the
    /// cache only, until [`Register::flush`] commits them to the device.
    Deferred,
}

/// Bit span of a field inside its register.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec
{
    pub(crate) bit_offset: u32,
    pub(crate) bit_width: u32,
}

/// Mask covering `width` low bits.
fn span_mask(width: u32) -> u64
{
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Handle to a register accessor.
///
/// Registers are built once by the device tree and shared: the peripheral
/// keeps one handle, and every [`Field`] view and clock-node configuration
/// referencing the register keeps another.
pub type RegisterHandle = Rc<Register>;

/// A cache-aware accessor for one physical register.
///
/// The register is the exclusive owner of its cache slot; nothing else in
/// the core caches register values. All mutation goes through interior
/// `Cell`s, so the accessor is shared behind `Rc` without locking — the
/// core is single-threaded by design.
pub struct Register
{
    name: String,
    address: u64,
    size_bits: u32,
    policy: Cell<CachePolicy>,
    cached: Cell<Option<u64>>,
    fields: HashMap<String, FieldSpec>,
    port: SharedPort,
}

impl fmt::Debug for Register
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Register")
            .field("name", &self.name)
            .field("address", &format_args!("{:#010x}", self.address))
            .field("size_bits", &self.size_bits)
            .field("policy", &self.policy.get())
            .field("cached", &self.cached.get())
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl Register
{
    /// Build a register accessor at an absolute address.
    ///
    /// Called by the device tree builder, which has already validated the
    /// field specs against the register size.
    #[must_use]
    pub(crate) fn new(
        name: String,
        address: u64,
        size_bits: u32,
        fields: HashMap<String, FieldSpec>,
        port: SharedPort,
    ) -> RegisterHandle
    {
        Rc::new(Self {
            name,
            address,
            size_bits,
            policy: Cell::new(CachePolicy::Transparent),
            cached: Cell::new(None),
            fields,
            port,
        })
    }

    /// Name of the register within its peripheral.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Absolute physical address (peripheral base + register offset).
    #[must_use]
    pub const fn address(&self) -> u64
    {
        self.address
    }

    /// Register size in bits.
    #[must_use]
    pub const fn size_bits(&self) -> u32
    {
        self.size_bits
    }

    /// Currently active cache policy.
    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy
    {
        self.policy.get()
    }

    /// Switch the cache policy.
    ///
    /// Switching away from [`CachePolicy::Deferred`] does not flush — a
    /// deferred value still pending in the cache stays there until
    /// [`Register::flush`] or the next write.
    pub fn set_cache_policy(&self, policy: CachePolicy)
    {
        trace!("{}: cache policy {:?} -> {:?}", self.name, self.policy.get(), policy);
        self.policy.set(policy);
    }

    /// Last value seen by this accessor, if any.
    #[must_use]
    pub fn cached_value(&self) -> Option<u64>
    {
        self.cached.get()
    }

    /// Read the register value.
    ///
    /// Issues a port read if `force` is set, if nothing is cached yet, or
    /// if the policy is [`CachePolicy::Transparent`]; otherwise the cached
    /// value is returned without touching the device.
    ///
    /// ## Errors
    ///
    /// Port I/O failures, unchanged.
    pub fn read(&self, force: bool) -> Result<u64>
    {
        if !force && self.policy.get() != CachePolicy::Transparent {
            if let Some(value) = self.cached.get() {
                return Ok(value);
            }
        }
        let value = self.port.borrow_mut().read(self.size_bits, self.address)?;
        debug!("port read {} @ {:#010x} -> {:#x}", self.name, self.address, value);
        self.cached.set(Some(value));
        Ok(value)
    }

    /// Write a value to the register.
    ///
    /// The cache slot always takes the new value. The port is written
    /// immediately unless the policy is [`CachePolicy::Deferred`] and
    /// `force` is not set; a deferred value reaches the device on the next
    /// [`Register::flush`].
    ///
    /// ## Errors
    ///
    /// Port I/O failures, unchanged.
    pub fn write(&self, value: u64, force: bool) -> Result<()>
    {
        self.cached.set(Some(value));
        if force || self.policy.get() != CachePolicy::Deferred {
            self.port.borrow_mut().write(self.size_bits, self.address, value)?;
            debug!("port write {} @ {:#010x} <- {:#x}", self.name, self.address, value);
        }
        Ok(())
    }

    /// Force-write the cached value to the device.
    ///
    /// Commits a write deferred by [`CachePolicy::Deferred`]. A flush with
    /// an empty cache slot is a no-op — there is nothing to commit.
    ///
    /// ## Errors
    ///
    /// Port I/O failures, unchanged.
    pub fn flush(&self) -> Result<()>
    {
        match self.cached.get() {
            Some(value) => {
                self.port.borrow_mut().write(self.size_bits, self.address, value)?;
                debug!("flush {} @ {:#010x} <- {:#x}", self.name, self.address, value);
                Ok(())
            }
            None => {
                trace!("flush {}: nothing cached", self.name);
                Ok(())
            }
        }
    }

    /// Atomic read-modify-write against the cache.
    ///
    /// Reads the current value (respecting the cache policy), applies
    /// `transform`, writes the result back, and returns it. This replaces
    /// the in-place operators some register APIs grow — the device I/O is
    /// explicit here.
    ///
    /// ## Errors
    ///
    /// Port I/O failures from either the read or the write, unchanged.
    pub fn update<F>(&self, transform: F) -> Result<u64>
    where
        F: FnOnce(u64) -> u64,
    {
        let value = transform(self.read(false)?);
        self.write(value, false)?;
        Ok(value)
    }

    /// Look up a field accessor by name.
    ///
    /// ## Errors
    ///
    /// [`RegLensError::UnknownField`] if the register has no such field.
    pub fn field(self: &Rc<Self>, name: &str) -> Result<Field>
    {
        let spec = self.fields.get(name).ok_or_else(|| RegLensError::UnknownField {
            register: self.name.clone(),
            field: name.to_string(),
        })?;
        Ok(Field {
            register: Rc::clone(self),
            name: name.to_string(),
            bit_offset: spec.bit_offset,
            bit_width: spec.bit_width,
        })
    }

    /// Check whether a field exists in this register.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool
    {
        self.fields.contains_key(name)
    }

    /// Names of all declared fields, sorted for stable output.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str>
    {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Read the register once and return every field's value.
    ///
    /// ## Errors
    ///
    /// Port I/O failures, unchanged.
    pub fn read_fields(&self, force: bool) -> Result<HashMap<String, u64>>
    {
        let value = self.read(force)?;
        let mut fields = HashMap::with_capacity(self.fields.len());
        for (name, spec) in &self.fields {
            fields.insert(name.clone(), (value >> spec.bit_offset) & span_mask(spec.bit_width));
        }
        Ok(fields)
    }

    /// Write several fields with a single register write.
    ///
    /// Performs one read-modify-write: only the named field spans change,
    /// every other bit of the register is preserved.
    ///
    /// ## Errors
    ///
    /// [`RegLensError::UnknownField`] for a name the register doesn't
    /// declare; port I/O failures, unchanged.
    pub fn write_fields(&self, values: &HashMap<String, u64>) -> Result<()>
    {
        let mut value = self.read(false)?;
        for (name, field_value) in values {
            let spec = self.fields.get(name).ok_or_else(|| RegLensError::UnknownField {
                register: self.name.clone(),
                field: name.clone(),
            })?;
            let mask = span_mask(spec.bit_width) << spec.bit_offset;
            value = (value & !mask) | ((field_value & span_mask(spec.bit_width)) << spec.bit_offset);
        }
        self.write(value, false)
    }
}

/// A bit-range view into a register.
///
/// Fields are cheap to clone (an `Rc` bump) and are what clock-node
/// configurations hold on to: an enable bit, a divider field, a mux
/// selector. All traffic goes through the owning register's cache slot.
#[derive(Clone)]
pub struct Field
{
    register: Rc<Register>,
    name: String,
    bit_offset: u32,
    bit_width: u32,
}

impl fmt::Debug for Field
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Field")
            .field("register", &self.register.name())
            .field("name", &self.name)
            .field("bit_offset", &self.bit_offset)
            .field("bit_width", &self.bit_width)
            .finish()
    }
}

impl fmt::Display for Field
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}.{}", self.register.name(), self.name)
    }
}

impl Field
{
    /// Name of the field within its register.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Position of the field's least significant bit.
    #[must_use]
    pub const fn bit_offset(&self) -> u32
    {
        self.bit_offset
    }

    /// Width of the field in bits.
    #[must_use]
    pub const fn bit_width(&self) -> u32
    {
        self.bit_width
    }

    /// The register this field is a view into.
    #[must_use]
    pub fn register(&self) -> &RegisterHandle
    {
        &self.register
    }

    /// Address of the owning register.
    #[must_use]
    pub fn address(&self) -> u64
    {
        self.register.address()
    }

    /// Read the field value.
    ///
    /// Reads the owning register (cache policy applies, `force` bypasses
    /// it) and extracts this field's bit span.
    ///
    /// ## Errors
    ///
    /// Port I/O failures, unchanged.
    pub fn read(&self, force: bool) -> Result<u64>
    {
        let value = self.register.read(force)?;
        Ok((value >> self.bit_offset) & span_mask(self.bit_width))
    }

    /// Write the field value, leaving the rest of the register intact.
    ///
    /// Shorthand for [`Field::write_with`] with neither force flag set.
    ///
    /// ## Errors
    ///
    /// Port I/O failures, unchanged.
    pub fn write(&self, value: u64) -> Result<()>
    {
        self.write_with(value, false, false)
    }

    /// Write the field value with explicit cache-bypass control.
    ///
    /// Reads the owning register (`force_read` bypasses the cache), clears
    /// this field's bit span, ORs in the shifted value (masked to the field
    /// width), and writes the register back (`force_write` bypasses write
    /// deferral).
    ///
    /// ## Errors
    ///
    /// Port I/O failures, unchanged.
    pub fn write_with(&self, value: u64, force_read: bool, force_write: bool) -> Result<()>
    {
        let mask = span_mask(self.bit_width) << self.bit_offset;
        let current = self.register.read(force_read)?;
        let merged = (current & !mask) | ((value & span_mask(self.bit_width)) << self.bit_offset);
        self.register.write(merged, force_write)
    }
}
