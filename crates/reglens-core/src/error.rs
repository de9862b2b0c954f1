//! # Error Types
//!
//! General error handling for the inspection core.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

/// Main error type for register and clock-tree operations
///
/// This enum represents all the ways an inspection operation can fail.
/// Each variant corresponds to a specific error condition that can occur
/// when walking the device tree or evaluating clocks.
///
/// ## Error Categories
///
/// 1. **Reference errors**: UnknownPeripheral, UnknownRegister, UnknownField,
///    UnknownClock — a name was looked up that the device or clock tree does
///    not know about.
/// 2. **Declaration errors**: FieldOutOfRange — the static hardware metadata
///    is inconsistent and the device tree refuses to build.
/// 3. **Configuration errors**: MissingAttribute, UnmappedSelector — a clock
///    node was constructed without everything its kind requires.
/// 4. **Numeric errors**: InvalidDivider — a divider resolved to something
///    that cannot divide a frequency.
/// 5. **I/O errors**: Io — the memory access port failed; propagated
///    unchanged from the transport.
#[derive(Error, Debug)]
pub enum RegLensError
{
    /// The requested peripheral doesn't exist in the device tree
    #[error("Unknown peripheral {0}")]
    UnknownPeripheral(String),

    /// The requested register doesn't exist in the peripheral
    #[error("Unknown register {peripheral}.{register}")]
    UnknownRegister
    {
        /// Name of the peripheral that was searched
        peripheral: String,
        /// Name of the register that doesn't exist
        register: String,
    },

    /// The requested field doesn't exist in the register
    #[error("Unknown field {register}.{field}")]
    UnknownField
    {
        /// Name of the register that was searched
        register: String,
        /// Name of the field that doesn't exist
        field: String,
    },

    /// A declared field does not fit inside its register
    ///
    /// Raised while building the device tree when
    /// `bit_offset + bit_width > size_bits` for a field declaration.
    /// This is a bug in the hardware metadata, not a runtime condition.
    #[error("Field {register}.{field} exceeds the register size")]
    FieldOutOfRange
    {
        /// Name of the owning register
        register: String,
        /// Name of the offending field
        field: String,
    },

    /// The requested clock is not registered in the clock tree
    #[error("The clock {0} doesn't exist")]
    UnknownClock(String),

    /// A clock node has not been properly configured
    ///
    /// Raised by the fail-fast validation surface; names the clock and the
    /// first missing attribute so a misconfigured node is easy to track down.
    #[error("{clock}: the attribute {attribute} has not been defined")]
    MissingAttribute
    {
        /// Name of the misconfigured clock
        clock: String,
        /// The attribute (or attribute alternatives) that is missing
        attribute: &'static str,
    },

    /// A mux selector read a value its parent map doesn't cover
    ///
    /// A mux map may contain an explicit "no parent" entry, which is a valid
    /// hardware state. A selector value with no entry at all is a
    /// configuration error.
    #[error("{clock}: mux selector value {selector} has no parent entry")]
    UnmappedSelector
    {
        /// Name of the mux clock
        clock: String,
        /// The live selector value that was read
        selector: u64,
    },

    /// The divider could not be resolved to a usable divisor
    ///
    /// Raised when a lookup table has no entry for the field value, when a
    /// power-of-two exponent is too large for a 64-bit divisor, or when a
    /// divisor resolves to 0 outside of zero-to-gate mode.
    #[error("{clock}: the divider could not be determined")]
    InvalidDivider
    {
        /// Name of the divider clock
        clock: String,
    },

    /// I/O error from the memory access port
    ///
    /// The port owns the transport (JTAG probe, debug server socket, ...);
    /// its failures pass through this layer unmodified.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, RegLensError>`
///
/// ```rust
/// use reglens_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, RegLensError>;
