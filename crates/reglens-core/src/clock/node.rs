//! # Clock Nodes
//!
//! The five clock-node kinds and their per-kind configuration records.
//!
//! A node computes its local frequency and enabled contribution from its
//! parent(s) and from the field accessors it was configured with. Kinds are
//! a closed set — Fixed, Gate, Divider, Mux, PLL — dispatched through one
//! `validate` / `get_frequency` / `enabled` implementation per kind.
//! Device-specific math (PLL multiply ratios, discrete divider encodings)
//! is injected as plain function-valued configuration fields, never through
//! subclassing hooks.
//!
//! Every query validates first: the raising surface ([`Clock::validate`],
//! [`Clock::get_parent`], [`Clock::get_frequency`], [`Clock::enabled`])
//! fails fast naming the node and the missing attribute; the non-raising
//! surface ([`Clock::is_valid`]) logs the cause and reports a boolean, for
//! bulk health scans that must see every node.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::access::Field;
use crate::clock::tree::ClockTree;
use crate::error::{RegLensError, Result};

/// External divisor resolution, e.g. a discontiguous encoding no lookup
/// table captures. Returns the divisor the hardware currently applies.
pub type DividerFn = Box<dyn Fn(&Clock) -> Result<u64>>;

/// External mux selector resolution. Returns the live selector value used
/// to index the parent map.
pub type SelectorFn = Box<dyn Fn(&Clock) -> Result<u64>>;

/// External frequency computation for a PLL. Gets the node and the tree so
/// it can read its rate registers and query the parent frequency.
pub type FrequencyFn = Box<dyn Fn(&Clock, &ClockTree) -> Result<u64>>;

/// How a divider field value maps to a divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DividerMode
{
    /// The raw field value is the divisor.
    #[default]
    OneBased,
    /// The divisor is `1 << field value`; an exponent too large for a
    /// 64-bit divisor is an invalid-divider error.
    PowerOfTwo,
    /// The field value indexes the configured lookup table; an unmapped
    /// index is an invalid-divider error.
    Table,
    /// Like [`DividerMode::OneBased`], but a divisor of 0 means "this clock
    /// is gated" (frequency 0, enabled false) instead of a division fault.
    /// Under every other mode a resolved divisor of 0 is fatal.
    ZeroToGate,
}

/// Gate detection shared by Fixed, Gate, and PLL nodes.
///
/// A "ready" field, when configured, takes precedence over the "enable"
/// field: ready reflects what the hardware actually delivers, enable only
/// what was requested.
#[derive(Debug, Clone)]
struct GateSpec
{
    en_field: Option<Field>,
    en_val: u64,
    rdy_field: Option<Field>,
    rdy_val: u64,
}

impl GateSpec
{
    fn local_enabled(&self) -> Result<bool>
    {
        if let Some(rdy) = &self.rdy_field {
            return Ok(rdy.read(false)? == self.rdy_val);
        }
        if let Some(en) = &self.en_field {
            return Ok(en.read(false)? == self.en_val);
        }
        Ok(true)
    }
}

/// Configuration for a fixed-frequency clock (oscillator, crystal).
pub struct FixedConfig
{
    /// Unique clock name.
    pub name: String,
    /// Optional parent clock name.
    pub parent: Option<String>,
    /// The constant frequency, in Hz. Required; validation fails without it.
    pub freq: Option<u64>,
    /// Optional enable field.
    pub en_field: Option<Field>,
    /// Value of `en_field` meaning "enabled" (default 1).
    pub en_val: u64,
    /// Optional ready field; preferred over `en_field` when present.
    pub rdy_field: Option<Field>,
    /// Value of `rdy_field` meaning "ready" (default 1).
    pub rdy_val: u64,
}

impl Default for FixedConfig
{
    fn default() -> Self
    {
        Self {
            name: String::new(),
            parent: None,
            freq: None,
            en_field: None,
            en_val: 1,
            rdy_field: None,
            rdy_val: 1,
        }
    }
}

/// Configuration for a clock gate.
pub struct GateConfig
{
    /// Unique clock name.
    pub name: String,
    /// Optional parent clock name.
    pub parent: Option<String>,
    /// Enable field. Required; validation fails without it.
    pub en_field: Option<Field>,
    /// Value of `en_field` meaning "enabled" (default 1).
    pub en_val: u64,
    /// Optional ready field; preferred over `en_field` when present.
    pub rdy_field: Option<Field>,
    /// Value of `rdy_field` meaning "ready" (default 1).
    pub rdy_val: u64,
}

impl Default for GateConfig
{
    fn default() -> Self
    {
        Self {
            name: String::new(),
            parent: None,
            en_field: None,
            en_val: 1,
            rdy_field: None,
            rdy_val: 1,
        }
    }
}

/// Configuration for a clock divider.
///
/// Exactly one divisor source is expected: a static `div`, a `div_field`
/// (interpreted through `div_mode` and optionally `div_table`), or an
/// external `div_fn`. Validation fails when neither `div`, `div_field`,
/// nor `div_fn` is given.
#[derive(Default)]
pub struct DividerConfig
{
    /// Unique clock name.
    pub name: String,
    /// Optional parent clock name.
    pub parent: Option<String>,
    /// Static divisor.
    pub div: Option<u64>,
    /// Field holding the divisor encoding.
    pub div_field: Option<Field>,
    /// Lookup table for [`DividerMode::Table`].
    pub div_table: HashMap<u64, u64>,
    /// Field value interpretation (default [`DividerMode::OneBased`]).
    pub div_mode: DividerMode,
    /// External divisor resolution; overrides every other source.
    pub div_fn: Option<DividerFn>,
}

/// Configuration for a clock multiplexer.
///
/// `parents` maps selector values to parent names; an explicit `None`
/// entry means "no clock selected" and is a valid hardware state, not an
/// error. Validation fails on an empty map, on a missing selector source,
/// and on any parent name not registered in the tree.
#[derive(Default)]
pub struct MuxConfig
{
    /// Unique clock name.
    pub name: String,
    /// Selector value → parent name (or explicit "no parent").
    pub parents: HashMap<u64, Option<String>>,
    /// Field holding the live selector value.
    pub mux_field: Option<Field>,
    /// External selector resolution; overrides `mux_field`.
    pub mux_fn: Option<SelectorFn>,
}

/// Configuration for a PLL.
///
/// The frequency math is device specific and always supplied by the
/// caller as `freq_fn`; validation fails without it.
pub struct PllConfig
{
    /// Unique clock name.
    pub name: String,
    /// Optional parent clock name.
    pub parent: Option<String>,
    /// External frequency computation. Required.
    pub freq_fn: Option<FrequencyFn>,
    /// Optional enable field (gate-style local test).
    pub en_field: Option<Field>,
    /// Value of `en_field` meaning "enabled" (default 1).
    pub en_val: u64,
    /// Optional ready field; preferred over `en_field` when present.
    pub rdy_field: Option<Field>,
    /// Value of `rdy_field` meaning "ready" (default 1).
    pub rdy_val: u64,
}

impl Default for PllConfig
{
    fn default() -> Self
    {
        Self {
            name: String::new(),
            parent: None,
            freq_fn: None,
            en_field: None,
            en_val: 1,
            rdy_field: None,
            rdy_val: 1,
        }
    }
}

/// Kind-specific state of a clock node.
enum ClockKind
{
    Fixed
    {
        freq: Option<u64>,
        gate: GateSpec,
    },
    Gate
    {
        gate: GateSpec,
    },
    Divider
    {
        div: Option<u64>,
        div_field: Option<Field>,
        div_table: HashMap<u64, u64>,
        div_mode: DividerMode,
        div_fn: Option<DividerFn>,
    },
    Mux
    {
        parents: HashMap<u64, Option<String>>,
        mux_field: Option<Field>,
        mux_fn: Option<SelectorFn>,
    },
    Pll
    {
        freq_fn: Option<FrequencyFn>,
        gate: GateSpec,
    },
}

/// One clock node.
///
/// Parents are referenced by name and resolved lazily through the
/// [`ClockTree`] on every query, never stored as pointers — the tree owns
/// every node, and a mux's effective parent can change between queries as
/// hardware selector state changes.
pub struct Clock
{
    name: String,
    parent: Option<String>,
    kind: ClockKind,
}

impl fmt::Debug for Clock
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Clock")
            .field("name", &self.name)
            .field("kind", &self.kind_name())
            .field("parent", &self.parent)
            .finish()
    }
}

impl Clock
{
    /// Build a fixed-frequency clock.
    #[must_use]
    pub fn fixed(config: FixedConfig) -> Self
    {
        Self {
            name: config.name,
            parent: config.parent,
            kind: ClockKind::Fixed {
                freq: config.freq,
                gate: GateSpec {
                    en_field: config.en_field,
                    en_val: config.en_val,
                    rdy_field: config.rdy_field,
                    rdy_val: config.rdy_val,
                },
            },
        }
    }

    /// Build a clock gate.
    #[must_use]
    pub fn gate(config: GateConfig) -> Self
    {
        Self {
            name: config.name,
            parent: config.parent,
            kind: ClockKind::Gate {
                gate: GateSpec {
                    en_field: config.en_field,
                    en_val: config.en_val,
                    rdy_field: config.rdy_field,
                    rdy_val: config.rdy_val,
                },
            },
        }
    }

    /// Build a clock divider.
    #[must_use]
    pub fn divider(config: DividerConfig) -> Self
    {
        Self {
            name: config.name,
            parent: config.parent,
            kind: ClockKind::Divider {
                div: config.div,
                div_field: config.div_field,
                div_table: config.div_table,
                div_mode: config.div_mode,
                div_fn: config.div_fn,
            },
        }
    }

    /// Build a clock multiplexer.
    ///
    /// A mux has no single declared parent; its effective parent is
    /// whichever map entry the live selector value picks.
    #[must_use]
    pub fn mux(config: MuxConfig) -> Self
    {
        Self {
            name: config.name,
            parent: None,
            kind: ClockKind::Mux {
                parents: config.parents,
                mux_field: config.mux_field,
                mux_fn: config.mux_fn,
            },
        }
    }

    /// Build a PLL.
    #[must_use]
    pub fn pll(config: PllConfig) -> Self
    {
        Self {
            name: config.name,
            parent: config.parent,
            kind: ClockKind::Pll {
                freq_fn: config.freq_fn,
                gate: GateSpec {
                    en_field: config.en_field,
                    en_val: config.en_val,
                    rdy_field: config.rdy_field,
                    rdy_val: config.rdy_val,
                },
            },
        }
    }

    /// Name of the clock.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Kind of the node as a short label, for logging and rendering.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str
    {
        match self.kind {
            ClockKind::Fixed { .. } => "fixed",
            ClockKind::Gate { .. } => "gate",
            ClockKind::Divider { .. } => "divider",
            ClockKind::Mux { .. } => "mux",
            ClockKind::Pll { .. } => "pll",
        }
    }

    /// Whether this node is a multiplexer.
    #[must_use]
    pub const fn is_mux(&self) -> bool
    {
        matches!(self.kind, ClockKind::Mux { .. })
    }

    /// The statically declared parent name, if any.
    ///
    /// For a mux this is always `None`; use [`Clock::get_parent`] to
    /// resolve the live selection.
    #[must_use]
    pub fn parent_name(&self) -> Option<&str>
    {
        self.parent.as_deref()
    }

    /// Declared mux parent slots, `None` for every other kind.
    pub(crate) fn mux_slots(&self) -> Option<&HashMap<u64, Option<String>>>
    {
        match &self.kind {
            ClockKind::Mux { parents, .. } => Some(parents),
            _ => None,
        }
    }

    fn missing(&self, attribute: &'static str) -> RegLensError
    {
        RegLensError::MissingAttribute { clock: self.name.clone(), attribute }
    }

    /// Check that the node is fully configured, failing fast.
    ///
    /// Reports the first missing or invalid attribute, naming the node.
    /// For a mux this also checks that every declared parent name is
    /// registered in the tree (a reference error otherwise).
    ///
    /// ## Errors
    ///
    /// [`RegLensError::MissingAttribute`] or [`RegLensError::UnknownClock`].
    pub fn validate(&self, tree: &ClockTree) -> Result<()>
    {
        match &self.kind {
            ClockKind::Fixed { freq, .. } => {
                if freq.is_none() {
                    return Err(self.missing("freq"));
                }
            }
            ClockKind::Gate { gate } => {
                if gate.en_field.is_none() {
                    return Err(self.missing("en_field"));
                }
            }
            ClockKind::Divider { div, div_field, div_table, div_mode, div_fn } => {
                if div_fn.is_none() && div.is_none() && div_field.is_none() {
                    return Err(self.missing("div/div_field"));
                }
                if *div_mode == DividerMode::Table && div_table.is_empty() {
                    return Err(self.missing("div_table"));
                }
            }
            ClockKind::Mux { parents, mux_field, mux_fn } => {
                if parents.is_empty() {
                    return Err(self.missing("parents"));
                }
                if mux_field.is_none() && mux_fn.is_none() {
                    return Err(self.missing("mux_field/mux_fn"));
                }
                for parent in parents.values().flatten() {
                    if !tree.contains(parent) {
                        return Err(RegLensError::UnknownClock(parent.clone()));
                    }
                }
            }
            ClockKind::Pll { freq_fn, .. } => {
                if freq_fn.is_none() {
                    return Err(self.missing("freq_fn"));
                }
            }
        }
        Ok(())
    }

    /// Non-raising validation for bulk health scans.
    ///
    /// Never propagates; the failure cause is logged and downgraded to a
    /// boolean so a scan can continue through every node.
    #[must_use]
    pub fn is_valid(&self, tree: &ClockTree) -> bool
    {
        match self.validate(tree) {
            Ok(()) => true,
            Err(err) => {
                warn!("clock {} ({}) failed validation: {}", self.name, self.kind_name(), err);
                false
            }
        }
    }

    /// Resolve the name of the effective parent.
    ///
    /// For a mux the selector is read live (field or external function)
    /// and looked up in the parent map; an explicit "no parent" entry
    /// resolves to `Ok(None)`. Every other kind returns its declared
    /// parent, or `None` for a root.
    ///
    /// ## Errors
    ///
    /// Validation errors; [`RegLensError::UnmappedSelector`] when the live
    /// selector value has no map entry; port I/O failures, unchanged.
    pub fn get_parent<'a>(&'a self, tree: &'a ClockTree) -> Result<Option<&'a str>>
    {
        self.validate(tree)?;
        match &self.kind {
            ClockKind::Mux { parents, .. } => {
                let selector = self.read_selector()?;
                match parents.get(&selector) {
                    Some(parent) => Ok(parent.as_deref()),
                    None => Err(RegLensError::UnmappedSelector {
                        clock: self.name.clone(),
                        selector,
                    }),
                }
            }
            _ => Ok(self.parent.as_deref()),
        }
    }

    /// Compute the current frequency, in Hz.
    ///
    /// Recurses through the tree to a fixed root. A node whose parent is
    /// not resolvable (a root gate or divider, a mux selecting "no
    /// parent") yields 0 rather than an error.
    ///
    /// ## Errors
    ///
    /// Validation errors; [`RegLensError::InvalidDivider`] when a divisor
    /// resolves to 0 outside zero-to-gate mode or a table lookup misses;
    /// port I/O failures, unchanged.
    pub fn get_frequency(&self, tree: &ClockTree) -> Result<u64>
    {
        self.validate(tree)?;
        match &self.kind {
            ClockKind::Fixed { freq, .. } => (*freq).ok_or_else(|| self.missing("freq")),
            ClockKind::Gate { .. } => self.parent_frequency(tree),
            ClockKind::Divider { div_mode, .. } => {
                let div = self.resolve_divisor()?;
                if div == 0 {
                    if *div_mode == DividerMode::ZeroToGate {
                        return Ok(0);
                    }
                    return Err(RegLensError::InvalidDivider { clock: self.name.clone() });
                }
                Ok(self.parent_frequency(tree)? / div)
            }
            ClockKind::Mux { .. } => match self.get_parent(tree)? {
                Some(parent) => tree.get_frequency(parent),
                None => Ok(0),
            },
            ClockKind::Pll { freq_fn, .. } => match freq_fn {
                Some(f) => f(self, tree),
                None => Err(self.missing("freq_fn")),
            },
        }
    }

    /// Whether this clock is running.
    ///
    /// A clock is enabled when its local test passes and every ancestor up
    /// the (resolved) parent chain is enabled; a parentless node's parent
    /// term is vacuously true.
    ///
    /// ## Errors
    ///
    /// Validation errors; divider resolution faults; port I/O failures,
    /// unchanged.
    pub fn enabled(&self, tree: &ClockTree) -> Result<bool>
    {
        self.validate(tree)?;
        match &self.kind {
            ClockKind::Fixed { gate, .. } | ClockKind::Gate { gate } | ClockKind::Pll { gate, .. } => {
                Ok(gate.local_enabled()? && self.parent_enabled(tree)?)
            }
            ClockKind::Divider { div_mode, .. } => {
                let div = self.resolve_divisor()?;
                if div == 0 {
                    if *div_mode == DividerMode::ZeroToGate {
                        return Ok(false);
                    }
                    return Err(RegLensError::InvalidDivider { clock: self.name.clone() });
                }
                self.parent_enabled(tree)
            }
            ClockKind::Mux { .. } => match self.get_parent(tree)? {
                Some(parent) => tree.enabled(parent),
                None => Ok(false),
            },
        }
    }

    /// Frequency of the declared parent, or 0 when there is none.
    fn parent_frequency(&self, tree: &ClockTree) -> Result<u64>
    {
        match &self.parent {
            Some(parent) => tree.get_frequency(parent),
            None => Ok(0),
        }
    }

    /// Enabled state of the declared parent, vacuously true for a root.
    fn parent_enabled(&self, tree: &ClockTree) -> Result<bool>
    {
        match &self.parent {
            Some(parent) => tree.enabled(parent),
            None => Ok(true),
        }
    }

    /// Read the live mux selector value.
    fn read_selector(&self) -> Result<u64>
    {
        match &self.kind {
            ClockKind::Mux { mux_field, mux_fn, .. } => {
                if let Some(f) = mux_fn {
                    return f(self);
                }
                match mux_field {
                    Some(field) => field.read(false),
                    None => Err(self.missing("mux_field/mux_fn")),
                }
            }
            _ => Err(self.missing("mux_field/mux_fn")),
        }
    }

    /// Resolve the divisor the hardware currently applies.
    fn resolve_divisor(&self) -> Result<u64>
    {
        match &self.kind {
            ClockKind::Divider { div, div_field, div_table, div_mode, div_fn } => {
                if let Some(f) = div_fn {
                    return f(self);
                }
                if let Some(div) = div {
                    return Ok(*div);
                }
                let Some(field) = div_field else {
                    return Err(self.missing("div/div_field"));
                };
                let raw = field.read(false)?;
                match div_mode {
                    DividerMode::OneBased | DividerMode::ZeroToGate => Ok(raw),
                    // a shift of 64+ cannot produce a representable divisor
                    DividerMode::PowerOfTwo => u32::try_from(raw)
                        .ok()
                        .and_then(|shift| 1u64.checked_shl(shift))
                        .ok_or_else(|| RegLensError::InvalidDivider { clock: self.name.clone() }),
                    DividerMode::Table => div_table
                        .get(&raw)
                        .copied()
                        .ok_or_else(|| RegLensError::InvalidDivider { clock: self.name.clone() }),
                }
            }
            _ => Err(self.missing("div/div_field")),
        }
    }
}
