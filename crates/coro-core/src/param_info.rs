//! Parameter introspection for discoverable kernel parameters.
//!
//! This module provides the [`ParameterInfo`] trait and supporting types that
//! let hosts enumerate, read and write a processor's parameters by index:
//!
//! - **Hosts and CLIs**: list the address space with names, ranges and units
//! - **Session files**: map stable string IDs to addresses
//! - **Control threads**: clamp values before they reach the audio thread
//!
//! # Design
//!
//! Access is index-based. Each parameter is described by a
//! [`ParamDescriptor`] carrying display metadata, the valid range, a stable
//! [`ParamId`] and [`ParamFlags`] for host capabilities.
//!
//! # Example
//!
//! ```rust
//! use coro_core::{ParamDescriptor, ParamId, ParameterInfo};
//!
//! struct Leveller {
//!     gain: f32,
//! }
//!
//! impl ParameterInfo for Leveller {
//!     fn param_count(&self) -> usize { 1 }
//!
//!     fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
//!         match index {
//!             0 => Some(ParamDescriptor::gain("Gain", "Gain", 2.0, 1.0)
//!                 .with_id(ParamId(9), "gain")),
//!             _ => None,
//!         }
//!     }
//!
//!     fn get_param(&self, index: usize) -> f32 {
//!         match index {
//!             0 => self.gain,
//!             _ => 0.0,
//!         }
//!     }
//!
//!     fn set_param(&mut self, index: usize, value: f32) {
//!         if let Some(desc) = self.param_info(index) {
//!             self.gain = desc.clamp(value);
//!         }
//!     }
//! }
//!
//! let mut leveller = Leveller { gain: 1.0 };
//! leveller.set_param(0, 9.0);
//! assert_eq!(leveller.get_param(0), 2.0);
//! assert_eq!(leveller.find_param_by_string_id("gain"), Some(0));
//! ```
//!
//! # no_std Support
//!
//! This module is fully `no_std` compatible with no heap allocations required.

/// Stable parameter identifier that survives reordering.
///
/// Session files and hosts record parameters by this ID. Once assigned, a
/// `ParamId` must never change for a given parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub u32);

/// Parameter capability flags for host communication.
///
/// Bitflag type; use [`union`](Self::union) to combine.
///
/// # Example
///
/// ```rust
/// use coro_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::AUTOMATABLE));
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!flags.contains(ParamFlags::HIDDEN));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Host can automate this parameter (default for all params).
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Parameter has discrete steps (enum-like, integer values).
    pub const STEPPED: Self = Self(1 << 1);
    /// Parameter should be hidden from generic host UI.
    pub const HIDDEN: Self = Self(1 << 2);
    /// Parameter is read-only (metering, display only).
    pub const READ_ONLY: Self = Self(1 << 3);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Trait for processors that expose introspectable parameters.
///
/// # Parameter Indexing
///
/// Parameters are accessed by zero-based index, stable for the lifetime of
/// the instance. Use [`param_count`](Self::param_count) to determine valid
/// indices.
///
/// # Thread Safety
///
/// This trait does not require thread safety. Cross-thread access goes
/// through whatever queue or atomic mirror the implementor provides.
pub trait ParameterInfo {
    /// Returns the number of parameters. Valid indices are `0..param_count()`.
    fn param_count(&self) -> usize;

    /// Returns the descriptor for the parameter at `index`, or `None` if out
    /// of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Gets the current value of the parameter at `index`.
    ///
    /// Returns `0.0` for out-of-range indices.
    fn get_param(&self, index: usize) -> f32;

    /// Sets the value of the parameter at `index`.
    ///
    /// Implementations clamp to the descriptor's range and ignore
    /// out-of-range indices.
    fn set_param(&mut self, index: usize, value: f32);

    /// Find a parameter index by name (case-insensitive).
    ///
    /// Matches against both [`ParamDescriptor::name`] and
    /// [`ParamDescriptor::short_name`].
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        for i in 0..self.param_count() {
            if let Some(desc) = self.param_info(i)
                && (desc.name.eq_ignore_ascii_case(name)
                    || desc.short_name.eq_ignore_ascii_case(name))
            {
                return Some(i);
            }
        }
        None
    }

    /// Find a parameter index by its stable string ID (exact match).
    fn find_param_by_string_id(&self, string_id: &str) -> Option<usize> {
        (0..self.param_count())
            .find(|&i| self.param_info(i).is_some_and(|d| d.string_id == string_id))
    }

    /// Returns the stable [`ParamId`] for the parameter at `index`.
    fn param_id(&self, index: usize) -> Option<ParamId> {
        self.param_info(index).map(|d| d.id)
    }

    /// Finds a parameter index by its stable [`ParamId`].
    ///
    /// Scans all parameters (O(n)). Use on setup paths.
    fn param_index_by_id(&self, id: ParamId) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.id == id))
    }
}

/// Describes a single parameter's metadata for display and validation.
///
/// # Short Name
///
/// `short_name` should be 8 characters or less for narrow displays.
///
/// # Step Size
///
/// `step` is the recommended increment: `1.0` for integer parameters, a small
/// value for continuous ones. Parameters flagged [`ParamFlags::STEPPED`] are
/// rounded to whole numbers by [`clamp`](Self::clamp).
///
/// # Example
///
/// ```rust
/// use coro_core::{ParamDescriptor, ParamFlags, ParamId};
///
/// let inversion = ParamDescriptor::stepped("Inversion", "Inv", 0.0, 3.0, 2.0)
///     .with_id(ParamId(1), "inversion");
/// assert!(inversion.flags.contains(ParamFlags::STEPPED));
/// assert_eq!(inversion.clamp(1.6), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display (e.g., "Key Center").
    pub name: &'static str,

    /// Short name for narrow displays, max 8 characters (e.g., "Key").
    pub short_name: &'static str,

    /// Unit type for formatting the parameter value.
    pub unit: ParamUnit,

    /// Minimum allowed value.
    pub min: f32,

    /// Maximum allowed value.
    pub max: f32,

    /// Value after initialization or reset.
    pub default: f32,

    /// Recommended step increment.
    pub step: f32,

    /// Stable numeric ID. Default: `ParamId(0)` (unassigned).
    pub id: ParamId,

    /// Human-readable stable ID for session files (snake_case).
    /// Default: `""` (unassigned).
    pub string_id: &'static str,

    /// Capability flags. Default: [`ParamFlags::AUTOMATABLE`].
    pub flags: ParamFlags,

    /// Parameter group for tree display (e.g., `"harmony"`, `"chords"`).
    ///
    /// Empty string means top-level (ungrouped).
    pub group: &'static str,
}

impl ParamDescriptor {
    /// Continuous parameter with a custom range and no unit.
    pub const fn new(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min,
            max,
            default,
            step: 0.01,
            id: ParamId(0),
            string_id: "",
            flags: ParamFlags::AUTOMATABLE,
            group: "",
        }
    }

    /// Integer parameter: step 1, [`ParamFlags::STEPPED`].
    pub const fn stepped(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        let mut desc = Self::new(name, short_name, min, max, default);
        desc.step = 1.0;
        desc.flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
        desc
    }

    /// On/off parameter: stepped over `0..=1`.
    pub const fn toggle(name: &'static str, short_name: &'static str, on: bool) -> Self {
        Self::stepped(name, short_name, 0.0, 1.0, if on { 1.0 } else { 0.0 })
    }

    /// Linear gain from 0 to `max`.
    pub const fn gain(name: &'static str, short_name: &'static str, max: f32, default: f32) -> Self {
        let mut desc = Self::new(name, short_name, 0.0, max, default);
        desc.unit = ParamUnit::Gain;
        desc
    }

    /// Interval in semitones, stepped.
    pub const fn semitones(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        let mut desc = Self::stepped(name, short_name, min, max, default);
        desc.unit = ParamUnit::Semitones;
        desc
    }

    /// Sets the stable parameter ID and string ID.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Sets the display unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the parameter flags.
    pub const fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the parameter group.
    pub const fn with_group(mut self, group: &'static str) -> Self {
        self.group = group;
        self
    }

    /// Clamps a value to this parameter's valid range.
    ///
    /// Stepped parameters are rounded to the nearest whole number first.
    /// NaN maps to the default.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coro_core::ParamDescriptor;
    ///
    /// let desc = ParamDescriptor::gain("Harmony Gain", "HGain", 2.0, 1.0);
    /// assert_eq!(desc.clamp(0.5), 0.5);
    /// assert_eq!(desc.clamp(-1.0), 0.0);
    /// assert_eq!(desc.clamp(9.0), 2.0);
    /// assert_eq!(desc.clamp(f32::NAN), 1.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let value = if self.flags.contains(ParamFlags::STEPPED) {
            libm::roundf(value)
        } else {
            value
        };
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Unit type for parameter display and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Linear gain factor.
    Gain,

    /// Equal-tempered semitones.
    Semitones,

    /// No unit - for indices, switches and dimensionless values.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coro_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Semitones.suffix(), " st");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Gain => "x",
            ParamUnit::Semitones => " st",
            ParamUnit::None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestVoice {
        gain: f32,
        transpose: f32,
    }

    impl TestVoice {
        fn new() -> Self {
            Self {
                gain: 1.0,
                transpose: 0.0,
            }
        }
    }

    impl ParameterInfo for TestVoice {
        fn param_count(&self) -> usize {
            2
        }

        fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
            match index {
                0 => Some(
                    ParamDescriptor::gain("Voice Gain", "VGain", 2.0, 1.0)
                        .with_id(ParamId(100), "voice_gain"),
                ),
                1 => Some(
                    ParamDescriptor::semitones("Transpose", "Trans", -12.0, 12.0, 0.0)
                        .with_id(ParamId(101), "transpose"),
                ),
                _ => None,
            }
        }

        fn get_param(&self, index: usize) -> f32 {
            match index {
                0 => self.gain,
                1 => self.transpose,
                _ => 0.0,
            }
        }

        fn set_param(&mut self, index: usize, value: f32) {
            let Some(desc) = self.param_info(index) else {
                return;
            };
            match index {
                0 => self.gain = desc.clamp(value),
                1 => self.transpose = desc.clamp(value),
                _ => {}
            }
        }
    }

    #[test]
    fn test_param_info() {
        let voice = TestVoice::new();
        assert_eq!(voice.param_count(), 2);

        let gain = voice.param_info(0).expect("should have gain param");
        assert_eq!(gain.name, "Voice Gain");
        assert_eq!(gain.unit, ParamUnit::Gain);
        assert_eq!(gain.max, 2.0);

        let transpose = voice.param_info(1).expect("should have transpose param");
        assert!(transpose.flags.contains(ParamFlags::STEPPED));
        assert_eq!(transpose.unit, ParamUnit::Semitones);

        assert!(voice.param_info(2).is_none());
    }

    #[test]
    fn test_param_clamping_and_rounding() {
        let mut voice = TestVoice::new();

        voice.set_param(0, 5.0);
        assert_eq!(voice.get_param(0), 2.0);

        voice.set_param(1, 4.4);
        assert_eq!(voice.get_param(1), 4.0);

        voice.set_param(1, -40.0);
        assert_eq!(voice.get_param(1), -12.0);
    }

    #[test]
    fn test_out_of_bounds_index() {
        let mut voice = TestVoice::new();
        assert_eq!(voice.get_param(99), 0.0);
        voice.set_param(99, 42.0);
        assert_eq!(voice.get_param(0), 1.0);
        assert_eq!(voice.get_param(1), 0.0);
    }

    #[test]
    fn test_lookup_helpers() {
        let voice = TestVoice::new();
        assert_eq!(voice.find_param_by_name("vgain"), Some(0));
        assert_eq!(voice.find_param_by_name("TRANSPOSE"), Some(1));
        assert_eq!(voice.find_param_by_string_id("transpose"), Some(1));
        assert_eq!(voice.find_param_by_string_id("missing"), None);
        assert_eq!(voice.param_id(1), Some(ParamId(101)));
        assert_eq!(voice.param_index_by_id(ParamId(100)), Some(0));
    }

    #[test]
    fn test_toggle_descriptor() {
        let on = ParamDescriptor::toggle("Bypass", "Bypass", true);
        assert_eq!(on.default, 1.0);
        assert_eq!(on.clamp(0.7), 1.0);
        assert_eq!(on.clamp(0.2), 0.0);
    }

    #[test]
    fn test_constructor_units() {
        assert_eq!(ParamDescriptor::gain("Gain", "Gain", 2.0, 1.0).unit.suffix(), "x");
        let interval = ParamDescriptor::semitones("Interval", "Intvl", -12.0, 12.0, 0.0);
        assert_eq!(interval.unit.suffix(), " st");
        assert_eq!(ParamDescriptor::toggle("On", "On", true).unit, ParamUnit::None);
    }
}
