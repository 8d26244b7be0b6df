//! The rendering fallback ladder and performance quality bands.
//!
//! AEGIS defines one official fallback ladder. There is no "broken page" -
//! only the most minimal form of the experience that the device can carry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rendering tier currently attempted by a fallback boundary.
///
/// Strictly ordered by capability requirement: `Immersive` demands the most
/// from the device, `Flat2d` the least. Degrading moves down the ladder one
/// tier at a time; there is no tier below `Flat2d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum FallbackLevel {
    /// Full WebXR immersive session.
    Immersive = 0,

    /// Plain 3D canvas without an XR session.
    Rendered3d = 1,

    /// Static 2D view. The floor of the ladder.
    Flat2d = 2,
}

impl FallbackLevel {
    /// Get the tier number (0 = richest, 2 = floor)
    pub fn tier(&self) -> u8 {
        *self as u8
    }

    /// Get the tier name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::Immersive => "immersive",
            Self::Rendered3d => "rendered3d",
            Self::Flat2d => "flat2d",
        }
    }

    /// Get the next stricter-compatible tier (less demanding)
    /// Returns None if already at Flat2d (cannot degrade further)
    pub fn degrade(&self) -> Option<Self> {
        match self {
            Self::Immersive => Some(Self::Rendered3d),
            Self::Rendered3d => Some(Self::Flat2d),
            Self::Flat2d => None, // Cannot degrade further - this is the floor
        }
    }

    /// Get the next richer tier (more demanding)
    /// Returns None if already at Immersive
    pub fn improve(&self) -> Option<Self> {
        match self {
            Self::Immersive => None, // Already at the richest tier
            Self::Rendered3d => Some(Self::Immersive),
            Self::Flat2d => Some(Self::Rendered3d),
        }
    }

    /// Check if this tier demands less from the device than another
    pub fn is_stricter_than(&self, other: Self) -> bool {
        self.tier() > other.tier()
    }

    /// Check if this tier demands more from the device than another
    pub fn is_richer_than(&self, other: Self) -> bool {
        self.tier() < other.tier()
    }

    /// Whether this tier is the floor of the ladder
    pub fn is_floor(&self) -> bool {
        matches!(self, Self::Flat2d)
    }

    /// Get all tiers from richest to floor
    pub fn all() -> &'static [Self] {
        &[Self::Immersive, Self::Rendered3d, Self::Flat2d]
    }
}

impl fmt::Display for FallbackLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Coarse classification of recent rendering performance.
///
/// Orders naturally: `Reduced < Normal < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Below 30 FPS: cut animation cost, settle faster
    Reduced,

    /// 30 to 50 FPS: presets used as-is
    Normal,

    /// 50 FPS and above: full fidelity
    High,
}

impl QualityLevel {
    /// Get the band name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reduced => "reduced",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
