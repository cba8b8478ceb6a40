//! Status effect definitions granted by custom roles

use std::fmt;

use serde::{Deserialize, Serialize};

/// Duration handed to the native effect system for effects that must not lapse
pub const INFINITE_DURATION: f32 = f32::MAX;

/// Status effects a role can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectType {
    MovementBoost,
    Scp207,
    Invisible,
    SilentWalk,
    DamageReduction,
    BodyshotReduction,
    Vitality,
    Invigorated,
    Slowness,
    Deafened,
    Blinded,
    Bleeding,
    Burned,
    Concussed,
    Disabled,
    Ensnared,
    Exhausted,
    Poisoned,
    SpawnProtected,
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An effect declared on a custom role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Which effect
    pub effect_type: EffectType,

    /// Intensity (stacks) the effect is applied at
    #[serde(default = "default_intensity")]
    pub intensity: u8,

    /// Duration in seconds; zero or negative means the effect never lapses
    #[serde(default = "default_duration")]
    pub duration: f32,
}

fn default_intensity() -> u8 {
    1
}

fn default_duration() -> f32 {
    -1.0
}

impl EffectDefinition {
    pub fn new(effect_type: EffectType, intensity: u8, duration: f32) -> Self {
        Self {
            effect_type,
            intensity,
            duration,
        }
    }

    /// Create an effect that is kept alive for the whole life of the role
    pub fn infinite(effect_type: EffectType, intensity: u8) -> Self {
        Self::new(effect_type, intensity, -1.0)
    }

    /// Whether the effect must never be allowed to expire
    pub fn is_infinite(&self) -> bool {
        self.duration <= 0.0
    }

    /// Duration to hand to the native effect system
    pub fn applied_duration(&self) -> f32 {
        if self.is_infinite() {
            INFINITE_DURATION
        } else {
            self.duration
        }
    }
}
