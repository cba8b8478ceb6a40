//! Capability modules
//!
//! A role declares [`CustomFlags`]; at instance creation the
//! [`ModuleCatalogue`] turns every set flag into a module instance and the
//! result is stored in a [`ModuleSet`] keyed by [`ModuleKind`]. Lookup is by
//! exact kind.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::host::PlayerId;
use crate::types::CustomRole;

use super::InstanceId;

// ─────────────────────────────────────────────────────────────────
// Module Kind
// ─────────────────────────────────────────────────────────────────

/// Built-in capability module kinds. The discriminant is the flag bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ModuleKind {
    /// Footsteps are not heard by other players
    SilentWalker = 0,
    /// Heals on dealing damage
    LifeStealer = 1,
    /// Heals for half the damage dealt
    HalfLifeStealer = 2,
    /// Cannot deal damage until damaged
    PacifismUntilDamage = 3,
    /// Tesla gates ignore the holder
    DoNotTriggerTeslaGates = 4,
    /// Appearance-based targeting ignores the holder
    NotAffectedByAppearance = 5,
    /// Death is announced like an SCP termination
    CustomScpAnnouncer = 6,
    /// Ragdoll spawns with the tutorial model
    TutorialRagdoll = 7,
}

impl ModuleKind {
    /// Get all module kinds
    pub fn all() -> &'static [ModuleKind] {
        &[
            ModuleKind::SilentWalker,
            ModuleKind::LifeStealer,
            ModuleKind::HalfLifeStealer,
            ModuleKind::PacifismUntilDamage,
            ModuleKind::DoNotTriggerTeslaGates,
            ModuleKind::NotAffectedByAppearance,
            ModuleKind::CustomScpAnnouncer,
            ModuleKind::TutorialRagdoll,
        ]
    }

    /// Get the module name
    pub fn name(&self) -> &'static str {
        match self {
            ModuleKind::SilentWalker => "silent-walker",
            ModuleKind::LifeStealer => "life-stealer",
            ModuleKind::HalfLifeStealer => "half-life-stealer",
            ModuleKind::PacifismUntilDamage => "pacifism-until-damage",
            ModuleKind::DoNotTriggerTeslaGates => "do-not-trigger-tesla-gates",
            ModuleKind::NotAffectedByAppearance => "not-affected-by-appearance",
            ModuleKind::CustomScpAnnouncer => "custom-scp-announcer",
            ModuleKind::TutorialRagdoll => "tutorial-ragdoll",
        }
    }

    /// Parse from a module name
    pub fn from_name(s: &str) -> Option<Self> {
        ModuleKind::all()
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
    }

    fn mask(&self) -> u32 {
        1 << (*self as u8)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ─────────────────────────────────────────────────────────────────
// Custom Flags
// ─────────────────────────────────────────────────────────────────

/// Bitmask of module kinds a role requests.
///
/// Serialized as a list of kinds so catalogue files stay readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<ModuleKind>", into = "Vec<ModuleKind>")]
pub struct CustomFlags(u32);

impl CustomFlags {
    pub const NONE: CustomFlags = CustomFlags(0);

    pub fn from_kinds(kinds: &[ModuleKind]) -> Self {
        let mut flags = Self::NONE;
        for kind in kinds {
            flags.insert(*kind);
        }
        flags
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, kind: ModuleKind) {
        self.0 |= kind.mask();
    }

    pub fn remove(&mut self, kind: ModuleKind) {
        self.0 &= !kind.mask();
    }

    pub fn contains(&self, kind: ModuleKind) -> bool {
        self.0 & kind.mask() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Set kinds in bit order
    pub fn kinds(&self) -> Vec<ModuleKind> {
        ModuleKind::all()
            .iter()
            .copied()
            .filter(|k| self.contains(*k))
            .collect()
    }
}

impl From<Vec<ModuleKind>> for CustomFlags {
    fn from(kinds: Vec<ModuleKind>) -> Self {
        Self::from_kinds(&kinds)
    }
}

impl From<CustomFlags> for Vec<ModuleKind> {
    fn from(flags: CustomFlags) -> Self {
        flags.kinds()
    }
}

// ─────────────────────────────────────────────────────────────────
// Module Trait
// ─────────────────────────────────────────────────────────────────

/// A behaviour unit attached to a role instance
pub trait CustomModule: Send + Sync + fmt::Debug {
    /// Kind this module was built for
    fn kind(&self) -> ModuleKind;
}

/// What a module constructor gets to see of the instance being created
#[derive(Debug, Clone, Copy)]
pub struct ModuleContext<'a> {
    pub instance: &'a InstanceId,
    pub player: PlayerId,
    pub role: &'a CustomRole,
}

/// Builds a module for an instance under construction
pub type ModuleConstructor = fn(&ModuleContext<'_>) -> Box<dyn CustomModule>;

/// Default module carrying only its kind and owner. Hosts that implement
/// behaviour register their own constructor for the kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagModule {
    pub kind: ModuleKind,
    pub instance: InstanceId,
    pub player: PlayerId,
}

impl CustomModule for FlagModule {
    fn kind(&self) -> ModuleKind {
        self.kind
    }
}

macro_rules! flag_constructor {
    ($kind:expr) => {{
        fn construct(ctx: &ModuleContext<'_>) -> Box<dyn CustomModule> {
            Box::new(FlagModule {
                kind: $kind,
                instance: ctx.instance.clone(),
                player: ctx.player,
            })
        }
        construct as ModuleConstructor
    }};
}

// ─────────────────────────────────────────────────────────────────
// Module Catalogue
// ─────────────────────────────────────────────────────────────────

/// Maps module kinds to constructors
pub struct ModuleCatalogue {
    constructors: HashMap<ModuleKind, ModuleConstructor>,
}

impl ModuleCatalogue {
    /// Create an empty catalogue
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Create a catalogue with a [`FlagModule`] constructor for every kind
    pub fn with_defaults() -> Self {
        let mut catalogue = Self::new();
        catalogue.register(ModuleKind::SilentWalker, flag_constructor!(ModuleKind::SilentWalker));
        catalogue.register(ModuleKind::LifeStealer, flag_constructor!(ModuleKind::LifeStealer));
        catalogue.register(ModuleKind::HalfLifeStealer, flag_constructor!(ModuleKind::HalfLifeStealer));
        catalogue.register(
            ModuleKind::PacifismUntilDamage,
            flag_constructor!(ModuleKind::PacifismUntilDamage),
        );
        catalogue.register(
            ModuleKind::DoNotTriggerTeslaGates,
            flag_constructor!(ModuleKind::DoNotTriggerTeslaGates),
        );
        catalogue.register(
            ModuleKind::NotAffectedByAppearance,
            flag_constructor!(ModuleKind::NotAffectedByAppearance),
        );
        catalogue.register(
            ModuleKind::CustomScpAnnouncer,
            flag_constructor!(ModuleKind::CustomScpAnnouncer),
        );
        catalogue.register(ModuleKind::TutorialRagdoll, flag_constructor!(ModuleKind::TutorialRagdoll));
        catalogue
    }

    /// Register (or replace) the constructor for a kind
    pub fn register(&mut self, kind: ModuleKind, constructor: ModuleConstructor) {
        self.constructors.insert(kind, constructor);
    }

    /// Build the module set requested by `flags`
    pub fn load(&self, flags: CustomFlags, ctx: &ModuleContext<'_>) -> ModuleSet {
        let mut set = ModuleSet::default();

        for kind in flags.kinds() {
            let Some(constructor) = self.constructors.get(&kind) else {
                warn!(
                    module = %kind,
                    role_id = ctx.role.id,
                    "No constructor registered for requested module"
                );
                continue;
            };

            let module = constructor(ctx);
            if module.kind() != kind {
                warn!(
                    requested = %kind,
                    built = %module.kind(),
                    "Module constructor built a different kind"
                );
            }
            set.modules.insert(kind, module);
        }

        debug!(
            instance = %ctx.instance,
            modules = ?set.kinds(),
            "Capability modules loaded"
        );

        set
    }
}

impl Default for ModuleCatalogue {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ─────────────────────────────────────────────────────────────────
// Module Set
// ─────────────────────────────────────────────────────────────────

/// Modules attached to one role instance
#[derive(Debug, Default)]
pub struct ModuleSet {
    modules: HashMap<ModuleKind, Box<dyn CustomModule>>,
}

impl ModuleSet {
    /// Get the module of exactly this kind
    pub fn get(&self, kind: ModuleKind) -> Option<&dyn CustomModule> {
        self.modules.get(&kind).map(|m| m.as_ref())
    }

    pub fn has(&self, kind: ModuleKind) -> bool {
        self.get(kind).is_some()
    }

    /// Loaded kinds in bit order
    pub fn kinds(&self) -> Vec<ModuleKind> {
        let mut kinds: Vec<_> = self.modules.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoleTypeId;

    fn ctx_for<'a>(id: &'a InstanceId, role: &'a CustomRole) -> ModuleContext<'a> {
        ModuleContext {
            instance: id,
            player: PlayerId(1),
            role,
        }
    }

    #[test]
    fn test_flags_roundtrip_kinds() {
        let flags = CustomFlags::from_kinds(&[ModuleKind::LifeStealer, ModuleKind::SilentWalker]);
        assert!(flags.contains(ModuleKind::LifeStealer));
        assert!(!flags.contains(ModuleKind::TutorialRagdoll));
        assert_eq!(flags.kinds(), vec![ModuleKind::SilentWalker, ModuleKind::LifeStealer]);
    }

    #[test]
    fn test_flags_insert_remove() {
        let mut flags = CustomFlags::NONE;
        assert!(flags.is_empty());
        flags.insert(ModuleKind::CustomScpAnnouncer);
        assert_eq!(flags.bits(), 1 << 6);
        flags.remove(ModuleKind::CustomScpAnnouncer);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_flags_from_toml_list() {
        #[derive(Deserialize)]
        struct Wrapper {
            flags: CustomFlags,
        }
        let parsed: Wrapper =
            toml::from_str(r#"flags = ["SilentWalker", "DoNotTriggerTeslaGates"]"#).unwrap();
        assert!(parsed.flags.contains(ModuleKind::SilentWalker));
        assert!(parsed.flags.contains(ModuleKind::DoNotTriggerTeslaGates));
        assert_eq!(parsed.flags.kinds().len(), 2);
    }

    #[test]
    fn test_module_kind_names() {
        assert_eq!(ModuleKind::from_name("life-stealer"), Some(ModuleKind::LifeStealer));
        assert_eq!(ModuleKind::from_name("LIFE-STEALER"), Some(ModuleKind::LifeStealer));
        assert_eq!(ModuleKind::from_name("flying"), None);
    }

    #[test]
    fn test_load_matches_flags_exactly() {
        let catalogue = ModuleCatalogue::with_defaults();
        let role = CustomRole::new(1, "Thief", RoleTypeId::ClassD)
            .with_flags(CustomFlags::from_kinds(&[ModuleKind::LifeStealer]));
        let id = InstanceId::new();

        let set = catalogue.load(role.custom_flags, &ctx_for(&id, &role));

        for kind in ModuleKind::all() {
            let requested = role.custom_flags.contains(*kind);
            assert_eq!(set.get(*kind).is_some(), requested, "kind {}", kind);
            assert_eq!(set.has(*kind), set.get(*kind).is_some());
        }
        assert_eq!(set.get(ModuleKind::LifeStealer).map(|m| m.kind()), Some(ModuleKind::LifeStealer));
    }

    #[test]
    fn test_lookup_is_exact_kind() {
        let catalogue = ModuleCatalogue::with_defaults();
        let role = CustomRole::new(1, "Half", RoleTypeId::ClassD)
            .with_flags(CustomFlags::from_kinds(&[ModuleKind::HalfLifeStealer]));
        let id = InstanceId::new();

        let set = catalogue.load(role.custom_flags, &ctx_for(&id, &role));
        assert!(set.has(ModuleKind::HalfLifeStealer));
        assert!(!set.has(ModuleKind::LifeStealer));
    }

    #[test]
    fn test_missing_constructor_is_skipped() {
        let catalogue = ModuleCatalogue::new();
        let role = CustomRole::new(1, "Empty", RoleTypeId::ClassD)
            .with_flags(CustomFlags::from_kinds(&[ModuleKind::SilentWalker]));
        let id = InstanceId::new();

        let set = catalogue.load(role.custom_flags, &ctx_for(&id, &role));
        assert!(set.is_empty());
        assert!(set.get(ModuleKind::SilentWalker).is_none());
    }

    #[test]
    fn test_custom_constructor_replaces_default() {
        #[derive(Debug)]
        struct Stealer {
            ratio: f32,
        }
        impl CustomModule for Stealer {
            fn kind(&self) -> ModuleKind {
                ModuleKind::LifeStealer
            }
        }
        fn build(_: &ModuleContext<'_>) -> Box<dyn CustomModule> {
            Box::new(Stealer { ratio: 0.25 })
        }

        let mut catalogue = ModuleCatalogue::with_defaults();
        catalogue.register(ModuleKind::LifeStealer, build);
        let role = CustomRole::new(1, "Thief", RoleTypeId::ClassD)
            .with_flags(CustomFlags::from_kinds(&[ModuleKind::LifeStealer]));
        let id = InstanceId::new();

        let set = catalogue.load(role.custom_flags, &ctx_for(&id, &role));
        let module = set.get(ModuleKind::LifeStealer).unwrap();
        assert!(format!("{:?}", module).contains("0.25"));
    }
}
