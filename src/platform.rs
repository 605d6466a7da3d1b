//! Platform configuration: build-time capabilities, system properties and
//! the display composition mode.

use std::collections::HashMap;
use std::fmt::Debug;

/// Property that, when set to `1`, disables hardware (TrustZone) content protection.
pub const PROP_CP_LEVEL3: &str = "persist.gralloc.cp.level3";
/// Property selecting the display composition strategy.
pub const PROP_COMPOSITION_TYPE: &str = "debug.composition.type";

/// Capabilities of the target SoC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformConfig {
    /// The multimedia carveout is reserved for secure content only.
    pub secure_mm_heap: bool,
    /// The IOMMU heap exists.
    pub iommu: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            secure_mm_heap: true,
            iommu: true,
        }
    }
}

/// Source of system properties.
pub trait PropertySource: Debug + Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Integer value of a property, `None` when unset or unparsable.
    fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)?.trim().parse().ok()
    }
}

/// Reads properties from environment variables.
///
/// `persist.gralloc.cp.level3` is looked up as `PERSIST_GRALLOC_CP_LEVEL3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProperties;

impl EnvProperties {
    #[must_use]
    pub fn env_key(key: &str) -> String {
        key.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect()
    }
}

impl PropertySource for EnvProperties {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(Self::env_key(key)).ok().filter(|v| !v.is_empty())
    }
}

/// Fixed in-memory property set.
#[derive(Debug, Clone, Default)]
pub struct MapProperties {
    values: HashMap<String, String>,
}

impl MapProperties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl PropertySource for MapProperties {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// True unless `persist.gralloc.cp.level3` is `1`.
#[must_use]
pub fn use_tz_protection(props: &dyn PropertySource) -> bool {
    props.get_int(PROP_CP_LEVEL3) != Some(1)
}

/// How the display pipeline composes layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositionMode {
    #[default]
    Gpu,
    /// Every layer goes through the display controller (MDP).
    Mdp,
    C2d,
    Cpybit,
    Dyn,
}

impl CompositionMode {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "mdp" => Self::Mdp,
            "c2d" => Self::C2d,
            "cpybit" => Self::Cpybit,
            "dyn" => Self::Dyn,
            _ => Self::Gpu,
        }
    }

    /// Buffers are always scanned out by the display controller, so a
    /// system-heap buffer the controller cannot reach is useless.
    #[must_use]
    pub const fn routes_through_mdp(self) -> bool {
        matches!(self, Self::Mdp)
    }
}

pub trait CompositionSource: Debug + Send + Sync {
    fn composition_mode(&self) -> CompositionMode;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedComposition(pub CompositionMode);

impl CompositionSource for FixedComposition {
    fn composition_mode(&self) -> CompositionMode {
        self.0
    }
}

/// Reads `debug.composition.type` on every query.
#[derive(Debug)]
pub struct PropertyComposition<P> {
    props: P,
}

impl<P: PropertySource> PropertyComposition<P> {
    pub const fn new(props: P) -> Self {
        Self { props }
    }
}

impl<P: PropertySource> CompositionSource for PropertyComposition<P> {
    fn composition_mode(&self) -> CompositionMode {
        self.props
            .get(PROP_COMPOSITION_TYPE)
            .map_or(CompositionMode::Gpu, |v| CompositionMode::parse(&v))
    }
}
