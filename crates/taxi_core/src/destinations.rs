//! Quick-pick destinations supplied by the host config.

use crate::contract::OverlayConfig;
use crate::format::quick_label;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickDestination {
    name: String,
    index: usize,
}

impl QuickDestination {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the registry, 0-based.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position as the host numbers it, 1-based.
    pub fn wire_index(&self) -> u32 {
        u32::try_from(self.index + 1).unwrap_or(u32::MAX)
    }
}

/// Ordered, read-only list of preset destinations for one overlay session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickDestinations {
    entries: Vec<QuickDestination>,
}

impl QuickDestinations {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| QuickDestination {
                name: name.into(),
                index,
            })
            .collect();
        Self { entries }
    }

    /// A config without `PresetLocations` yields an empty registry.
    pub fn from_config(config: &OverlayConfig) -> Self {
        let names = config
            .preset_locations
            .iter()
            .flatten()
            .map(|location| location.name.clone());
        Self::from_names(names)
    }

    pub fn get(&self, index: usize) -> Option<&QuickDestination> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuickDestination> {
        self.entries.iter()
    }

    /// Button labels in registry order.
    pub fn labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|destination| quick_label(&destination.name))
            .collect()
    }
}
