//! Performance indicators and their metadata.
//!
//! cocoviz keeps a process-wide registry of known indicators so that callers
//! can refer to an indicator by name (e.g. `"hypervolume"`) without restating
//! whether larger values are better. The registry is pre-populated with common
//! quality indicators and can be extended with [`register`].
//!
//! Code that prefers to avoid global state can build its own
//! [`IndicatorRegistry`] and call its methods directly; the behaviour is the
//! same.

use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, ErrorDetails};

/// Description of a performance indicator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Indicator {
    /// Name of the indicator. Must match the column name in a `BenchmarkResult`.
    pub name: String,
    /// Human-readable name used for labels.
    pub display_name: String,
    /// `true` if larger values of the indicator are better.
    pub larger_is_better: bool,
}

impl Indicator {
    pub fn new(name: impl Into<String>, larger_is_better: bool) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            larger_is_better,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// Either the name of a registered indicator or an already resolved one.
#[derive(Clone, Copy, Debug)]
pub enum IndicatorRef<'a> {
    Name(&'a str),
    Indicator(&'a Indicator),
}

impl IndicatorRef<'_> {
    pub fn name(&self) -> &str {
        match self {
            IndicatorRef::Name(name) => name,
            IndicatorRef::Indicator(indicator) => &indicator.name,
        }
    }
}

impl<'a> From<&'a str> for IndicatorRef<'a> {
    fn from(name: &'a str) -> Self {
        IndicatorRef::Name(name)
    }
}

impl<'a> From<&'a String> for IndicatorRef<'a> {
    fn from(name: &'a String) -> Self {
        IndicatorRef::Name(name)
    }
}

impl<'a> From<&'a Indicator> for IndicatorRef<'a> {
    fn from(indicator: &'a Indicator) -> Self {
        IndicatorRef::Indicator(indicator)
    }
}

#[derive(Clone, Debug, Default)]
pub struct IndicatorRegistry {
    indicators: HashMap<String, Indicator>,
}

impl IndicatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the common quality indicators.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for indicator in default_indicators() {
            registry.indicators.insert(indicator.name.clone(), indicator);
        }
        registry
    }

    /// Adds `indicator`, replacing (with a warning) any entry of the same name.
    pub fn register(&mut self, indicator: Indicator) {
        if let Some(previous) = self.indicators.get(&indicator.name) {
            warn!(
                indicator = %indicator.name,
                previous_larger_is_better = previous.larger_is_better,
                larger_is_better = indicator.larger_is_better,
                "Overwriting registered indicator"
            );
        }
        self.indicators.insert(indicator.name.clone(), indicator);
    }

    /// Removes an indicator. Removing an unknown indicator is a no-op.
    pub fn deregister<'a>(&mut self, indicator: impl Into<IndicatorRef<'a>>) {
        let indicator = indicator.into();
        if self.indicators.remove(indicator.name()).is_none() {
            debug!(indicator = %indicator.name(), "Deregistering unknown indicator");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Indicator> {
        self.indicators.get(name)
    }

    /// Sorted names of all registered indicators.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indicators.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolves a name to its registered metadata. An [`Indicator`] is returned unchanged.
    pub fn resolve<'a>(&self, indicator: impl Into<IndicatorRef<'a>>) -> Result<Indicator, Error> {
        match indicator.into() {
            IndicatorRef::Indicator(indicator) => Ok(indicator.clone()),
            IndicatorRef::Name(name) => self.get(name).cloned().ok_or_else(|| {
                Error::new(ErrorDetails::UnknownIndicator {
                    name: name.to_string(),
                })
            }),
        }
    }
}

fn default_indicators() -> Vec<Indicator> {
    vec![
        Indicator::new("hypervolume", true).with_display_name("Hypervolume"),
        Indicator::new("hv", true).with_display_name("Hypervolume"),
        Indicator::new("r2", true).with_display_name("R2"),
        Indicator::new("igd", false).with_display_name("IGD"),
        Indicator::new("igd+", false).with_display_name("IGD+"),
        Indicator::new("time", false).with_display_name("Time"),
    ]
}

static KNOWN_INDICATORS: LazyLock<RwLock<IndicatorRegistry>> =
    LazyLock::new(|| RwLock::new(IndicatorRegistry::with_defaults()));

/// Register a new performance indicator in the process-wide registry.
pub fn register(indicator: Indicator) {
    KNOWN_INDICATORS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(indicator);
}

/// Remove an indicator from the process-wide registry.
pub fn deregister<'a>(indicator: impl Into<IndicatorRef<'a>>) {
    KNOWN_INDICATORS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .deregister(indicator);
}

/// Resolve an indicator against the process-wide registry.
pub fn resolve<'a>(indicator: impl Into<IndicatorRef<'a>>) -> Result<Indicator, Error> {
    KNOWN_INDICATORS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .resolve(indicator)
}

/// Like [`resolve`], but an unregistered name yields an ad-hoc indicator with
/// the given polarity instead of an error.
pub fn resolve_or_adhoc<'a>(
    indicator: impl Into<IndicatorRef<'a>>,
    larger_is_better: bool,
) -> Indicator {
    let indicator = indicator.into();
    let registry = KNOWN_INDICATORS
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    match indicator {
        IndicatorRef::Indicator(indicator) => indicator.clone(),
        IndicatorRef::Name(name) => match registry.get(name) {
            Some(known) => known.clone(),
            None => {
                debug!(
                    indicator = name,
                    larger_is_better, "Using unregistered indicator"
                );
                Indicator::new(name, larger_is_better)
            }
        },
    }
}

/// Snapshot of the process-wide registry.
pub fn registry() -> IndicatorRegistry {
    KNOWN_INDICATORS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
