//! Fetch modes, precedence and strategy modifiers

use std::fmt;
use std::str::FromStr;

use crate::domain::DomainError;

/// Primary fetch mode; exactly one is honored per fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FetchMode {
    /// Network only, the cache is never read
    NetworkOnly,
    /// Cache only, the network is never touched
    LocalOnly,
    /// Cache first, network on a miss
    LocalFirst,
    /// Cached outcome (if any) immediately, then the network outcome
    LocalAndNetwork,
    /// Network first, cache on network failure
    #[default]
    NetworkFirst,
}

impl FetchMode {
    pub const ALL: [FetchMode; 5] = [
        FetchMode::NetworkOnly,
        FetchMode::LocalOnly,
        FetchMode::LocalFirst,
        FetchMode::LocalAndNetwork,
        FetchMode::NetworkFirst,
    ];

    /// Rank used when several modes are requested at once; higher wins
    pub fn precedence(self) -> u8 {
        match self {
            FetchMode::NetworkOnly => 4,
            FetchMode::LocalOnly => 3,
            FetchMode::LocalFirst => 2,
            FetchMode::LocalAndNetwork => 1,
            FetchMode::NetworkFirst => 0,
        }
    }

    /// Picks the highest-precedence mode, `NetworkFirst` when none is given
    pub fn resolve(modes: impl IntoIterator<Item = FetchMode>) -> FetchMode {
        modes
            .into_iter()
            .max_by_key(|mode| mode.precedence())
            .unwrap_or_default()
    }

    /// Upper bound of outcomes delivered for one fetch in this mode
    pub fn max_deliveries(self) -> usize {
        match self {
            FetchMode::LocalAndNetwork => 2,
            _ => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::NetworkOnly => "network_only",
            FetchMode::LocalOnly => "local_only",
            FetchMode::LocalFirst => "local_first",
            FetchMode::LocalAndNetwork => "local_and_network",
            FetchMode::NetworkFirst => "network_first",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "network_only" | "net_only" | "network" => Ok(FetchMode::NetworkOnly),
            "local_only" | "cache_only" | "local" => Ok(FetchMode::LocalOnly),
            "local_first" | "cache_first" => Ok(FetchMode::LocalFirst),
            "local_and_network" | "cache_then_network" => Ok(FetchMode::LocalAndNetwork),
            "network_first" | "network_with_fallback" => Ok(FetchMode::NetworkFirst),
            _ => Err(DomainError::configuration(format!(
                "Unknown fetch mode: {}. Valid modes: network_only, local_only, local_first, local_and_network, network_first",
                s
            ))),
        }
    }
}

/// Primary mode plus orthogonal modifiers governing one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Strategy {
    pub mode: FetchMode,
    /// Skip writing a successful network payload to the cache
    pub suppress_cache_update: bool,
    /// Delete the entry from both tiers once the final outcome is delivered
    pub delete_cache_after_completion: bool,
}

impl Strategy {
    pub fn new(mode: FetchMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Builds a strategy from several requested modes using precedence
    pub fn from_modes(modes: impl IntoIterator<Item = FetchMode>) -> Self {
        Self::new(FetchMode::resolve(modes))
    }

    pub fn with_suppressed_cache_update(mut self) -> Self {
        self.suppress_cache_update = true;
        self
    }

    pub fn with_delete_after_completion(mut self) -> Self {
        self.delete_cache_after_completion = true;
        self
    }
}

impl From<FetchMode> for Strategy {
    fn from(mode: FetchMode) -> Self {
        Self::new(mode)
    }
}
