//! Ranked define fallbacks for effect compilation.

use std::collections::BTreeMap;

/// Defines that may be dropped, rank by rank, when an effect fails to
/// compile.
///
/// Lower ranks are dropped first. Each call to [`EffectFallbacks::reduce`]
/// removes every define of the lowest remaining rank.
///
/// # Example
///
/// ```ignore
/// let mut fallbacks = EffectFallbacks::new();
/// fallbacks.add_fallback(0, "SPECULARTERM");
/// fallbacks.add_fallback(1, "NORMAL");
/// let options = EffectCreationOptions::new().with_fallbacks(fallbacks);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectFallbacks {
    ranks: BTreeMap<u32, Vec<String>>,
}

impl EffectFallbacks {
    /// Create an empty fallback list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a define that can be dropped at `rank`.
    pub fn add_fallback(&mut self, rank: u32, define: impl Into<String>) {
        self.ranks.entry(rank).or_default().push(define.into());
    }

    /// Whether another reduction is possible.
    pub fn is_more_fallbacks(&self) -> bool {
        !self.ranks.is_empty()
    }

    /// Drop the lowest rank from `defines`; returns the removed defines.
    pub fn reduce(&mut self, defines: &mut Vec<String>) -> Vec<String> {
        let Some((_, dropped)) = self.ranks.pop_first() else {
            return Vec::new();
        };
        defines.retain(|define| !dropped.iter().any(|d| define_name(define) == d));
        dropped
    }
}

fn define_name(define: &str) -> &str {
    define.split_whitespace().next().unwrap_or(define)
}
