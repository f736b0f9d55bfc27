//! Natural emotion transitions.
//!
//! A pure lookup table from the current emotion to a fixed-capacity set of
//! plausible successors.  Only used for self-chaining after a triggered
//! animation and for idle continuation; sensor and command triggers never
//! consult it.

use heapless::Vec;
use rand::Rng;
use rand::seq::SliceRandom;

use super::{EmotionCatalog, IDLE_EMOTION};

/// Maximum successors per emotion.
pub const MAX_CANDIDATES: usize = 8;

pub type Candidates = Vec<&'static str, MAX_CANDIDATES>;

#[derive(Debug, Clone, Default)]
pub struct TransitionGraph {
    edges: std::vec::Vec<(&'static str, Candidates)>,
}

impl TransitionGraph {
    /// An empty graph: every lookup returns the idle emotion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from each profile's `transitions` list.
    /// Profiles with no transitions stay unconfigured.
    pub fn from_catalog(catalog: &EmotionCatalog) -> Self {
        let mut graph = Self::new();
        for profile in catalog.iter() {
            if !profile.transitions.is_empty() {
                graph.set(profile.name, profile.transitions);
            }
        }
        graph
    }

    /// Configure (or replace) the successors of `from`.
    /// Entries past [`MAX_CANDIDATES`] are ignored with a warning.
    pub fn set(&mut self, from: &'static str, to: &[&'static str]) {
        let mut candidates = Candidates::new();
        for &next in to {
            if candidates.push(next).is_err() {
                log::warn!("transitions: '{}' has more than {} successors", from, MAX_CANDIDATES);
                break;
            }
        }
        self.edges.retain(|(name, _)| *name != from);
        if !candidates.is_empty() {
            self.edges.push((from, candidates));
        }
    }

    pub fn candidates(&self, current: &str) -> Option<&[&'static str]> {
        self.edges
            .iter()
            .find(|(name, _)| *name == current)
            .map(|(_, c)| c.as_slice())
    }

    /// Uniformly random successor of `current`, or the idle emotion.
    pub fn next(&self, current: &str) -> &'static str {
        self.next_with(current, &mut rand::thread_rng())
    }

    pub fn next_with<R: Rng + ?Sized>(&self, current: &str, rng: &mut R) -> &'static str {
        match self.candidates(current).and_then(|c| c.choose(rng)) {
            Some(next) => {
                log::debug!("transition: {} -> {}", current, next);
                next
            }
            None => IDLE_EMOTION,
        }
    }
}
