//! Memoization of engine runs by exact request.
//!
//! Interactive front ends re-run the same (SRT, influent) pair whenever a
//! control is touched. Runs are deterministic, so a trajectory computed once
//! for a request can be handed out again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bp_asm1::{Engine, EngineResult, SimulationRequest, Trajectory};
use tracing::debug;

/// Bit patterns of the request fields. `-0.0` and `0.0` are distinct keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    srt_days: u64,
    influent_ammonium: u64,
    influent_substrate: Option<u64>,
    step_feed_fraction: Option<u64>,
}

impl CacheKey {
    fn of(request: &SimulationRequest) -> Self {
        Self {
            srt_days: request.srt_days.to_bits(),
            influent_ammonium: request.influent_ammonium.to_bits(),
            influent_substrate: request.influent_substrate.map(f64::to_bits),
            step_feed_fraction: request.step_feed_fraction.map(f64::to_bits),
        }
    }
}

/// Thread-safe cache of trajectories for one engine configuration.
///
/// Two threads missing on the same key may both run the engine; the results
/// are identical and the second insert is dropped.
#[derive(Default)]
pub struct SimulationCache {
    entries: Mutex<HashMap<CacheKey, Arc<Trajectory>>>,
}

impl SimulationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached trajectory for `request`, running `engine` on a miss.
    ///
    /// Failed runs are not cached.
    pub fn get_or_run(
        &self,
        engine: &Engine,
        request: &SimulationRequest,
    ) -> EngineResult<Arc<Trajectory>> {
        let key = CacheKey::of(request);
        if let Some(hit) = self.lock().get(&key) {
            debug!(srt_days = request.srt_days, "simulation cache hit");
            return Ok(Arc::clone(hit));
        }

        let trajectory = Arc::new(engine.run(request)?);
        let stored = self
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::clone(&trajectory))
            .clone();
        Ok(stored)
    }

    pub fn contains(&self, request: &SimulationRequest) -> bool {
        self.lock().contains_key(&CacheKey::of(request))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Entries are inserted whole, so a poisoned map is still consistent.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Arc<Trajectory>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_distinguish_every_field() {
        let base = SimulationRequest::new(10.0, 50.0);
        let keys = [
            CacheKey::of(&base),
            CacheKey::of(&SimulationRequest::new(10.5, 50.0)),
            CacheKey::of(&SimulationRequest::new(10.0, 51.0)),
            CacheKey::of(&base.clone().with_substrate(300.0)),
            CacheKey::of(&base.clone().with_step_feed_fraction(0.15)),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(CacheKey::of(&base), CacheKey::of(&SimulationRequest::new(10.0, 50.0)));
    }

    #[test]
    fn failed_runs_are_not_cached() {
        let engine = Engine::with_defaults().unwrap();
        let cache = SimulationCache::new();
        let bad = SimulationRequest::new(-1.0, 50.0);
        assert!(cache.get_or_run(&engine, &bad).is_err());
        assert!(cache.is_empty());
    }
}
