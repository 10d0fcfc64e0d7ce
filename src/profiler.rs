use log::info;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// Séries glissantes par label (durées en ms, métriques scalaires).
#[derive(Default)]
struct ProfilerInner {
    timings: HashMap<&'static str, VecDeque<f32>>,
    metrics: HashMap<&'static str, VecDeque<f32>>,
}

/// Profiler partagé et thread-safe.
///
/// Les écritures utilisent `try_write` : sous contention l'échantillon est
/// abandonné plutôt que de bloquer l'appelant (thread audio).
#[derive(Clone)]
pub struct Profiler {
    inner: Arc<RwLock<ProfilerInner>>,
    max_samples: usize,
}

impl Profiler {
    pub fn new(max_samples: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ProfilerInner::default())),
            max_samples: max_samples.max(1),
        }
    }

    /// Mesure d'un bloc labelisé (RAII)
    pub fn measure(&self, label: &'static str) -> MeasureGuard<'_> {
        MeasureGuard {
            profiler: self,
            label,
            start: Instant::now(),
        }
    }

    /// Enregistre une durée (ms)
    pub fn record_timing(&self, label: &'static str, millis: f32) {
        self.push(label, millis, true);
    }

    /// Enregistre une métrique scalaire
    pub fn record_metric(&self, label: &'static str, value: f32) {
        self.push(label, value, false);
    }

    fn push(&self, label: &'static str, value: f32, timing: bool) {
        let Ok(mut inner) = self.inner.try_write() else {
            return;
        };
        let max_samples = self.max_samples;
        let series = if timing {
            inner.timings.entry(label).or_insert_with(|| VecDeque::with_capacity(max_samples))
        } else {
            inner.metrics.entry(label).or_insert_with(|| VecDeque::with_capacity(max_samples))
        };
        if series.len() >= max_samples {
            series.pop_front();
        }
        series.push_back(value);
    }

    /// Résumé des temps mesurés (moyenne, min, max)
    pub fn summary(&self) -> HashMap<&'static str, (f32, f32, f32)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        summarize_map(&inner.timings)
    }

    /// Résumé des métriques scalaires (moyenne, min, max)
    pub fn metrics_summary(&self) -> HashMap<&'static str, (f32, f32, f32)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        summarize_map(&inner.metrics)
    }

    /// Résumé pour une métrique spécifique
    pub fn metric_summary(&self, label: &str) -> Option<(f32, f32, f32)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .metrics
            .get(label)
            .filter(|s| !s.is_empty())
            .map(summarize_series)
    }

    /// Profile un bloc de code et retourne sa valeur de retour
    pub fn profile_block<T, F>(&self, label: &'static str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let _guard = self.measure(label);
        f()
    }

    /// Log toutes les métriques vers l'info log avec un target spécifique
    pub fn log_metrics_for_target(&self, target: &str) {
        for (label, (avg, min, max)) in self.summary() {
            info!(
                target: target,
                "{}: avg = {:.3} ms | min = {:.3} ms | max = {:.3} ms",
                label, avg, min, max
            );
        }
        for (label, (avg, min, max)) in self.metrics_summary() {
            info!(target: target, "{label}: avg={avg:.3}, min={min:.3}, max={max:.3}");
        }
    }
}

fn summarize_series(series: &VecDeque<f32>) -> (f32, f32, f32) {
    let avg = series.iter().sum::<f32>() / series.len() as f32;
    let min = series.iter().copied().fold(f32::MAX, f32::min);
    let max = series.iter().copied().fold(f32::MIN, f32::max);
    (avg, min, max)
}

fn summarize_map(map: &HashMap<&'static str, VecDeque<f32>>) -> HashMap<&'static str, (f32, f32, f32)> {
    map.iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (*k, summarize_series(v)))
        .collect()
}

/// Mesure d’un bloc labelisé (RAII)
pub struct MeasureGuard<'a> {
    profiler: &'a Profiler,
    label: &'static str,
    start: Instant,
}

impl Drop for MeasureGuard<'_> {
    fn drop(&mut self) {
        let dt = self.start.elapsed().as_secs_f32() * 1000.0;
        self.profiler.record_timing(self.label, dt);
    }
}

/// Macro helper : déduit automatiquement le target via le module appelant
#[macro_export]
macro_rules! log_metrics {
    ($profiler:expr) => {
        $profiler.log_metrics_for_target(module_path!());
    };
}
