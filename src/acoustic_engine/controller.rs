// =========================
// Chamber Controller (côté contrôle / UI)
// =========================
//
// Possède la géométrie, reconstruit le cache de rayons à chaque mutation et
// publie un instantané immuable `Arc<ChamberResponse>` vers le thread audio.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use crate::acoustic_engine::frequency_bands::is_valid_sample_rate;
use crate::acoustic_engine::ray_tracer::RayTracer;
use crate::acoustic_engine::response::{calculate_microphone_frequency_responses, ChamberResponse};
use crate::acoustic_engine::settings::AcousticSettings;
use crate::acoustic_engine::types::ChamberGeometry;
use crate::acoustic_engine::zone::Zone;

/// Profondeur de la file de publication vers l'audio.
pub const PUBLISH_QUEUE_DEPTH: usize = 2;
/// Profondeur de la file de retour des réponses consommées.
pub const RETIRE_QUEUE_DEPTH: usize = 8;

/// Extrémités de canal remises au consommateur audio.
///
/// `updates` : nouvelles réponses ; `retired` : réponses consommées, rendues
/// au contrôleur pour être libérées hors du thread audio.
#[derive(Debug, Clone)]
pub struct ResponseLink {
    pub updates: Receiver<Arc<ChamberResponse>>,
    pub retired: Sender<Arc<ChamberResponse>>,
}

/// Remet le drapeau de reconstruction à `false`, même en cas de panic.
struct RebuildGuard<'a>(&'a AtomicBool);

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ChamberController {
    geometry: Mutex<ChamberGeometry>,
    tracer: RayTracer,
    sample_rate: Mutex<f32>,
    rebuilding: AtomicBool,
    generation: AtomicU64,
    latest: RwLock<Arc<ChamberResponse>>,
    publish_tx: Sender<Arc<ChamberResponse>>,
    publish_rx: Receiver<Arc<ChamberResponse>>,
    retire_tx: Sender<Arc<ChamberResponse>>,
    retire_rx: Receiver<Arc<ChamberResponse>>,
}

impl ChamberController {
    pub fn new(settings: AcousticSettings, sample_rate: f32) -> Self {
        Self::with_geometry(settings, sample_rate, ChamberGeometry::default())
    }

    pub fn with_geometry(settings: AcousticSettings, sample_rate: f32, geometry: ChamberGeometry) -> Self {
        let tracer = RayTracer::new(settings);
        let (publish_tx, publish_rx) = bounded(PUBLISH_QUEUE_DEPTH);
        let (retire_tx, retire_rx) = bounded(RETIRE_QUEUE_DEPTH);

        // Réponse initiale, calculée sans passer par la file
        let rays = tracer.build_ray_cache(&geometry);
        let microphones = calculate_microphone_frequency_responses(&tracer, &geometry, &rays, sample_rate);
        let initial = Arc::new(ChamberResponse {
            generation: 0,
            sample_rate,
            geometry: geometry.clone(),
            rays,
            microphones,
        });

        let controller = Self {
            geometry: Mutex::new(geometry),
            tracer,
            sample_rate: Mutex::new(sample_rate),
            rebuilding: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            latest: RwLock::new(initial.clone()),
            publish_tx,
            publish_rx,
            retire_tx,
            retire_rx,
        };
        controller.publish(initial);
        controller
    }

    /// Canal vers le consommateur audio (un seul consommateur attendu).
    pub fn link(&self) -> ResponseLink {
        ResponseLink {
            updates: self.publish_rx.clone(),
            retired: self.retire_tx.clone(),
        }
    }

    pub fn settings(&self) -> &AcousticSettings {
        self.tracer.settings()
    }

    pub fn tracer(&self) -> &RayTracer {
        &self.tracer
    }

    fn lock_geometry(&self) -> MutexGuard<'_, ChamberGeometry> {
        self.geometry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copie de la géométrie courante.
    pub fn geometry(&self) -> ChamberGeometry {
        self.lock_geometry().clone()
    }

    /// Dernière réponse publiée (lecture UI : rayons, bandes).
    pub fn response(&self) -> Arc<ChamberResponse> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sample_rate(&self) -> f32 {
        *self.sample_rate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change le sample rate de référence des biquads publiés.
    pub fn set_sample_rate(&self, sample_rate: f32) {
        if !is_valid_sample_rate(sample_rate) {
            return;
        }
        *self.sample_rate.lock().unwrap_or_else(PoisonError::into_inner) = sample_rate;
        self.update_ray_cache();
    }

    pub fn is_rebuilding(&self) -> bool {
        self.rebuilding.load(Ordering::Acquire)
    }

    // =========================
    // Mutations de géométrie
    // =========================

    /// Applique plusieurs modifications puis une seule reconstruction.
    pub fn edit<F>(&self, f: F)
    where
        F: FnOnce(&mut ChamberGeometry),
    {
        f(&mut self.lock_geometry());
        self.update_ray_cache();
    }

    /// Modification unique ; reconstruit seulement si elle a eu lieu.
    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut ChamberGeometry) -> bool,
    {
        let changed = f(&mut self.lock_geometry());
        if changed {
            self.update_ray_cache();
        }
        changed
    }

    /// Ajoute une zone par défaut et retourne son index.
    pub fn add_zone(&self) -> usize {
        let index = self.lock_geometry().add_zone();
        self.update_ray_cache();
        index
    }

    pub fn remove_zone(&self, index: usize) -> bool {
        self.mutate(|g| g.remove_zone(index))
    }

    pub fn set_zone_density(&self, index: usize, density: f32) -> bool {
        self.mutate(|g| g.set_zone_density(index, density))
    }

    pub fn set_zone_bounds(&self, index: usize, x1: f32, y1: f32, x2: f32, y2: f32) -> bool {
        self.mutate(|g| g.set_zone_bounds(index, x1, y1, x2, y2))
    }

    pub fn set_speaker_position(&self, x: f32, y: f32) {
        self.mutate(|g| {
            g.set_speaker_position(x, y);
            true
        });
    }

    pub fn set_microphone_position(&self, mic: usize, x: f32, y: f32) -> bool {
        self.mutate(|g| g.set_microphone_position(mic, x, y))
    }

    pub fn set_default_density(&self, density: f32) {
        self.mutate(|g| {
            g.set_default_density(density);
            true
        });
    }

    pub fn zone(&self, index: usize) -> Option<Zone> {
        self.lock_geometry().zones.get(index).copied()
    }

    pub fn zone_count(&self) -> usize {
        self.lock_geometry().zones.len()
    }

    // =========================
    // Reconstruction + publication
    // =========================

    /// Reconstruit le cache de rayons et les réponses des micros.
    ///
    /// Retourne `false` si une reconstruction est déjà en cours (la demande
    /// est abandonnée, pas mise en attente).
    pub fn update_ray_cache(&self) -> bool {
        if self
            .rebuilding
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            debug!("Ray cache rebuild already running, request skipped");
            return false;
        }
        let _guard = RebuildGuard(&self.rebuilding);

        let start = Instant::now();
        let geometry = self.geometry();
        let sample_rate = self.sample_rate();

        let rays = self.tracer.build_ray_cache(&geometry);
        let microphones = calculate_microphone_frequency_responses(&self.tracer, &geometry, &rays, sample_rate);
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let response = Arc::new(ChamberResponse {
            generation,
            sample_rate,
            geometry,
            rays,
            microphones,
        });

        info!(
            "🔁 Ray cache #{} rebuilt: {} rays, {} zones, {:.2?}",
            generation,
            response.rays.len(),
            response.geometry.zones.len(),
            start.elapsed()
        );

        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = response.clone();
        self.publish(response);
        self.collect_retired();
        true
    }

    /// Envoie une réponse ; si la file est pleine, la plus ancienne est retirée.
    fn publish(&self, response: Arc<ChamberResponse>) {
        let mut pending = response;
        loop {
            match self.publish_tx.try_send(pending) {
                Ok(()) => return,
                Err(TrySendError::Full(back)) => {
                    if let Ok(stale) = self.publish_rx.try_recv() {
                        debug!("Dropping stale response #{}", stale.generation);
                    }
                    pending = back;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Libère les réponses rendues par le thread audio. Retourne leur nombre.
    pub fn collect_retired(&self) -> usize {
        self.retire_rx.try_iter().count()
    }

    /// Nombre de réponses publiées mais pas encore consommées.
    pub fn pending_responses(&self) -> usize {
        self.publish_tx.len()
    }
}

impl Default for ChamberController {
    fn default() -> Self {
        Self::new(AcousticSettings::default(), 48_000.0)
    }
}
