// =========================
// Frequency Response Accumulator
// =========================

use std::array;

use crate::acoustic_engine::frequency_bands::MicFrequencyBands;
use crate::acoustic_engine::physics;
use crate::acoustic_engine::ray_tracer::RayTracer;
use crate::acoustic_engine::types::{ChamberGeometry, Ray, NUM_MICROPHONES};

/// Écart toléré entre l'impact du rayon direct et la position du micro.
pub const DIRECT_PATH_TOLERANCE: f32 = 1e-3;

/// Résultat immuable d'une reconstruction, publié vers le thread audio.
#[derive(Debug, Clone)]
pub struct ChamberResponse {
    /// Numéro de reconstruction (croissant)
    pub generation: u64,
    pub sample_rate: f32,
    pub geometry: ChamberGeometry,
    pub rays: Vec<Ray>,
    pub microphones: [MicFrequencyBands; NUM_MICROPHONES],
}

impl ChamberResponse {
    pub fn microphone(&self, mic: usize) -> Option<&MicFrequencyBands> {
        self.microphones.get(mic)
    }
}

/// Contribution du chemin direct haut-parleur -> micro, ou `None` si masqué.
///
/// Le chemin est libre si le premier impact est au niveau du micro ou au-delà.
pub fn direct_path_gain(tracer: &RayTracer, geometry: &ChamberGeometry, mic: usize) -> Option<f32> {
    let mic_pos = *geometry.microphones.get(mic)?;
    let offset = mic_pos - geometry.speaker;
    let mut direct = Ray::new(geometry.speaker, offset);
    direct.distance = physics::distance(geometry.speaker, mic_pos);

    let hit = tracer.trace_ray(geometry, &direct);
    if !hit.hit || hit.distance > direct.distance - DIRECT_PATH_TOLERANCE {
        Some(1.0 / (1.0 + direct.distance * 5.0))
    } else {
        None
    }
}

/// Réponse d'un micro à partir du cache de rayons.
///
/// Chemin direct + somme pondérée des bandes de chaque rayon significatif,
/// normalisation vers le bas, coupure des bandes basses, puis biquads.
pub fn calculate_microphone_response(
    tracer: &RayTracer,
    geometry: &ChamberGeometry,
    rays: &[Ray],
    mic: usize,
    sample_rate: f32,
) -> MicFrequencyBands {
    let settings = tracer.settings();
    let mut response = MicFrequencyBands::new();
    response.reset(0.0);

    let Some(&mic_pos) = geometry.microphones.get(mic) else {
        return response;
    };

    if let Some(gain) = direct_path_gain(tracer, geometry, mic) {
        response.add_uniform(gain);
    }

    for ray in rays.iter().filter(|r| r.intensity > settings.significance_threshold()) {
        let contribution = tracer.calculate_ray_contribution(ray, mic_pos);
        if contribution > 0.0 {
            response.accumulate(&ray.frequency_bands, contribution);
        }
    }

    response.downward_normalize();
    response.zero_lowest(settings.low_band_cut());
    response.calculate_biquad_coefficients(sample_rate);
    response
}

/// Réponses des trois micros pour un même cache de rayons.
pub fn calculate_microphone_frequency_responses(
    tracer: &RayTracer,
    geometry: &ChamberGeometry,
    rays: &[Ray],
    sample_rate: f32,
) -> [MicFrequencyBands; NUM_MICROPHONES] {
    array::from_fn(|mic| calculate_microphone_response(tracer, geometry, rays, mic, sample_rate))
}
