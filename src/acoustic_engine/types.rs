use glam::Vec2;

use crate::acoustic_engine::frequency_bands::MicFrequencyBands;
use crate::acoustic_engine::zone::{clamp_density, clamp_unit, Zone};

/// Nombre de micros de la chambre.
pub const NUM_MICROPHONES: usize = 3;

// =========================
// Ray
// =========================

/// Chemin sonore élémentaire.
///
/// `distance` est cumulée le long de la chaîne de rebonds.
#[derive(Debug, Clone)]
pub struct Ray {
    pub origin: Vec2,
    pub direction: Vec2,
    pub intensity: f32,
    pub distance: f32,
    pub bounce_count: u32,
    pub frequency_bands: MicFrequencyBands,
}

impl Ray {
    /// Rayon primaire : intensité 1.0, toutes les bandes à 1.0.
    ///
    /// Une direction nulle est conservée telle quelle (pas de normalisation).
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(direction),
            intensity: 1.0,
            distance: 0.0,
            bounce_count: 0,
            frequency_bands: MicFrequencyBands::new(),
        }
    }
}

// =========================
// Intersection
// =========================

/// Mur extérieur de la chambre unité.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Left,
    Right,
    Bottom,
    Top,
}

impl Wall {
    /// Normale orientée vers l'intérieur de la chambre.
    pub fn inward_normal(self) -> Vec2 {
        match self {
            Wall::Left => Vec2::X,
            Wall::Right => Vec2::NEG_X,
            Wall::Bottom => Vec2::Y,
            Wall::Top => Vec2::NEG_Y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub hit: bool,
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
    pub is_wall: bool,
    pub wall: Option<Wall>,
    /// `None` pour un mur
    pub zone_id: Option<usize>,
}

impl Intersection {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            distance: f32::INFINITY,
            is_wall: false,
            wall: None,
            zone_id: None,
        }
    }
}

// =========================
// ChamberGeometry
// =========================

/// Instantané immuable de la géométrie, passé au ray tracer à chaque appel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChamberGeometry {
    pub speaker: Vec2,
    pub microphones: [Vec2; NUM_MICROPHONES],
    pub zones: Vec<Zone>,
    pub default_density: f32,
}

impl Default for ChamberGeometry {
    fn default() -> Self {
        Self {
            speaker: Vec2::new(0.0, 0.5),
            microphones: [
                Vec2::new(0.75, 0.25),
                Vec2::new(0.75, 0.5),
                Vec2::new(0.75, 0.75),
            ],
            zones: Vec::new(),
            default_density: 1.0,
        }
    }
}

impl ChamberGeometry {
    /// Ajoute la zone par défaut et retourne son index.
    pub fn add_zone(&mut self) -> usize {
        self.zones.push(Zone::centered(self.default_density));
        self.zones.len() - 1
    }

    pub fn remove_zone(&mut self, index: usize) -> bool {
        if index < self.zones.len() {
            self.zones.remove(index);
            true
        } else {
            false
        }
    }

    pub fn set_zone_density(&mut self, index: usize, density: f32) -> bool {
        match self.zones.get_mut(index) {
            Some(zone) => {
                zone.set_density(density);
                true
            }
            None => false,
        }
    }

    pub fn set_zone_bounds(&mut self, index: usize, x1: f32, y1: f32, x2: f32, y2: f32) -> bool {
        match self.zones.get_mut(index) {
            Some(zone) => {
                zone.set_bounds(x1, y1, x2, y2);
                true
            }
            None => false,
        }
    }

    pub fn set_speaker_position(&mut self, x: f32, y: f32) {
        self.speaker = Vec2::new(clamp_unit(x), clamp_unit(y));
    }

    pub fn set_microphone_position(&mut self, mic: usize, x: f32, y: f32) -> bool {
        match self.microphones.get_mut(mic) {
            Some(pos) => {
                *pos = Vec2::new(clamp_unit(x), clamp_unit(y));
                true
            }
            None => false,
        }
    }

    pub fn set_default_density(&mut self, density: f32) {
        self.default_density = clamp_density(density);
    }
}
