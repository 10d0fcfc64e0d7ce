use itertools::Itertools;

use crate::acoustic_engine::physics;

/// Densité minimale d'une zone (milieu relatif).
pub const MIN_DENSITY: f32 = 0.1;
/// Densité maximale d'une zone.
pub const MAX_DENSITY: f32 = 10.0;

/// Ramène une coordonnée dans `[0, 1]` (NaN -> 0).
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Ramène une densité dans `[MIN_DENSITY, MAX_DENSITY]`.
pub fn clamp_density(d: f32) -> f32 {
    if d.is_nan() {
        1.0
    } else {
        d.clamp(MIN_DENSITY, MAX_DENSITY)
    }
}

/// Rectangle de milieu homogène dans la chambre unité.
///
/// Invariant : `x1 <= x2` et `y1 <= y2`, coordonnées dans `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    density: f32,
}

impl Zone {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, density: f32) -> Self {
        let mut zone = Self {
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            density: 1.0,
        };
        zone.set_bounds(x1, y1, x2, y2);
        zone.set_density(density);
        zone
    }

    /// Zone par défaut ajoutée depuis l'UI : `[0.25, 0.25] – [0.75, 0.75]`.
    pub fn centered(density: f32) -> Self {
        Self::new(0.25, 0.25, 0.75, 0.75, density)
    }

    /// Met à jour les bornes, quel que soit l'ordre des coins.
    pub fn set_bounds(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        (self.x1, self.x2) = [clamp_unit(x1), clamp_unit(x2)]
            .iter()
            .copied()
            .minmax()
            .into_option()
            .unwrap_or((0.0, 0.0));
        (self.y1, self.y2) = [clamp_unit(y1), clamp_unit(y2)]
            .iter()
            .copied()
            .minmax()
            .into_option()
            .unwrap_or((0.0, 0.0));
    }

    pub fn set_density(&mut self, density: f32) {
        self.density = clamp_density(density);
    }

    pub fn x1(&self) -> f32 {
        self.x1
    }

    pub fn y1(&self) -> f32 {
        self.y1
    }

    pub fn x2(&self) -> f32 {
        self.x2
    }

    pub fn y2(&self) -> f32 {
        self.y2
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn sound_speed(&self) -> f32 {
        physics::sound_speed(self.density)
    }

    pub fn impedance(&self) -> f32 {
        physics::acoustic_impedance(self.density)
    }

    pub fn damping(&self) -> f32 {
        physics::damping(self.density)
    }
}
