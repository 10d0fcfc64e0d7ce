// =========================
// Acoustic Engine Settings
// =========================

use derive_builder::Builder;

use crate::acoustic_engine::frequency_bands::FrequencyBand;

/// Fréquence prise pour une bande dans les formules d'absorption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandFrequencyMapping {
    /// `100 · 2^i` pour la bande `i` (modèle de référence)
    #[default]
    Octave,
    /// Milieu de la bande
    Center,
}

impl BandFrequencyMapping {
    pub fn frequency(self, index: usize, band: &FrequencyBand) -> f32 {
        match self {
            BandFrequencyMapping::Octave => 100.0 * 2.0_f32.powi(index as i32),
            BandFrequencyMapping::Center => band.center_frequency(),
        }
    }
}

/// Paramètres du ray tracer et de l'accumulateur de réponse.
///
/// Construits via `AcousticSettingsBuilder` ; les valeurs par défaut
/// reproduisent le modèle de référence.
#[derive(Clone, Builder, Debug)]
#[builder(pattern = "owned", build_fn(error = "anyhow::Error"))]
pub struct AcousticSettings {
    /// Nombre max d'impacts traités par micro lors d'une reconstruction
    #[builder(default = "100")]
    pub max_reflections: usize,

    /// Rayons émis par impact (1 spéculaire + diffus)
    #[builder(default = "3")]
    pub rays_per_reflection: usize,

    /// Intensité en dessous de laquelle un rayon est ignoré
    #[builder(default = "0.01")]
    pub significance_threshold: f32,

    /// Perte d'intensité du rayon spéculaire à chaque réflexion
    #[builder(default = "0.7")]
    pub reflection_gain: f32,

    /// Facteur appliqué aux rayons diffus par rapport au spéculaire
    #[builder(default = "0.5")]
    pub scatter_gain: f32,

    /// Distance au-delà de laquelle un rayon ne contribue plus à un micro
    #[builder(default = "1.0")]
    pub max_contribution_distance: f32,

    /// Nombre de bandes basses forcées à zéro après normalisation
    #[builder(default = "3")]
    pub low_band_cut: usize,

    /// Fréquence de bande utilisée par l'absorption murale et la transmission de zone
    #[builder(default)]
    pub band_frequency: BandFrequencyMapping,
}

impl AcousticSettings {
    pub fn max_reflections(&self) -> usize {
        self.max_reflections
    }

    pub fn rays_per_reflection(&self) -> usize {
        self.rays_per_reflection
    }

    pub fn significance_threshold(&self) -> f32 {
        self.significance_threshold
    }

    pub fn reflection_gain(&self) -> f32 {
        self.reflection_gain
    }

    pub fn scatter_gain(&self) -> f32 {
        self.scatter_gain
    }

    pub fn max_contribution_distance(&self) -> f32 {
        self.max_contribution_distance
    }

    pub fn low_band_cut(&self) -> usize {
        self.low_band_cut
    }

    pub fn band_frequency(&self) -> BandFrequencyMapping {
        self.band_frequency
    }
}

impl Default for AcousticSettings {
    fn default() -> Self {
        AcousticSettingsBuilder::default()
            .build()
            .expect("default acoustic settings are valid")
    }
}
