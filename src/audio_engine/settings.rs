// =========================
// Audio Engine Configuration
// =========================

use derive_builder::Builder;

use crate::audio_engine::circular_buffer::DEFAULT_CAPACITY;
use crate::audio_engine::levels::DEFAULT_LEVEL_DECAY;

/// Mode de traitement des micros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// FFT glissante + gain par bande (latence FFT_SIZE)
    #[default]
    Spectral,
    /// Cascade de biquads peaking (sans latence)
    FilterBank,
}

/// Paramètres du moteur audio.
///
/// Configuration via le builder :
///
/// ```
/// use chamber_sim::audio_engine::settings::{AudioEngineSettingsBuilder, ProcessingMode};
/// let settings = AudioEngineSettingsBuilder::default()
///     .max_block_size(1024)
///     .processing_mode(ProcessingMode::FilterBank)
///     .build()
///     .unwrap();
/// assert_eq!(settings.max_block_size(), 1024);
/// ```
#[derive(Clone, Builder, Debug)]
#[builder(pattern = "owned", build_fn(error = "anyhow::Error"))]
pub struct AudioEngineSettings {
    /// Taille de bloc maximale traitée d'un seul tenant (les buffers sont pré-alloués)
    #[builder(default = "4096")]
    pub max_block_size: usize,

    /// Capacité du tampon circulaire de chaque micro
    #[builder(default = "DEFAULT_CAPACITY")]
    pub circular_buffer_capacity: usize,

    /// Décroissance du niveau crête par bloc
    #[builder(default = "DEFAULT_LEVEL_DECAY")]
    pub level_decay: f32,

    #[builder(default)]
    pub processing_mode: ProcessingMode,

    /// Démarre en bypass (entrée recopiée sur chaque micro)
    #[builder(default = "false")]
    pub bypass: bool,
}

impl AudioEngineSettings {
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn circular_buffer_capacity(&self) -> usize {
        self.circular_buffer_capacity
    }

    pub fn level_decay(&self) -> f32 {
        self.level_decay
    }

    pub fn processing_mode(&self) -> ProcessingMode {
        self.processing_mode
    }

    pub fn bypass(&self) -> bool {
        self.bypass
    }
}

impl Default for AudioEngineSettings {
    fn default() -> Self {
        AudioEngineSettingsBuilder::default()
            .build()
            .expect("default audio settings are valid")
    }
}
