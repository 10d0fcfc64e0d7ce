// =========================
// Chamber (contrôle + audio, mono-thread)
// =========================

use std::sync::Arc;

use crate::acoustic_engine::config::SceneConfig;
use crate::acoustic_engine::controller::ChamberController;
use crate::acoustic_engine::frequency_bands::is_valid_sample_rate;
use crate::acoustic_engine::response::ChamberResponse;
use crate::acoustic_engine::settings::AcousticSettings;
use crate::audio_engine::chamber_audio::ChamberAudio;
use crate::audio_engine::settings::AudioEngineSettings;
use crate::audio_engine::AudioEngine;

/// Chambre complète : chaque mutation reconstruit la réponse, et le bloc
/// audio suivant l'utilise.
///
/// ```
/// use chamber_sim::Chamber;
///
/// let mut chamber = Chamber::new(48_000.0);
/// let zone = chamber.add_zone();
/// chamber.set_zone_density(zone, 8.0);
/// chamber.process_block(&[0.0; 256]);
/// assert_eq!(chamber.microphone_output(0).map(|o| o.len()), Some(256));
/// ```
pub struct Chamber {
    controller: Arc<ChamberController>,
    audio: ChamberAudio,
}

impl Chamber {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_settings(AcousticSettings::default(), AudioEngineSettings::default(), sample_rate)
    }

    pub fn with_settings(acoustic: AcousticSettings, audio: AudioEngineSettings, sample_rate: f32) -> Self {
        let controller = Arc::new(ChamberController::new(acoustic, sample_rate));
        let audio = ChamberAudio::with_link(audio, sample_rate, controller.link());
        Self { controller, audio }
    }

    /// Chambre initialisée depuis une scène (une reconstruction).
    pub fn from_scene(scene: &SceneConfig, acoustic: AcousticSettings, audio: AudioEngineSettings, sample_rate: f32) -> Self {
        let controller = Arc::new(ChamberController::with_geometry(acoustic, sample_rate, scene.to_geometry()));
        let audio = ChamberAudio::with_link(audio, sample_rate, controller.link());
        Self { controller, audio }
    }

    pub fn controller(&self) -> &Arc<ChamberController> {
        &self.controller
    }

    pub fn audio(&self) -> &ChamberAudio {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut ChamberAudio {
        &mut self.audio
    }

    /// Sépare les deux moitiés (thread de contrôle / thread audio).
    pub fn split(self) -> (Arc<ChamberController>, ChamberAudio) {
        (self.controller, self.audio)
    }

    // Mutations de géométrie

    pub fn add_zone(&mut self) -> usize {
        self.controller.add_zone()
    }

    pub fn remove_zone(&mut self, index: usize) -> bool {
        self.controller.remove_zone(index)
    }

    pub fn set_zone_density(&mut self, index: usize, density: f32) -> bool {
        self.controller.set_zone_density(index, density)
    }

    pub fn set_zone_bounds(&mut self, index: usize, x1: f32, y1: f32, x2: f32, y2: f32) -> bool {
        self.controller.set_zone_bounds(index, x1, y1, x2, y2)
    }

    pub fn set_speaker_position(&mut self, x: f32, y: f32) {
        self.controller.set_speaker_position(x, y);
    }

    pub fn set_microphone_position(&mut self, mic: usize, x: f32, y: f32) -> bool {
        self.controller.set_microphone_position(mic, x, y)
    }

    pub fn set_default_density(&mut self, density: f32) {
        self.controller.set_default_density(density);
    }

    pub fn apply_scene(&mut self, scene: &SceneConfig) {
        scene.apply_to(&self.controller);
    }

    /// Instantané de la dernière reconstruction (rayons, bandes).
    pub fn response(&self) -> Arc<ChamberResponse> {
        self.controller.response()
    }

    // Audio

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !is_valid_sample_rate(sample_rate) {
            return;
        }
        self.audio.set_sample_rate(sample_rate);
        self.controller.set_sample_rate(sample_rate);
    }

    /// Voir [`AudioEngine::prepare`].
    pub fn prepare(&mut self, max_block_size: usize) {
        self.audio.prepare(max_block_size);
    }

    pub fn process_block(&mut self, input: &[f32]) {
        self.audio.process_block(input);
    }

    pub fn microphone_output(&self, mic: usize) -> Option<&[f32]> {
        self.audio.microphone_output(mic)
    }

    pub fn read_microphone_samples(&mut self, mic: usize, out: &mut [f32]) -> usize {
        self.audio.read_microphone_samples(mic, out)
    }

    pub fn instantaneous_level(&self, mic: usize) -> Option<f32> {
        self.audio.instantaneous_level(mic)
    }

    pub fn peak_level(&self, mic: usize) -> Option<f32> {
        self.audio.peak_level(mic)
    }

    pub fn set_bypass(&mut self, bypass: bool) {
        self.audio.set_bypass(bypass);
    }

    pub fn is_bypassed(&self) -> bool {
        self.audio.is_bypassed()
    }
}
