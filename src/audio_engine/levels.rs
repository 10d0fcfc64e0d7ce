/// Décroissance par défaut du niveau crête, appliquée à chaque bloc.
pub const DEFAULT_LEVEL_DECAY: f32 = 0.7;

/// Niveau d'un micro : crête du bloc courant + crête avec décroissance.
#[derive(Debug, Clone, Copy)]
pub struct LevelMeter {
    instantaneous: f32,
    peak: f32,
    decay: f32,
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL_DECAY)
    }
}

impl LevelMeter {
    pub fn new(decay: f32) -> Self {
        Self {
            instantaneous: 0.0,
            peak: 0.0,
            decay: decay.clamp(0.0, 1.0),
        }
    }

    pub fn update(&mut self, block: &[f32]) {
        self.instantaneous = block.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        self.peak = (self.peak * self.decay).max(self.instantaneous);
    }

    pub fn instantaneous(&self) -> f32 {
        self.instantaneous
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn reset(&mut self) {
        self.instantaneous = 0.0;
        self.peak = 0.0;
    }
}
