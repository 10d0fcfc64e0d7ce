use chamber_sim::acoustic_engine::types::NUM_MICROPHONES;
use chamber_sim::audio_engine::AudioEngine;
use std::cell::RefCell;

/// Moteur neutre : recopie l'entrée sur les trois micros.
#[allow(dead_code)]
pub struct DummyAudio {
    sample_rate: f32,
    bypass: bool,
    outputs: [Vec<f32>; NUM_MICROPHONES],
}

#[allow(dead_code)]
impl DummyAudio {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            bypass: false,
            outputs: Default::default(),
        }
    }
}

impl AudioEngine for DummyAudio {
    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
    fn process_block(&mut self, input: &[f32]) {
        for out in &mut self.outputs {
            out.clear();
            out.extend_from_slice(input);
        }
    }
    fn microphone_output(&self, mic: usize) -> Option<&[f32]> {
        self.outputs.get(mic).map(|o| o.as_slice())
    }
    fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }
    fn is_bypassed(&self) -> bool {
        self.bypass
    }
    fn latency_samples(&self) -> usize {
        0
    }
}

/// Moteur qui trace les appels reçus.
#[allow(dead_code)]
#[derive(Default)]
pub struct LoggingAudio {
    pub log: RefCell<Vec<String>>,
    outputs: [Vec<f32>; NUM_MICROPHONES],
}

impl AudioEngine for LoggingAudio {
    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.log.borrow_mut().push(format!("set_sample_rate {}", sample_rate));
    }
    fn sample_rate(&self) -> f32 {
        48_000.0
    }
    fn process_block(&mut self, input: &[f32]) {
        self.log.borrow_mut().push(format!("process_block {}", input.len()));
        for out in &mut self.outputs {
            out.resize(input.len(), 0.0);
        }
    }
    fn microphone_output(&self, mic: usize) -> Option<&[f32]> {
        self.outputs.get(mic).map(|o| o.as_slice())
    }
    fn set_bypass(&mut self, bypass: bool) {
        self.log.borrow_mut().push(format!("set_bypass {}", bypass));
    }
    fn is_bypassed(&self) -> bool {
        false
    }
    fn latency_samples(&self) -> usize {
        0
    }
}

/// Sinusoïde `amplitude · sin(2π f n / sr)` à partir de l'échantillon `start`.
#[allow(dead_code)]
pub fn sine(freq: f32, amplitude: f32, sample_rate: f32, start: usize, len: usize) -> Vec<f32> {
    (start..start + len)
        .map(|n| amplitude * (2.0 * std::f32::consts::PI * freq * n as f32 / sample_rate).sin())
        .collect()
}

#[allow(dead_code)]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}
