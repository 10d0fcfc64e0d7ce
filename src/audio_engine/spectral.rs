// =========================
// Spectral Audio Pipeline
// =========================
//
// Analyse / resynthèse par FFT glissante :
// - anneau d'entrée de FFT_SIZE échantillons, transformée tous les `hop`
// - par micro : gain par bande sur le module, phase rendue continue
// - IFFT, overlap-add, normalisation par la somme des fenêtres, soft clip
// - FIFO de sortie par micro, amorcée avec `hop` échantillons de continuation
//
// Aucune allocation dans `process` tant que les blocs restent sous
// `max_block_size`.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::acoustic_engine::frequency_bands::{is_valid_sample_rate, MicFrequencyBands};

/// Taille de la FFT (et latence du pipeline en échantillons).
pub const FFT_SIZE: usize = 1024;
/// Pas minimal entre deux transformées.
pub const MIN_HOP_SIZE: usize = 256;
/// Pente du soft clip `tanh(drive · x)`.
pub const SOFT_CLIP_DRIVE: f32 = 0.8;
/// Décroissance de la continuation quand aucune sortie n'est disponible.
pub const CONTINUATION_DECAY: f32 = 0.99;

/// Pas entre transformées : ~10 ms, borné à `[MIN_HOP_SIZE, FFT_SIZE/2]`.
pub fn hop_size_for(sample_rate: f32) -> usize {
    ((sample_rate / 100.0) as usize).clamp(MIN_HOP_SIZE, FFT_SIZE / 2)
}

/// Ramène une phase dans `[-π, π]`.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    (phase + PI).rem_euclid(2.0 * PI) - PI
}

#[inline]
pub fn soft_clip(x: f32) -> f32 {
    (SOFT_CLIP_DRIVE * x).tanh()
}

/// Fenêtre de Hann périodique.
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / size as f32).cos())
        .collect()
}

/// État spectral propre à un micro.
struct MicChannel {
    prev_phase: Vec<f32>,
    phase_acc: Vec<f32>,
    overlap: Vec<f32>,
    fifo: VecDeque<f32>,
    last_sample: f32,
}

impl MicChannel {
    fn new(fifo_capacity: usize) -> Self {
        Self {
            prev_phase: vec![0.0; FFT_SIZE / 2],
            phase_acc: vec![0.0; FFT_SIZE / 2],
            overlap: vec![0.0; FFT_SIZE],
            fifo: VecDeque::with_capacity(fifo_capacity),
            last_sample: 0.0,
        }
    }

    /// Vide l'état et amorce la FIFO avec une continuation décroissante.
    fn reset(&mut self, hop: usize) {
        self.prev_phase.fill(0.0);
        self.phase_acc.fill(0.0);
        self.overlap.fill(0.0);
        self.fifo.clear();
        let mut v = self.last_sample;
        for _ in 0..hop {
            v *= CONTINUATION_DECAY;
            self.fifo.push_back(v);
        }
    }

    fn pop(&mut self) -> f32 {
        let y = match self.fifo.pop_front() {
            Some(y) => y,
            None => self.last_sample * CONTINUATION_DECAY,
        };
        self.last_sample = y;
        y
    }
}

pub struct SpectralProcessor {
    sample_rate: f32,
    hop: usize,
    max_block_size: usize,
    window: Vec<f32>,
    overlap_norm: Vec<f32>,
    bin_to_band: Vec<usize>,

    input_ring: Vec<f32>,
    ring_pos: usize,
    since_last_transform: usize,

    fft_forward: Arc<dyn Fft<f32>>,
    fft_inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    spectrum: Vec<Complex<f32>>,
    work: Vec<Complex<f32>>,

    channels: Vec<MicChannel>,
    transforms: u64,
}

impl fmt::Debug for SpectralProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralProcessor")
            .field("sample_rate", &self.sample_rate)
            .field("hop", &self.hop)
            .field("channels", &self.channels.len())
            .field("transforms", &self.transforms)
            .finish()
    }
}

impl SpectralProcessor {
    pub fn new(sample_rate: f32, max_block_size: usize, channel_count: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(FFT_SIZE);
        let fft_inverse = planner.plan_fft_inverse(FFT_SIZE);
        let scratch_len = fft_forward
            .get_inplace_scratch_len()
            .max(fft_inverse.get_inplace_scratch_len());

        let max_block_size = max_block_size.max(1);
        let fifo_capacity = FFT_SIZE / 2 + max_block_size + 1;

        let mut processor = Self {
            sample_rate,
            hop: hop_size_for(sample_rate),
            max_block_size,
            window: hann_window(FFT_SIZE),
            overlap_norm: Vec::with_capacity(FFT_SIZE / 2),
            bin_to_band: Vec::with_capacity(FFT_SIZE / 2),
            input_ring: vec![0.0; FFT_SIZE],
            ring_pos: 0,
            since_last_transform: 0,
            fft_forward,
            fft_inverse,
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            spectrum: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            work: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            channels: (0..channel_count).map(|_| MicChannel::new(fifo_capacity)).collect(),
            transforms: 0,
        };
        processor.set_sample_rate(sample_rate);
        processor
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn hop_size(&self) -> usize {
        self.hop
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Latence entrée -> sortie, en échantillons.
    pub fn latency_samples(&self) -> usize {
        FFT_SIZE
    }

    /// Nombre de transformées effectuées depuis la création.
    pub fn transforms(&self) -> u64 {
        self.transforms
    }

    /// Recalcule hop, table bin -> bande, normalisation OLA, puis réinitialise.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !is_valid_sample_rate(sample_rate) {
            return;
        }
        self.sample_rate = sample_rate;
        self.hop = hop_size_for(sample_rate);

        let layout = MicFrequencyBands::new();
        self.bin_to_band.clear();
        self.bin_to_band.extend(
            (0..FFT_SIZE / 2)
                .map(|bin| layout.band_index_for_frequency(bin as f32 * sample_rate / FFT_SIZE as f32)),
        );

        // Somme des fenêtres d'analyse recouvrant chaque position du segment émis
        self.overlap_norm.clear();
        for j in 0..self.hop {
            let sum: f32 = (j..FFT_SIZE).step_by(self.hop).map(|k| self.window[k]).sum();
            self.overlap_norm.push(sum.max(1e-6));
        }

        self.reset();
    }

    /// Vide l'anneau, les phases et l'overlap-add ; la sortie repart en
    /// continuation du dernier échantillon émis.
    pub fn reset(&mut self) {
        self.input_ring.fill(0.0);
        self.ring_pos = 0;
        self.since_last_transform = 0;
        let hop = self.hop;
        for ch in &mut self.channels {
            ch.reset(hop);
        }
    }

    /// Comme `reset`, en imposant le dernier échantillon de chaque canal
    /// (sortie de bypass : la continuation part du signal non traité).
    pub fn reset_from(&mut self, last_sample: f32) {
        for ch in &mut self.channels {
            ch.last_sample = last_sample;
        }
        self.reset();
    }

    /// Traite un bloc mono et écrit `input.len()` échantillons par micro.
    ///
    /// `bands[m]` donne le gain par bande du micro `m` ; `outputs[m]` doit
    /// contenir au moins `input.len()` échantillons.
    pub fn process(&mut self, input: &[f32], bands: &[MicFrequencyBands], outputs: &mut [&mut [f32]]) {
        for &x in input {
            self.input_ring[self.ring_pos] = x;
            self.ring_pos = (self.ring_pos + 1) % FFT_SIZE;
            self.since_last_transform += 1;

            if self.since_last_transform >= self.hop {
                self.since_last_transform = 0;
                self.transform(bands);
            }
        }

        for (ch, out) in self.channels.iter_mut().zip(outputs.iter_mut()) {
            for y in out.iter_mut().take(input.len()) {
                *y = ch.pop();
            }
        }
    }

    fn transform(&mut self, bands: &[MicFrequencyBands]) {
        // Fenêtrage des FFT_SIZE derniers échantillons (ring_pos = le plus ancien)
        for (k, bin) in self.spectrum.iter_mut().enumerate() {
            let idx = (self.ring_pos + k) % FFT_SIZE;
            *bin = Complex::new(self.input_ring[idx] * self.window[k], 0.0);
        }
        self.fft_forward
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let half = FFT_SIZE / 2;
        let scale = 1.0 / FFT_SIZE as f32;

        for (m, ch) in self.channels.iter_mut().enumerate() {
            let mic_bands = bands.get(m);

            for bin in 0..half {
                let c = self.spectrum[bin];
                let magnitude = c.norm();
                let phase = c.arg();

                let delta = wrap_phase(phase - ch.prev_phase[bin]);
                ch.prev_phase[bin] = phase;
                ch.phase_acc[bin] = wrap_phase(ch.phase_acc[bin] + delta);

                let gain = mic_bands
                    .and_then(|b| b.value(self.bin_to_band[bin]))
                    .unwrap_or(0.0);
                self.work[bin] = Complex::from_polar(magnitude * gain, ch.phase_acc[bin]);
            }
            self.work[half] = Complex::new(0.0, 0.0);
            for bin in 1..half {
                self.work[FFT_SIZE - bin] = self.work[bin].conj();
            }

            self.fft_inverse
                .process_with_scratch(&mut self.work, &mut self.scratch);

            for (acc, s) in ch.overlap.iter_mut().zip(&self.work) {
                *acc += s.re * scale;
            }

            // Les `hop` premiers échantillons sont complets
            for j in 0..self.hop {
                ch.fifo.push_back(soft_clip(ch.overlap[j] / self.overlap_norm[j]));
            }
            ch.overlap.copy_within(self.hop.., 0);
            ch.overlap[FFT_SIZE - self.hop..].fill(0.0);
        }

        self.transforms += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_size_bounds() {
        assert_eq!(hop_size_for(48_000.0), 480);
        assert_eq!(hop_size_for(44_100.0), 441);
        assert_eq!(hop_size_for(8_000.0), MIN_HOP_SIZE);
        assert_eq!(hop_size_for(192_000.0), FFT_SIZE / 2);
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(3.0 * PI) - PI).abs() < 1e-4 || (wrap_phase(3.0 * PI) + PI).abs() < 1e-4);
        assert!((wrap_phase(0.5) - 0.5).abs() < 1e-6);
        assert!((wrap_phase(-0.5 - 2.0 * PI) + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_fifo_is_primed_and_never_underruns() {
        let mut sp = SpectralProcessor::new(48_000.0, 512, 1);
        assert_eq!(sp.channels[0].fifo.len(), sp.hop_size());

        let bands = [MicFrequencyBands::new()];
        let input = vec![0.0; 500];
        let mut out = vec![0.0; 500];
        for _ in 0..20 {
            sp.process(&input, &bands, &mut [&mut out[..]]);
            assert!(!sp.channels[0].fifo.is_empty());
        }
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut sp = SpectralProcessor::new(48_000.0, 256, 3);
        let bands = [MicFrequencyBands::new(), MicFrequencyBands::new(), MicFrequencyBands::new()];
        let input = vec![0.0; 256];
        let mut a = vec![1.0; 256];
        let mut b = vec![1.0; 256];
        let mut c = vec![1.0; 256];
        for _ in 0..10 {
            sp.process(&input, &bands, &mut [&mut a[..], &mut b[..], &mut c[..]]);
        }
        assert!(a.iter().chain(&b).chain(&c).all(|s| s.abs() < 1e-6));
    }
}
