// =========================
// Biquad Filter Bank
// =========================
//
// Alternative temporelle au pipeline spectral : chaque micro passe dans une
// cascade de filtres peaking (un par bande). Pas de latence ajoutée.

use crate::acoustic_engine::frequency_bands::{Biquad, MicFrequencyBands};
use crate::audio_engine::spectral::soft_clip;

#[derive(Debug, Clone)]
pub struct FilterBank {
    channels: Vec<Vec<Biquad>>,
}

impl FilterBank {
    pub fn new(channel_count: usize, band_count: usize) -> Self {
        Self {
            channels: vec![vec![Biquad::identity(); band_count]; channel_count],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Reprend les coefficients calculés dans `bands`, l'état des filtres est conservé.
    pub fn update_coefficients(&mut self, bands: &[MicFrequencyBands]) {
        for (cascade, mic_bands) in self.channels.iter_mut().zip(bands) {
            for (filter, band) in cascade.iter_mut().zip(mic_bands.bands()) {
                filter.set_coefficients_from(&band.filter);
            }
        }
    }

    pub fn reset(&mut self) {
        for filter in self.channels.iter_mut().flatten() {
            filter.reset();
        }
    }

    pub fn process(&mut self, input: &[f32], outputs: &mut [&mut [f32]]) {
        for (cascade, out) in self.channels.iter_mut().zip(outputs.iter_mut()) {
            for (y, &x) in out.iter_mut().zip(input) {
                let mut s = x;
                for filter in cascade.iter_mut() {
                    s = filter.process(s);
                }
                *y = soft_clip(s);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_bands_only_soft_clip() {
        let mut bands = MicFrequencyBands::new();
        bands.reset(0.5);
        bands.calculate_biquad_coefficients(48_000.0);

        let mut bank = FilterBank::new(1, bands.len());
        bank.update_coefficients(std::slice::from_ref(&bands));

        let input: Vec<f32> = (0..64).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();
        let mut out = vec![0.0; 64];
        bank.process(&input, &mut [&mut out[..]]);

        for (x, y) in input.iter().zip(&out) {
            assert!((soft_clip(*x) - y).abs() < 1e-4, "x={} y={}", x, y);
        }
    }
}
