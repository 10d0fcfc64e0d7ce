// =========================
// Microphone Frequency Bands
// =========================
//
// Réponse fréquentielle d'un micro : bandes log-espacées entre 20 Hz et 12 kHz,
// chacune portant une valeur (gain linéaire relatif) et un filtre peaking.

use std::f32::consts::PI;

/// Nombre de bandes par défaut.
pub const NUM_FREQUENCY_BANDS: usize = 24;
/// Fréquence basse de la première bande (Hz).
pub const MIN_FREQUENCY: f32 = 20.0;
/// Fréquence haute de la dernière bande (Hz).
pub const MAX_FREQUENCY: f32 = 12_000.0;
/// Facteur de qualité des filtres peaking (≈ 1/3 d'octave).
pub const BAND_Q: f32 = 4.32;
/// Plancher du mapping valeur -> dB.
pub const MIN_GAIN_DB: f32 = -96.0;
/// Plafond du mapping valeur -> dB.
pub const MAX_GAIN_DB: f32 = 12.0;

// =========================
// Biquad
// =========================

/// Filtre biquad (forme directe II transposée), coefficients normalisés `a0 = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub a0: f32,
    pub a1: f32,
    pub a2: f32,
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    z1: f32,
    z2: f32,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::identity()
    }
}

impl Biquad {
    /// Filtre neutre (`y = x`).
    pub fn identity() -> Self {
        Self {
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Peaking EQ (RBJ cookbook).
    ///
    /// La fréquence centrale est ramenée sous Nyquist (`0.49 · sample_rate`).
    pub fn peaking(center_frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let max_center = 0.49 * sample_rate;
        if !is_valid_sample_rate(sample_rate) || q <= 0.0 || max_center < 1.0 {
            return Self::identity();
        }
        let f0 = center_frequency.clamp(1.0, max_center);
        let a = 10.0_f32.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * f0 / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let a0 = 1.0 + alpha / a;
        Self {
            a0: 1.0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha / a) / a0,
            b0: (1.0 + alpha * a) / a0,
            b1: (-2.0 * cos_w0) / a0,
            b2: (1.0 - alpha * a) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Remplace les coefficients en conservant l'état interne du filtre.
    pub fn set_coefficients_from(&mut self, other: &Biquad) {
        self.a0 = other.a0;
        self.a1 = other.a1;
        self.a2 = other.a2;
        self.b0 = other.b0;
        self.b1 = other.b1;
        self.b2 = other.b2;
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Module de la réponse en fréquence `|H(e^jw)|` à `freq`.
    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * freq / sample_rate;
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = self.a0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let num = (num_re * num_re + num_im * num_im).sqrt();
        let den = (den_re * den_re + den_im * den_im).sqrt();
        if den <= f32::EPSILON {
            return 0.0;
        }
        num / den
    }
}

/// Mapping valeur de bande -> gain (dB).
///
/// - `value <= 0` : plancher (-96 dB)
/// - `0 < value < 0.5` : `20·log10(2·value)` (0.5 correspond à 0 dB)
/// - `value >= 0.5` : `24·(value - 0.5)`, plafonné à +12 dB
pub fn band_gain_db(value: f32) -> f32 {
    if value.is_nan() || value <= 0.0 {
        MIN_GAIN_DB
    } else if value < 0.5 {
        (20.0 * (2.0 * value).log10()).max(MIN_GAIN_DB)
    } else {
        (24.0 * (value - 0.5)).min(MAX_GAIN_DB)
    }
}

/// Sample rate exploitable : fini et strictement positif.
pub fn is_valid_sample_rate(sample_rate: f32) -> bool {
    sample_rate.is_finite() && sample_rate > 0.0
}

// =========================
// FrequencyBand
// =========================

#[derive(Debug, Clone)]
pub struct FrequencyBand {
    pub min_frequency: f32,
    pub max_frequency: f32,
    pub value: f32,
    pub filter: Biquad,
}

impl FrequencyBand {
    pub fn center_frequency(&self) -> f32 {
        0.5 * (self.min_frequency + self.max_frequency)
    }

    pub fn contains(&self, freq: f32) -> bool {
        freq >= self.min_frequency && freq < self.max_frequency
    }
}

// =========================
// MicFrequencyBands
// =========================

/// Collection ordonnée de bandes couvrant 20 Hz – 12 kHz.
///
/// Toute opération entre deux collections exige le même nombre de bandes ;
/// un écart est une erreur de programmation et provoque un panic.
#[derive(Debug, Clone)]
pub struct MicFrequencyBands {
    bands: Vec<FrequencyBand>,
}

impl Default for MicFrequencyBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MicFrequencyBands {
    /// `NUM_FREQUENCY_BANDS` bandes, toutes à 1.0.
    pub fn new() -> Self {
        Self::with_band_count(NUM_FREQUENCY_BANDS)
    }

    pub fn with_band_count(count: usize) -> Self {
        assert!(count > 0, "MicFrequencyBands needs at least one band");
        let ratio = (MAX_FREQUENCY / MIN_FREQUENCY).powf(1.0 / count as f32);
        let bands = (0..count)
            .map(|i| FrequencyBand {
                min_frequency: MIN_FREQUENCY * ratio.powi(i as i32),
                max_frequency: MIN_FREQUENCY * ratio.powi(i as i32 + 1),
                value: 1.0,
                filter: Biquad::identity(),
            })
            .collect();
        Self { bands }
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    pub fn bands_mut(&mut self) -> &mut [FrequencyBand] {
        &mut self.bands
    }

    pub fn band(&self, index: usize) -> Option<&FrequencyBand> {
        self.bands.get(index)
    }

    pub fn value(&self, index: usize) -> Option<f32> {
        self.bands.get(index).map(|b| b.value)
    }

    /// Retourne `false` si l'index est hors limites.
    pub fn set_value(&mut self, index: usize, value: f32) -> bool {
        match self.bands.get_mut(index) {
            Some(band) => {
                band.value = value;
                true
            }
            None => false,
        }
    }

    pub fn values(&self) -> Vec<f32> {
        self.bands.iter().map(|b| b.value).collect()
    }

    pub fn max_value(&self) -> f32 {
        self.bands
            .iter()
            .map(|b| b.value)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn reset(&mut self, value: f32) {
        for band in &mut self.bands {
            band.value = value;
        }
    }

    /// Multiplie chaque bande par `factor`.
    pub fn scale(&mut self, factor: f32) {
        for band in &mut self.bands {
            band.value *= factor;
        }
    }

    /// Somme bande à bande, retournée dans une nouvelle collection.
    pub fn merge(&self, other: &MicFrequencyBands) -> MicFrequencyBands {
        let mut out = self.clone();
        out.accumulate(other, 1.0);
        out
    }

    /// `self += other × weight`, bande à bande.
    pub fn accumulate(&mut self, other: &MicFrequencyBands, weight: f32) {
        assert_eq!(self.len(), other.len(), "band count mismatch");
        for (dst, src) in self.bands.iter_mut().zip(&other.bands) {
            dst.value += src.value * weight;
        }
    }

    /// Ajoute la même valeur à toutes les bandes.
    pub fn add_uniform(&mut self, offset: f32) {
        for band in &mut self.bands {
            band.value += offset;
        }
    }

    /// Copie les valeurs d'une autre collection (les filtres restent en place).
    pub fn copy_values_from(&mut self, other: &MicFrequencyBands) {
        assert_eq!(self.len(), other.len(), "band count mismatch");
        for (dst, src) in self.bands.iter_mut().zip(&other.bands) {
            dst.value = src.value;
        }
    }

    /// Divise par le maximum seulement si celui-ci dépasse 1.0.
    pub fn downward_normalize(&mut self) {
        let max = self.max_value();
        if max > 1.0 {
            self.scale(1.0 / max);
        }
    }

    /// Met à zéro les `count` bandes les plus basses.
    pub fn zero_lowest(&mut self, count: usize) {
        for band in self.bands.iter_mut().take(count) {
            band.value = 0.0;
        }
    }

    /// Index de la bande contenant `freq`.
    ///
    /// Sous la première bande on retourne 0, au-delà de la dernière on retourne
    /// la dernière.
    pub fn band_index_for_frequency(&self, freq: f32) -> usize {
        let last = self.bands.len() - 1;
        if freq.is_nan() || freq < self.bands[0].min_frequency {
            return 0;
        }
        self.bands
            .iter()
            .position(|b| b.contains(freq))
            .unwrap_or(last)
    }

    /// Recalcule les coefficients des filtres à partir des valeurs courantes.
    pub fn calculate_biquad_coefficients(&mut self, sample_rate: f32) {
        for band in &mut self.bands {
            let coeffs = Biquad::peaking(
                band.center_frequency(),
                BAND_Q,
                band_gain_db(band.value),
                sample_rate,
            );
            band.filter.set_coefficients_from(&coeffs);
        }
    }
}
