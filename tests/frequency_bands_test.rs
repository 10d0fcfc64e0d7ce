use chamber_sim::acoustic_engine::frequency_bands::{band_gain_db, Biquad, MicFrequencyBands, BAND_Q, NUM_FREQUENCY_BANDS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_bands(rng: &mut StdRng, scale: f32) -> MicFrequencyBands {
    let mut bands = MicFrequencyBands::new();
    for i in 0..bands.len() {
        bands.set_value(i, rng.random::<f32>() * scale);
    }
    bands
}

// ==================================
// 1. Normalisation
// ==================================

#[test]
fn test_downward_normalize_is_idempotent_and_never_increases() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..100 {
        let scale = rng.random_range(0.1..5.0);
        let original = random_bands(&mut rng, scale);

        let mut once = original.clone();
        once.downward_normalize();
        for (after, before) in once.values().iter().zip(original.values()) {
            assert!(*after <= before + 1e-6, "after={} before={}", after, before);
        }
        assert!(once.max_value() <= 1.0 + 1e-6);

        let mut twice = once.clone();
        twice.downward_normalize();
        for (a, b) in twice.values().iter().zip(once.values()) {
            assert!((a - b).abs() < 1e-6, "normalize should be idempotent");
        }
    }
}

#[test]
fn test_downward_normalize_leaves_quiet_response_untouched() {
    let mut bands = MicFrequencyBands::new();
    bands.reset(0.4);
    bands.set_value(5, 0.9);
    bands.downward_normalize();
    assert_eq!(bands.value(5), Some(0.9));
    assert_eq!(bands.value(0), Some(0.4));
}

// ==================================
// 2. Arithmétique nommée
// ==================================

#[test]
fn test_scale_merge_accumulate_add_uniform() {
    let mut a = MicFrequencyBands::new();
    a.reset(0.5);
    let mut b = MicFrequencyBands::new();
    b.reset(0.25);

    let merged = a.merge(&b);
    assert!(merged.values().iter().all(|v| (v - 0.75).abs() < 1e-6));
    // merge ne modifie pas ses opérandes
    assert!(a.values().iter().all(|v| (v - 0.5).abs() < 1e-6));

    a.accumulate(&b, 2.0);
    assert!(a.values().iter().all(|v| (v - 1.0).abs() < 1e-6));

    a.scale(0.5);
    a.add_uniform(0.1);
    assert!(a.values().iter().all(|v| (v - 0.6).abs() < 1e-6));
}

#[test]
#[should_panic(expected = "band count mismatch")]
fn test_band_count_mismatch_panics() {
    let mut a = MicFrequencyBands::new();
    let b = MicFrequencyBands::with_band_count(NUM_FREQUENCY_BANDS / 2);
    a.accumulate(&b, 1.0);
}

#[test]
fn test_custom_band_count_spans_same_range() {
    let bands = MicFrequencyBands::with_band_count(10);
    assert_eq!(bands.len(), 10);
    let first = bands.band(0).unwrap();
    let last = bands.band(9).unwrap();
    assert!((first.min_frequency - 20.0).abs() < 1e-3);
    assert!((last.max_frequency - 12_000.0).abs() < 1.0);
}

// ==================================
// 3. Lookup + biquads
// ==================================

#[test]
fn test_frequency_lookup_matches_band_bounds() {
    let bands = MicFrequencyBands::new();
    for freq in [20.0, 100.0, 440.0, 1000.0, 3648.0, 11_999.0] {
        let idx = bands.band_index_for_frequency(freq);
        let band = bands.band(idx).unwrap();
        assert!(
            band.min_frequency <= freq && freq < band.max_frequency,
            "{} Hz -> band {} [{}, {})",
            freq,
            idx,
            band.min_frequency,
            band.max_frequency
        );
    }
    assert_eq!(bands.band_index_for_frequency(5.0), 0);
    assert_eq!(bands.band_index_for_frequency(20_000.0), NUM_FREQUENCY_BANDS - 1);
}

#[test]
fn test_biquad_coefficients_follow_band_values() {
    let sample_rate = 48_000.0;
    let mut bands = MicFrequencyBands::new();
    bands.reset(0.5);
    bands.set_value(12, 1.0);
    bands.set_value(6, 0.05);
    bands.calculate_biquad_coefficients(sample_rate);

    for band in bands.bands() {
        assert_eq!(band.filter.a0, 1.0);
    }

    // 0.5 -> 0 dB : section neutre
    let neutral = &bands.band(0).unwrap().filter;
    assert!((neutral.magnitude_at(bands.band(0).unwrap().center_frequency(), sample_rate) - 1.0).abs() < 1e-3);

    let boosted = bands.band(12).unwrap();
    let gain = boosted.filter.magnitude_at(boosted.center_frequency(), sample_rate);
    let expected = 10.0_f32.powf(band_gain_db(1.0) / 20.0);
    assert!((gain - expected).abs() / expected < 0.01, "gain={} expected={}", gain, expected);

    let cut = bands.band(6).unwrap();
    assert!(cut.filter.magnitude_at(cut.center_frequency(), sample_rate) < 0.5);
}

#[test]
fn test_center_frequency_is_clamped_below_nyquist() {
    // Bande haute (~10.6 kHz) à 16 kHz : centre ramené à 0.49·fs
    let filter = Biquad::peaking(10_600.0, BAND_Q, 6.0, 16_000.0);
    let at_clamped = filter.magnitude_at(0.49 * 16_000.0, 16_000.0);
    assert!(at_clamped > 1.5, "gain at clamped centre: {}", at_clamped);
    assert!(filter.b0.is_finite() && filter.a1.is_finite() && filter.a2.is_finite());
}
