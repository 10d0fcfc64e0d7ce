// =========================
// Audio File Loading
// =========================
use anyhow::{anyhow, Context};
use hound::{SampleFormat, WavReader};

/// Charge un fichier WAV et le convertit en tampon mono `f32` dans `[-1, 1]`.
///
/// - PCM entier 8/16/24/32 bits ou flottant 32 bits
/// - plusieurs canaux : moyenne des canaux de chaque frame
///
/// Retourne les échantillons et le sample rate du fichier.
pub fn load_mono_wav(path: &str) -> anyhow::Result<(Vec<f32>, u32)> {
    let mut reader = WavReader::open(path).with_context(|| format!("cannot open WAV file '{}'", path))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| anyhow!("failed to decode '{}': {}", path, e))?,
        SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| anyhow!("failed to decode '{}': {}", path, e))?
        }
    };

    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

/// Resample mono audio (interpolation linéaire), `src_rate` -> `dst_rate`.
pub fn resample_linear(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if input.is_empty() || src_rate == 0 || dst_rate == 0 {
        return Vec::new();
    }
    if src_rate == dst_rate {
        return input.to_vec();
    }

    let out_len = ((input.len() as f64) * dst_rate as f64 / src_rate as f64).ceil() as usize;
    let step = src_rate as f64 / dst_rate as f64;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = pos.floor() as usize;
            if idx >= last {
                return input[last];
            }
            let frac = (pos - idx as f64) as f32;
            input[idx] + (input[idx + 1] - input[idx]) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity_and_empty() {
        assert!(resample_linear(&[], 44_100, 48_000).is_empty());
        assert_eq!(resample_linear(&[0.1, 0.2], 48_000, 48_000), vec![0.1, 0.2]);
    }

    #[test]
    fn test_resample_upsample_interpolates() {
        let out = resample_linear(&[0.0, 1.0], 100, 200);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn test_resample_downsample() {
        let out = resample_linear(&[0.0, 0.5, 1.0, 1.5], 200, 100);
        assert_eq!(out, vec![0.0, 1.0]);
    }
}
