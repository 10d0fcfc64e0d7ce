// =========================
// Rendu offline
// =========================

use std::array;

use crate::acoustic_engine::types::NUM_MICROPHONES;
use crate::audio_engine::AudioEngine;

/// Fait passer `input` dans `engine` par blocs de `block_size` et transmet
/// les sorties micro à `emit`, recalées sur l'entrée.
///
/// L'entrée est complétée par `latency_samples()` zéros et les
/// `latency_samples()` premiers échantillons produits sont écartés : la
/// sortie a exactement la longueur de l'entrée. Retourne le nombre
/// d'échantillons émis par micro.
pub fn render_offline<A, F>(engine: &mut A, input: &[f32], block_size: usize, mut emit: F) -> usize
where
    A: AudioEngine + ?Sized,
    F: FnMut(u64, [&[f32]; NUM_MICROPHONES]),
{
    let block_size = block_size.max(1);
    engine.prepare(block_size);

    let latency = engine.latency_samples();
    let total = input.len() + latency;
    let mut scratch = vec![0.0; block_size];
    let mut to_skip = latency;
    let mut pos = 0;
    let mut index = 0;
    let mut emitted = 0;

    while pos < total {
        let len = block_size.min(total - pos);
        for (i, sample) in scratch[..len].iter_mut().enumerate() {
            *sample = input.get(pos + i).copied().unwrap_or(0.0);
        }
        engine.process_block(&scratch[..len]);
        pos += len;

        let skip = to_skip.min(len);
        to_skip -= skip;
        if skip == len {
            continue;
        }

        let outputs: [&[f32]; NUM_MICROPHONES] = array::from_fn(|mic| {
            engine
                .microphone_output(mic)
                .and_then(|out| out.get(skip..))
                .unwrap_or(&[])
        });
        emitted += outputs.iter().map(|o| o.len()).min().unwrap_or(0);
        emit(index, outputs);
        index += 1;
    }
    emitted
}
