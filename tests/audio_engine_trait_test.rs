mod helpers;
use helpers::LoggingAudio;

use chamber_sim::audio_engine::AudioEngine;

/// Hôte minimal : découpe un signal en blocs et les passe au moteur.
fn drive<A: AudioEngine>(engine: &mut A, signal: &[f32], block: usize) -> usize {
    let mut produced = 0;
    for chunk in signal.chunks(block) {
        engine.process_block(chunk);
        produced += engine.microphone_output(0).map(|o| o.len()).unwrap_or(0);
    }
    produced
}

#[test]
fn test_host_drives_engine_through_trait() {
    let mut engine = LoggingAudio::default();
    engine.set_sample_rate(44_100.0);
    let produced = drive(&mut engine, &[0.0; 1000], 256);
    engine.set_bypass(true);

    assert_eq!(produced, 1000);
    let log = engine.log.borrow();
    assert_eq!(log[0], "set_sample_rate 44100");
    assert_eq!(log.iter().filter(|l| l.starts_with("process_block")).count(), 4);
    assert_eq!(log.last().map(String::as_str), Some("set_bypass true"));
}

#[test]
fn test_chamber_audio_is_a_drop_in_engine() {
    let mut audio = chamber_sim::ChamberAudio::new(Default::default(), 48_000.0);
    assert_eq!(drive(&mut audio, &[0.0; 1000], 300), 1000);
}
