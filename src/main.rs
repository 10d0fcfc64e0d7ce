// Ici on importe depuis la crate lib complète
use anyhow::{bail, Result};
use log::info;
use std::{env, io::BufRead, path::PathBuf};

use chamber_sim::acoustic_engine::types::NUM_MICROPHONES;
use chamber_sim::acoustic_engine::{AcousticSettings, SceneConfig};
use chamber_sim::audio_engine::{
    load_mono_wav, render_offline, AudioEngineSettings, LiveHost, LiveOptions, MicBlock, SafeWavWriter,
};
use chamber_sim::utils::show_rust_core_dependencies;
use chamber_sim::Chamber;

const DEFAULT_SCENE_PATH: &str = "assets/config/scene.toml";
const RENDER_BLOCK_SIZE: usize = 512;

const USAGE: &str = "usage:
  chamber-sim render <input.wav> <output.wav> [scene.toml]
  chamber-sim live <input.wav> [scene.toml] [mic]";

/// Scène : argument CLI, puis `CHAMBER_SCENE`, puis fichier par défaut.
fn load_scene(arg: Option<String>) -> SceneConfig {
    let path = arg
        .map(PathBuf::from)
        .or_else(|| env::var("CHAMBER_SCENE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE_PATH));

    info!("Scene path: {}", path.display());
    let scene = SceneConfig::from_file(&path.to_string_lossy()).unwrap_or_default();
    info!("Scene loaded:\n{:#?}", scene);
    scene
}

/// Rendu offline : un canal WAV par micro.
fn render(input: &str, output: &str, scene: &SceneConfig) -> Result<()> {
    let (samples, sample_rate) = load_mono_wav(input)?;
    info!("🎵 Loaded '{}': {} samples @ {} Hz", input, samples.len(), sample_rate);

    let mut chamber = Chamber::from_scene(
        scene,
        AcousticSettings::default(),
        AudioEngineSettings::default(),
        sample_rate as f32,
    );
    let mut writer = SafeWavWriter::new(output, sample_rate)?;

    // Latence du pipeline compensée : la sortie est alignée sur l'entrée
    let rendered = render_offline(chamber.audio_mut(), &samples, RENDER_BLOCK_SIZE, |index, outputs| {
        writer.push_block(MicBlock::from_outputs(index, outputs));
    });
    info!("🎧 {} samples rendered per microphone", rendered);

    writer.stop();
    info!("✅ Rendered {} microphones to '{}'", NUM_MICROPHONES, output);
    Ok(())
}

/// Lecture live d'un micro ; Entrée pour arrêter.
fn live(input: &str, scene: &SceneConfig, monitor_mic: usize) -> Result<()> {
    let (samples, sample_rate) = load_mono_wav(input)?;
    let chamber = Chamber::from_scene(
        scene,
        AcousticSettings::default(),
        AudioEngineSettings::default(),
        sample_rate as f32,
    );
    let (controller, audio) = chamber.split();

    let options = LiveOptions {
        monitor_mic,
        looping: true,
        export_path: env::var("CHAMBER_AUDIO_EXPORT").ok(),
    };
    let mut host = LiveHost::start(audio, samples, sample_rate, options);

    info!("🎧 Monitoring microphone {} (press Enter to stop)", monitor_mic);
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    host.stop();
    info!(
        "🧹 Live session closed: {} frames rendered, response #{}",
        host.frames_rendered(),
        controller.response().generation
    );
    Ok(())
}

/// Main entry point for the Chamber Simulator application.
fn main() -> Result<()> {
    env_logger::init();

    info!("🚀 Starting Chamber Simulator...");

    show_rust_core_dependencies();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("render") => {
            let (Some(input), Some(output)) = (args.next(), args.next()) else {
                bail!("{USAGE}");
            };
            let scene = load_scene(args.next());
            render(&input, &output, &scene)
        }
        Some("live") => {
            let Some(input) = args.next() else {
                bail!("{USAGE}");
            };
            let scene = load_scene(args.next());
            let mic = match args.next() {
                Some(m) => m.parse::<usize>()?,
                None => 1,
            };
            if mic >= NUM_MICROPHONES {
                bail!("microphone index must be < {}", NUM_MICROPHONES);
            }
            live(&input, &scene, mic)
        }
        _ => bail!("{USAGE}"),
    }
}
