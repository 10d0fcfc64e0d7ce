// =========================
// Live Host (sortie cpal)
// =========================
//
// Fait tourner un moteur audio sur le périphérique de sortie par défaut.
// Un micro est choisi pour l'écoute ; les trois peuvent être exportés en WAV.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::acoustic_engine::types::NUM_MICROPHONES;
use crate::audio_engine::audio_loading::resample_linear;
use crate::audio_engine::safewavwriter::{MicBlock, SafeWavWriter};
use crate::audio_engine::AudioEngine;

/// Taille de bloc supposée quand le périphérique ne l'annonce pas.
const DEFAULT_CALLBACK_FRAMES: usize = 4096;
/// Borne haute des tampons pré-alloués pour le callback.
const MAX_CALLBACK_FRAMES: usize = 16_384;

/// Nombre maximal de frames par callback annoncé par le périphérique.
fn callback_frames(buffer_size: &cpal::SupportedBufferSize) -> usize {
    match buffer_size {
        cpal::SupportedBufferSize::Range { max, .. } => (*max as usize).clamp(1, MAX_CALLBACK_FRAMES),
        cpal::SupportedBufferSize::Unknown => DEFAULT_CALLBACK_FRAMES,
    }
}

/// Errors that can occur while opening the live output stream
#[derive(Debug)]
pub enum LiveHostError {
    NoDevice,
    DefaultConfig(cpal::DefaultStreamConfigError),
    StreamBuildFailed(cpal::BuildStreamError),
    StreamPlayFailed(cpal::PlayStreamError),
}

impl std::fmt::Display for LiveHostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiveHostError::NoDevice => write!(f, "No audio output device available"),
            LiveHostError::DefaultConfig(e) => write!(f, "No usable output configuration: {}", e),
            LiveHostError::StreamBuildFailed(e) => write!(f, "Failed to build audio stream: {}", e),
            LiveHostError::StreamPlayFailed(e) => write!(f, "Failed to start audio stream: {}", e),
        }
    }
}

impl std::error::Error for LiveHostError {}

/// Options de lecture live.
#[derive(Debug, Clone, Default)]
pub struct LiveOptions {
    /// Micro envoyé vers la sortie
    pub monitor_mic: usize,
    /// Reboucle la source à la fin
    pub looping: bool,
    /// Export WAV des trois micros
    pub export_path: Option<String>,
}

/// Source mono lue en boucle (ou une fois) par le callback audio.
struct SourceCursor {
    data: Vec<f32>,
    pos: usize,
    looping: bool,
}

impl SourceCursor {
    fn fill(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            if self.pos >= self.data.len() {
                if self.looping && !self.data.is_empty() {
                    self.pos = 0;
                } else {
                    *sample = 0.0;
                    continue;
                }
            }
            *sample = self.data[self.pos];
            self.pos += 1;
        }
    }
}

pub struct LiveHost<A: AudioEngine + Send + 'static> {
    engine: Arc<Mutex<A>>,
    running_pair: Arc<(Mutex<bool>, Condvar)>,
    frames_rendered: Arc<AtomicU64>,
    handle: Option<thread::JoinHandle<()>>,
}

impl<A: AudioEngine + Send + 'static> LiveHost<A> {
    /// Démarre le thread audio. Sans périphérique utilisable, le thread
    /// passe en mode silencieux jusqu'à `stop`.
    pub fn start(engine: A, source: Vec<f32>, source_rate: u32, options: LiveOptions) -> Self {
        info!("🚀 Starting live chamber output ...");

        let engine = Arc::new(Mutex::new(engine));
        let running_pair = Arc::new((Mutex::new(true), Condvar::new()));
        let frames_rendered = Arc::new(AtomicU64::new(0));

        let engine_thread = engine.clone();
        let running_thread = running_pair.clone();
        let frames_thread = frames_rendered.clone();

        let handle = thread::spawn(move || {
            let audio_result = run_stream(&engine_thread, source, source_rate, &options, &running_thread, &frames_thread);

            if let Err(e) = audio_result {
                warn!("⚠️ Live output failed to initialize: {}. Running in silent mode.", e);
                warn!("   The chamber keeps running without audio output.");
                wait_for_stop(&running_thread);
                info!("🔇 Silent mode audio thread: terminé");
            }
        });

        Self {
            engine,
            running_pair,
            frames_rendered,
            handle: Some(handle),
        }
    }

    /// Accès partagé au moteur (bypass, mode...).
    pub fn engine(&self) -> Arc<Mutex<A>> {
        self.engine.clone()
    }

    pub fn is_running(&self) -> bool {
        *self.running_pair.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Relaxed)
    }

    /// Stoppe le thread audio et attend sa fin.
    pub fn stop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        info!("🧹 Fermeture du live host");
        {
            let (lock, cvar) = &*self.running_pair;
            let mut running = lock.lock().unwrap_or_else(PoisonError::into_inner);
            *running = false;
            cvar.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl<A: AudioEngine + Send + 'static> Drop for LiveHost<A> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn wait_for_stop(running_pair: &(Mutex<bool>, Condvar)) {
    let (lock, cvar) = running_pair;
    let mut running = lock.lock().unwrap_or_else(PoisonError::into_inner);
    while *running {
        running = cvar
            .wait_timeout(running, Duration::from_millis(500))
            .unwrap_or_else(PoisonError::into_inner)
            .0;
    }
}

fn run_stream<A: AudioEngine + Send + 'static>(
    engine: &Arc<Mutex<A>>,
    source: Vec<f32>,
    source_rate: u32,
    options: &LiveOptions,
    running_pair: &Arc<(Mutex<bool>, Condvar)>,
    frames_rendered: &Arc<AtomicU64>,
) -> Result<(), LiveHostError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(LiveHostError::NoDevice)?;
    let supported = device.default_output_config().map_err(LiveHostError::DefaultConfig)?;
    let config: cpal::StreamConfig = supported.config();
    let device_rate = config.sample_rate.0;
    let channels = config.channels.max(1) as usize;

    let max_frames = callback_frames(supported.buffer_size());

    info!(
        "🔊 Output device: {} Hz, {} channel(s), up to {} frames per callback",
        device_rate, channels, max_frames
    );

    {
        let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
        engine.set_sample_rate(device_rate as f32);
        engine.prepare(max_frames);
    }

    let mut cursor = SourceCursor {
        data: resample_linear(&source, source_rate, device_rate),
        pos: 0,
        looping: options.looping,
    };

    let writer = match options.export_path.as_deref() {
        Some(path) => match SafeWavWriter::new(path, device_rate) {
            Ok(w) => Some(Arc::new(Mutex::new(w))),
            Err(e) => {
                warn!("⚠️ Export disabled: {:#}", e);
                None
            }
        },
        None => None,
    };
    let writer_callback = writer.clone();

    let monitor_mic = options.monitor_mic.min(NUM_MICROPHONES - 1);
    let engine_callback = engine.clone();
    let frames_callback = frames_rendered.clone();
    let mut input = vec![0.0; max_frames];
    let mut block_index: u64 = 0;

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let frames = (data.len() / channels).min(input.len());
                cursor.fill(&mut input[..frames]);

                // Moteur occupé par le contrôle : silence pour ce bloc
                let Ok(mut engine) = engine_callback.try_lock() else {
                    data.fill(0.0);
                    return;
                };
                engine.process_block(&input[..frames]);

                // Frames au-delà de la sortie du moteur : silence
                let out = engine.microphone_output(monitor_mic).unwrap_or(&[]);
                let written = out.len().min(data.len() / channels) * channels;
                for (frame, &sample) in data[..written].chunks_exact_mut(channels).zip(out) {
                    frame.fill(sample);
                }
                data[written..].fill(0.0);

                if let Some(writer) = &writer_callback {
                    let outputs: [&[f32]; NUM_MICROPHONES] =
                        std::array::from_fn(|mic| engine.microphone_output(mic).unwrap_or(&[]));
                    let block = MicBlock::from_outputs(block_index, outputs);
                    block_index += 1;
                    writer.lock().unwrap_or_else(PoisonError::into_inner).push_block(block);
                }

                frames_callback.fetch_add(frames as u64, Ordering::Relaxed);
            },
            move |err| warn!("CPAL error: {:?}", err),
            None,
        )
        .map_err(LiveHostError::StreamBuildFailed)?;

    stream.play().map_err(LiveHostError::StreamPlayFailed)?;

    info!("🔊 Thread audio: en attente ...");
    wait_for_stop(running_pair);

    drop(stream);
    if let Some(writer) = writer {
        writer.lock().unwrap_or_else(PoisonError::into_inner).stop();
    }
    info!("🔇 Thread audio: terminé");
    Ok(())
}
