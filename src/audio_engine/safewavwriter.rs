use anyhow::Context;
use crossbeam_channel::{unbounded, Receiver, Sender};
use hound::{WavSpec, WavWriter};
use log::{info, warn};
use std::{
    fs::File,
    io::BufWriter,
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};

use crate::acoustic_engine::types::NUM_MICROPHONES;

/// Bloc multi-micro identifié (une frame = un échantillon par micro).
#[derive(Debug)]
pub struct MicBlock {
    pub index: u64,
    pub frames: Vec<[f32; NUM_MICROPHONES]>,
}

impl MicBlock {
    /// Entrelace les sorties des micros (tronqué au plus court).
    pub fn from_outputs(index: u64, outputs: [&[f32]; NUM_MICROPHONES]) -> Self {
        let len = outputs.iter().map(|o| o.len()).min().unwrap_or(0);
        let frames = (0..len)
            .map(|i| std::array::from_fn(|mic| outputs[mic][i]))
            .collect();
        Self { index, frames }
    }
}

/// Export WAV asynchrone des micros (un canal par micro, 16 bits).
pub struct SafeWavWriter {
    tx: Sender<MicBlock>,
    handle: Option<thread::JoinHandle<()>>,
    stop_pair: Arc<(Mutex<bool>, Condvar)>, // signal de fin
}

const FLUSH_INTERVAL: Duration = Duration::from_secs(2);

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

impl SafeWavWriter {
    /// Crée le fichier puis démarre le thread d'écriture.
    pub fn new(path: &str, sample_rate: u32) -> anyhow::Result<Self> {
        let spec = WavSpec {
            channels: NUM_MICROPHONES as u16,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec).with_context(|| format!("cannot create WAV file '{}'", path))?;

        let (tx, rx): (Sender<MicBlock>, Receiver<MicBlock>) = unbounded();
        let stop_pair = Arc::new((Mutex::new(true), Condvar::new()));
        let stop_pair_clone = stop_pair.clone();

        info!("💾 SafeWavWriter exporting microphones to '{}'", path);
        let handle = thread::spawn(move || write_loop(writer, rx, stop_pair_clone));

        Ok(Self {
            tx,
            handle: Some(handle),
            stop_pair,
        })
    }

    /// Pousse un bloc dans le writer
    pub fn push_block(&self, block: MicBlock) {
        let _ = self.tx.send(block);
    }

    /// Stoppe le thread et finalise le fichier
    pub fn stop(&mut self) {
        let (lock, cvar) = &*self.stop_pair;
        {
            let mut running = lock.lock().unwrap_or_else(PoisonError::into_inner);
            *running = false;
            cvar.notify_all();
        }

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SafeWavWriter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn write_loop(mut writer: WavWriter<BufWriter<File>>, rx: Receiver<MicBlock>, stop_pair: Arc<(Mutex<bool>, Condvar)>) {
    let mut total_frames: u64 = 0;
    let mut last_flush = Instant::now();

    loop {
        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(block) => {
                for frame in &block.frames {
                    for &sample in frame {
                        if let Err(e) = writer.write_sample(to_i16(sample)) {
                            warn!("[SafeWavWriter] write failed: {}", e);
                        }
                    }
                }
                total_frames += block.frames.len() as u64;

                if last_flush.elapsed() >= FLUSH_INTERVAL {
                    writer.flush().ok();
                    info!(
                        "💾 [SafeWavWriter] Periodic flush after block #{:04} ({} frames)",
                        block.index, total_frames
                    );
                    last_flush = Instant::now();
                }
            }
            Err(_) => {
                // File vide : on s'arrête seulement si le stop a été demandé
                let (lock, _cvar) = &*stop_pair;
                let running = *lock.lock().unwrap_or_else(PoisonError::into_inner);
                if !running && rx.is_empty() {
                    break;
                }
            }
        }
    }

    if let Err(e) = writer.finalize() {
        warn!("[SafeWavWriter] finalize failed: {}", e);
    }
    info!("🛑 [SafeWavWriter] Thread stopped, WAV file finalized ({} frames)", total_frames);
}
