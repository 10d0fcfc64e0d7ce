// =========================
// ChamberAudio (côté thread audio)
// =========================
//
// Consomme les réponses publiées par le `ChamberController` et produit les
// sorties des trois micros, bloc par bloc.

use log::{debug, info, warn};
use std::array;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::acoustic_engine::controller::ResponseLink;
use crate::acoustic_engine::frequency_bands::{is_valid_sample_rate, MicFrequencyBands};
use crate::acoustic_engine::response::ChamberResponse;
use crate::acoustic_engine::types::NUM_MICROPHONES;
use crate::audio_engine::circular_buffer::CircularBuffer;
use crate::audio_engine::filter_bank::FilterBank;
use crate::audio_engine::levels::LevelMeter;
use crate::audio_engine::settings::{AudioEngineSettings, ProcessingMode};
use crate::audio_engine::spectral::SpectralProcessor;
use crate::audio_engine::AudioEngine;
use crate::{log_metrics, profiler::Profiler};

const METRICS_LOG_INTERVAL: Duration = Duration::from_secs(4);

pub struct ChamberAudio {
    settings: AudioEngineSettings,
    sample_rate: f32,
    mode: ProcessingMode,
    bypass: bool,

    link: Option<ResponseLink>,
    current: Option<Arc<ChamberResponse>>,
    responses: [MicFrequencyBands; NUM_MICROPHONES],

    spectral: SpectralProcessor,
    filter_bank: FilterBank,

    outputs: [Vec<f32>; NUM_MICROPHONES],
    output_len: usize,
    buffers: [CircularBuffer; NUM_MICROPHONES],
    levels: [LevelMeter; NUM_MICROPHONES],
    last_input: f32,
    oversize_warned: bool,

    profiler: Profiler,
    last_log: Instant,
}

impl ChamberAudio {
    /// Moteur autonome : réponse neutre jusqu'au premier `apply_response`.
    pub fn new(settings: AudioEngineSettings, sample_rate: f32) -> Self {
        let max_block = settings.max_block_size().max(1);
        let responses: [MicFrequencyBands; NUM_MICROPHONES] = array::from_fn(|_| MicFrequencyBands::new());
        let band_count = responses[0].len();

        let mut audio = Self {
            sample_rate,
            mode: settings.processing_mode(),
            bypass: settings.bypass(),
            link: None,
            current: None,
            responses,
            spectral: SpectralProcessor::new(sample_rate, max_block, NUM_MICROPHONES),
            filter_bank: FilterBank::new(NUM_MICROPHONES, band_count),
            outputs: array::from_fn(|_| vec![0.0; max_block]),
            output_len: 0,
            buffers: array::from_fn(|_| CircularBuffer::new(settings.circular_buffer_capacity())),
            levels: array::from_fn(|_| LevelMeter::new(settings.level_decay())),
            last_input: 0.0,
            oversize_warned: false,
            profiler: Profiler::new(200),
            last_log: Instant::now(),
            settings,
        };
        audio.refresh_filters();
        audio
    }

    /// Moteur relié à un contrôleur ; la première réponse est consommée tout de suite.
    pub fn with_link(settings: AudioEngineSettings, sample_rate: f32, link: ResponseLink) -> Self {
        let mut audio = Self::new(settings, sample_rate);
        audio.link = Some(link);
        audio.poll_responses();
        audio
    }

    pub fn settings(&self) -> &AudioEngineSettings {
        &self.settings
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    pub fn processing_mode(&self) -> ProcessingMode {
        self.mode
    }

    pub fn set_processing_mode(&mut self, mode: ProcessingMode) {
        if mode != self.mode {
            info!("🎛️ Processing mode: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            self.spectral.reset_from(self.last_input);
            self.filter_bank.reset();
        }
    }

    /// Réponse actuellement appliquée (si reçue d'un contrôleur).
    pub fn current_response(&self) -> Option<&Arc<ChamberResponse>> {
        self.current.as_ref()
    }

    /// Bandes appliquées au micro `mic` (coefficients au sample rate local).
    pub fn microphone_response(&self, mic: usize) -> Option<&MicFrequencyBands> {
        self.responses.get(mic)
    }

    // =========================
    // Réception des réponses
    // =========================

    /// Récupère la réponse la plus récente publiée, sans bloquer.
    ///
    /// Les réponses remplacées repartent vers le contrôleur pour y être libérées.
    pub fn poll_responses(&mut self) {
        let newest = {
            let Some(link) = self.link.as_ref() else {
                return;
            };
            let mut newest: Option<Arc<ChamberResponse>> = None;
            while let Ok(response) = link.updates.try_recv() {
                if let Some(skipped) = newest.replace(response) {
                    let _ = link.retired.try_send(skipped);
                }
            }
            newest
        };

        if let Some(response) = newest {
            self.apply_response(&response);
            let previous = self.current.replace(response);
            if let (Some(previous), Some(link)) = (previous, self.link.as_ref()) {
                let _ = link.retired.try_send(previous);
            }
        }
    }

    /// Copie les valeurs de bande et recalcule les biquads au sample rate local.
    pub fn apply_response(&mut self, response: &ChamberResponse) {
        for (local, published) in self.responses.iter_mut().zip(&response.microphones) {
            local.copy_values_from(published);
        }
        self.refresh_filters();
    }

    fn refresh_filters(&mut self) {
        for local in &mut self.responses {
            local.calculate_biquad_coefficients(self.sample_rate);
        }
        self.filter_bank.update_coefficients(&self.responses);
    }

    // =========================
    // Sorties
    // =========================

    /// Lit les échantillons accumulés dans le tampon circulaire du micro.
    pub fn read_microphone_samples(&mut self, mic: usize, out: &mut [f32]) -> usize {
        match self.buffers.get_mut(mic) {
            Some(buffer) => buffer.read(out),
            None => 0,
        }
    }

    pub fn available_samples(&self, mic: usize) -> usize {
        self.buffers.get(mic).map(|b| b.available()).unwrap_or(0)
    }

    pub fn instantaneous_level(&self, mic: usize) -> Option<f32> {
        self.levels.get(mic).map(|l| l.instantaneous())
    }

    pub fn peak_level(&self, mic: usize) -> Option<f32> {
        self.levels.get(mic).map(|l| l.peak())
    }

    // =========================
    // Traitement
    // =========================

    fn process_chunk(&mut self, input: &[f32], offset: usize) {
        let end = offset + input.len();
        let mut outs: [&mut [f32]; NUM_MICROPHONES] = self.outputs.each_mut().map(|v| &mut v[offset..end]);

        if self.bypass {
            for out in outs.iter_mut() {
                out.copy_from_slice(input);
            }
            return;
        }

        match self.mode {
            ProcessingMode::Spectral => {
                let _guard = self.profiler.measure("spectral");
                self.spectral.process(input, &self.responses, &mut outs);
            }
            ProcessingMode::FilterBank => {
                let _guard = self.profiler.measure("filter_bank");
                self.filter_bank.process(input, &mut outs);
            }
        }
    }
}

impl AudioEngine for ChamberAudio {
    fn prepare(&mut self, max_block_size: usize) {
        if max_block_size > self.outputs[0].len() {
            debug!("Microphone output resized: {} -> {}", self.outputs[0].len(), max_block_size);
            for out in &mut self.outputs {
                out.resize(max_block_size, 0.0);
            }
        }
        self.oversize_warned = false;
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        if !is_valid_sample_rate(sample_rate) || sample_rate == self.sample_rate {
            return;
        }
        info!("🎚️ Sample rate changed: {} -> {}", self.sample_rate, sample_rate);
        self.sample_rate = sample_rate;
        self.spectral.set_sample_rate(sample_rate);
        self.refresh_filters();
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn process_block(&mut self, input: &[f32]) {
        let profiler = self.profiler.clone();
        let frame_guard = profiler.measure("process_block");

        self.poll_responses();

        // Jamais d'allocation ici : au-delà de la taille préparée, le bloc est tronqué
        let capacity = self.outputs[0].len();
        if input.len() > capacity && !self.oversize_warned {
            warn!(
                "⚠️ Block of {} samples exceeds prepared size {}; call prepare() first",
                input.len(),
                capacity
            );
            self.oversize_warned = true;
        }
        let input = &input[..input.len().min(capacity)];

        let chunk_size = self.spectral.max_block_size();
        let mut offset = 0;
        for chunk in input.chunks(chunk_size) {
            self.process_chunk(chunk, offset);
            offset += chunk.len();
        }
        self.output_len = input.len();

        for mic in 0..NUM_MICROPHONES {
            let block = &self.outputs[mic][..self.output_len];
            self.buffers[mic].write(block);
            self.levels[mic].update(block);
        }
        if let Some(&last) = input.last() {
            self.last_input = last;
        }

        drop(frame_guard);
        if self.last_log.elapsed() >= METRICS_LOG_INTERVAL {
            log_metrics!(&profiler);
            self.last_log = Instant::now();
        }
    }

    fn microphone_output(&self, mic: usize) -> Option<&[f32]> {
        self.outputs.get(mic).map(|out| &out[..self.output_len])
    }

    fn set_bypass(&mut self, bypass: bool) {
        if bypass == self.bypass {
            return;
        }
        self.bypass = bypass;
        if !bypass {
            // Reprise : la sortie part en continuation du dernier échantillon bypassé
            self.spectral.reset_from(self.last_input);
            self.filter_bank.reset();
        }
    }

    fn is_bypassed(&self) -> bool {
        self.bypass
    }

    fn latency_samples(&self) -> usize {
        if self.bypass {
            return 0;
        }
        match self.mode {
            ProcessingMode::Spectral => self.spectral.latency_samples(),
            ProcessingMode::FilterBank => 0,
        }
    }
}
