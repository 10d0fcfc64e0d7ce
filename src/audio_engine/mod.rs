pub mod r#trait;
pub use r#trait::AudioEngine;

pub mod settings;
pub use settings::{AudioEngineSettings, AudioEngineSettingsBuilder, ProcessingMode};

pub mod circular_buffer;
pub use circular_buffer::CircularBuffer;

pub mod levels;
pub use levels::LevelMeter;

pub mod spectral;
pub use spectral::SpectralProcessor;

pub mod filter_bank;
pub use filter_bank::FilterBank;

pub mod chamber_audio;
pub use chamber_audio::ChamberAudio;

pub mod audio_loading;
pub use audio_loading::{load_mono_wav, resample_linear};

pub mod offline;
pub use offline::render_offline;

pub mod safewavwriter;
pub use safewavwriter::{MicBlock, SafeWavWriter};

pub mod live;
pub use live::{LiveHost, LiveHostError, LiveOptions};
