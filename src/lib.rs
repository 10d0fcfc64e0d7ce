// Acoustic engine (géométrie, ray tracing, réponses des micros)
pub mod acoustic_engine;
pub use acoustic_engine::{AcousticSettings, ChamberController, RayTracer, SceneConfig};
// Audio engine (pipeline spectral, I/O)
pub mod audio_engine;
pub use audio_engine::{AudioEngine, AudioEngineSettings, ChamberAudio};

pub mod chamber;
pub use chamber::Chamber;

// Profiler
pub mod profiler;
// Utilities
pub mod utils;
