pub mod physics;

pub mod types;
pub use self::types::{ChamberGeometry, Intersection, Ray, Wall, NUM_MICROPHONES};

pub mod zone;
pub use self::zone::Zone;

pub mod frequency_bands;
pub use self::frequency_bands::{Biquad, FrequencyBand, MicFrequencyBands, NUM_FREQUENCY_BANDS};

pub mod settings;
pub use self::settings::{AcousticSettings, AcousticSettingsBuilder, BandFrequencyMapping};

pub mod ray_tracer;
pub use self::ray_tracer::RayTracer;

pub mod response;
pub use self::response::ChamberResponse;

pub mod controller;
pub use self::controller::{ChamberController, ResponseLink};

pub mod config;
pub use self::config::{SceneConfig, ZoneConfig};
