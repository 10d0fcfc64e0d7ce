use anyhow::Context;
use log::warn;
use serde::Deserialize;

use crate::acoustic_engine::controller::ChamberController;
use crate::acoustic_engine::types::{ChamberGeometry, NUM_MICROPHONES};
use crate::acoustic_engine::zone::Zone;

fn default_zone_density() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneConfig {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    #[serde(default = "default_zone_density")]
    pub density: f32,
}

/// Description d'une scène (TOML) : haut-parleur, micros, zones.
///
/// Les valeurs sont bornées à l'application, comme via l'interface de mutation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub speaker: [f32; 2],
    pub microphones: Vec<[f32; 2]>,
    pub default_density: f32,
    pub zones: Vec<ZoneConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let geometry = ChamberGeometry::default();
        Self {
            speaker: geometry.speaker.to_array(),
            microphones: geometry.microphones.iter().map(|m| m.to_array()).collect(),
            default_density: geometry.default_density,
            zones: Vec::new(),
        }
    }
}

impl SceneConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("cannot read scene file '{}'", path))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid scene file '{}'", path))
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Géométrie équivalente (valeurs bornées).
    pub fn to_geometry(&self) -> ChamberGeometry {
        let mut geometry = ChamberGeometry::default();
        self.write_into(&mut geometry);
        geometry
    }

    fn write_into(&self, geometry: &mut ChamberGeometry) {
        if self.microphones.len() > NUM_MICROPHONES {
            warn!(
                "Scene declares {} microphones, only the first {} are used",
                self.microphones.len(),
                NUM_MICROPHONES
            );
        }

        geometry.set_default_density(self.default_density);
        geometry.set_speaker_position(self.speaker[0], self.speaker[1]);
        for (mic, [x, y]) in self.microphones.iter().take(NUM_MICROPHONES).enumerate() {
            geometry.set_microphone_position(mic, *x, *y);
        }
        geometry.zones = self
            .zones
            .iter()
            .map(|z| Zone::new(z.x1, z.y1, z.x2, z.y2, z.density))
            .collect();
    }

    /// Rejoue la scène sur un contrôleur (une seule reconstruction).
    pub fn apply_to(&self, controller: &ChamberController) {
        controller.edit(|geometry| self.write_into(geometry));
    }
}
