// =========================
// Acoustic Physics Helpers
// =========================
//
// Fonctions pures du modèle de propagation. Les densités sont relatives
// (1.0 = milieu par défaut), les vitesses sont en unités de chambre par pas.

use glam::Vec2;

/// Vitesse du son dans un milieu de densité `density`.
///
/// Plus le milieu est dense, plus la propagation est lente : `0.1 + 0.05 / sqrt(density)`.
pub fn sound_speed(density: f32) -> f32 {
    0.1 + 0.05 / density.sqrt()
}

/// Facteur d'amortissement par pas (proche de 1, décroît avec la densité).
pub fn damping(density: f32) -> f32 {
    0.999 - 0.0005 * density
}

/// Impédance acoustique `Z = ρ · c`.
pub fn acoustic_impedance(density: f32) -> f32 {
    density * sound_speed(density)
}

/// Coefficient de transmission en pression à une interface `z1 -> z2`.
pub fn transmission_coefficient(z1: f32, z2: f32, angle: f32) -> f32 {
    let denom = z1 + z2;
    if denom <= 0.0 {
        return 0.0;
    }
    2.0 * z2 * angle.cos() / denom
}

/// Coefficient de réflexion en pression à une interface `z1 -> z2`.
pub fn reflection_coefficient(z1: f32, z2: f32, angle: f32) -> f32 {
    let z2_cos = z2 * angle.cos();
    let denom = z2_cos + z1;
    if denom.abs() <= f32::EPSILON {
        return 0.0;
    }
    (z2_cos - z1) / denom
}

/// Atténuation fréquentielle au passage d'une impédance à une autre.
///
/// `normalized_freq` est dans `[0, 1]`. Vers un milieu plus dense les hautes
/// fréquences sont davantage atténuées ; vers un milieu moins dense le gain
/// se rapproche de `ratio`.
pub fn frequency_attenuation(source_impedance: f32, target_impedance: f32, normalized_freq: f32) -> f32 {
    if source_impedance <= 0.0 {
        return 1.0;
    }
    let ratio = target_impedance / source_impedance;
    let f = normalized_freq.clamp(0.0, 1.0);

    if ratio > 1.0 {
        1.0 / (1.0 + (ratio - 1.0) * f)
    } else {
        let freq_factor = 1.0 - 0.5 * f;
        freq_factor + (1.0 - freq_factor) * ratio
    }
}

/// Distance euclidienne entre deux points de la chambre.
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}
