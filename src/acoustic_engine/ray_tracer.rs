// =========================
// Ray Tracer
// =========================
//
// Lancer de rayons 2D dans la chambre unité : murs extérieurs + bords de zones.
// Le tracer ne garde aucune référence sur la chambre, la géométrie est
// passée à chaque appel.

use glam::Vec2;
use log::debug;
use std::f32::consts::FRAC_PI_2;

use crate::acoustic_engine::physics;
use crate::acoustic_engine::settings::AcousticSettings;
use crate::acoustic_engine::types::{ChamberGeometry, Intersection, Ray, Wall};

/// Distance minimale d'un impact (évite de re-toucher la surface de départ).
pub const RAY_EPSILON: f32 = 1e-6;

/// Candidat d'impact, retenu seulement s'il est plus proche que le meilleur.
#[inline]
fn consider(best: &mut Intersection, t: f32, point: Vec2, normal: Vec2, wall: Option<Wall>, zone_id: Option<usize>) {
    if t > RAY_EPSILON && t < best.distance {
        *best = Intersection {
            hit: true,
            point,
            normal,
            distance: t,
            is_wall: wall.is_some(),
            wall,
            zone_id,
        };
    }
}

#[derive(Debug, Clone, Default)]
pub struct RayTracer {
    settings: AcousticSettings,
}

impl RayTracer {
    pub fn new(settings: AcousticSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AcousticSettings {
        &self.settings
    }

    /// Impact le plus proche d'un rayon (murs d'abord, puis zones dans l'ordre).
    pub fn trace_ray(&self, geometry: &ChamberGeometry, ray: &Ray) -> Intersection {
        let o = ray.origin;
        let d = ray.direction;
        let mut best = Intersection::miss();

        // Murs : seul le mur vers lequel pointe chaque composante est testé
        if d.x != 0.0 {
            let (x, wall) = if d.x > 0.0 { (1.0, Wall::Right) } else { (0.0, Wall::Left) };
            let t = (x - o.x) / d.x;
            let y = o.y + t * d.y;
            if (0.0..=1.0).contains(&y) {
                consider(&mut best, t, Vec2::new(x, y), wall.inward_normal(), Some(wall), None);
            }
        }
        if d.y != 0.0 {
            let (y, wall) = if d.y > 0.0 { (1.0, Wall::Top) } else { (0.0, Wall::Bottom) };
            let t = (y - o.y) / d.y;
            let x = o.x + t * d.x;
            if (0.0..=1.0).contains(&x) {
                consider(&mut best, t, Vec2::new(x, y), wall.inward_normal(), Some(wall), None);
            }
        }

        // Bords de zones : normale opposée à la composante du rayon
        for (i, zone) in geometry.zones.iter().enumerate() {
            if d.x != 0.0 {
                let normal = Vec2::new(-d.x.signum(), 0.0);
                for x in [zone.x1(), zone.x2()] {
                    let t = (x - o.x) / d.x;
                    let y = o.y + t * d.y;
                    if y >= zone.y1() && y <= zone.y2() {
                        consider(&mut best, t, Vec2::new(x, y), normal, None, Some(i));
                    }
                }
            }
            if d.y != 0.0 {
                let normal = Vec2::new(0.0, -d.y.signum());
                for y in [zone.y1(), zone.y2()] {
                    let t = (y - o.y) / d.y;
                    let x = o.x + t * d.x;
                    if x >= zone.x1() && x <= zone.x2() {
                        consider(&mut best, t, Vec2::new(x, y), normal, None, Some(i));
                    }
                }
            }
        }

        best
    }

    /// Rayon spéculaire + rayons diffus issus d'un impact.
    pub fn generate_reflection_rays(
        &self,
        geometry: &ChamberGeometry,
        ray: &Ray,
        intersection: &Intersection,
    ) -> Vec<Ray> {
        let rays_per_reflection = self.settings.rays_per_reflection.max(1);
        let mut out = Vec::with_capacity(rays_per_reflection);

        // R = I - 2(I·N)N
        let n = intersection.normal;
        let reflected = ray.direction - 2.0 * ray.direction.dot(n) * n;

        let mut specular = Ray {
            origin: intersection.point,
            direction: reflected,
            intensity: ray.intensity * self.settings.reflection_gain,
            distance: ray.distance + intersection.distance,
            bounce_count: ray.bounce_count + 1,
            frequency_bands: ray.frequency_bands.clone(),
        };
        self.update_ray_frequencies(geometry, &mut specular, intersection);

        for i in 1..rays_per_reflection {
            let angle = i as f32 / rays_per_reflection as f32 * FRAC_PI_2;
            let dir = Vec2::from_angle(angle).rotate(reflected);
            out.push(Ray {
                origin: intersection.point,
                direction: dir.try_normalize().unwrap_or(dir),
                intensity: specular.intensity * self.settings.scatter_gain,
                distance: specular.distance,
                bounce_count: specular.bounce_count,
                frequency_bands: specular.frequency_bands.clone(),
            });
        }
        out.insert(0, specular);
        out
    }

    /// Filtrage fréquentiel et pertes d'intensité à un impact.
    ///
    /// - mur : les aigus sont davantage absorbés
    /// - bord de zone : transmission dépendant de l'écart de densité
    pub fn update_ray_frequencies(&self, geometry: &ChamberGeometry, ray: &mut Ray, intersection: &Intersection) {
        if !intersection.hit {
            return;
        }

        let mapping = self.settings.band_frequency;
        if intersection.is_wall {
            for (i, band) in ray.frequency_bands.bands_mut().iter_mut().enumerate() {
                let f = mapping.frequency(i, band);
                let absorption = 0.1 + 0.05 * (f / 100.0).log10();
                band.value *= 1.0 - absorption;
            }
        } else if let Some(zone) = intersection.zone_id.and_then(|i| geometry.zones.get(i)) {
            let z1 = geometry.default_density;
            let z2 = zone.density();
            for (i, band) in ray.frequency_bands.bands_mut().iter_mut().enumerate() {
                let f = mapping.frequency(i, band);
                let freq_factor = 0.5 + 0.5 * (f / 100.0).log10() / 3.0;
                let t = 1.0 - (z2 - z1).abs() * freq_factor / (z1 + z2);
                band.value *= t.clamp(0.1, 1.0);
            }
        }

        ray.intensity *= 1.0 / (1.0 + 0.1 * intersection.distance);
        ray.intensity *= 0.8;
    }

    /// Contribution d'un rayon à un micro (faisceau en cos⁴, atténuation en distance).
    pub fn calculate_ray_contribution(&self, ray: &Ray, mic: Vec2) -> f32 {
        let to_mic = mic - ray.origin;
        let dist = to_mic.length();
        if dist > self.settings.max_contribution_distance {
            return 0.0;
        }

        let dir_to_mic = if dist > 0.0 { to_mic / dist } else { to_mic };
        let dot = ray.direction.dot(dir_to_mic);
        if dot < 0.0 {
            return 0.0;
        }

        let angle = dot.min(1.0).acos();
        let angle_factor = angle.cos().powi(4);
        let distance_attenuation = 1.0 / (1.0 + dist * dist * 10.0);

        ray.intensity * angle_factor * distance_attenuation * 0.8_f32.powi(ray.bounce_count as i32)
    }

    /// Reconstruit la liste des rayons : primaire vers chaque micro puis
    /// cascade de réflexions (pile LIFO, plafond d'impacts par micro).
    pub fn build_ray_cache(&self, geometry: &ChamberGeometry) -> Vec<Ray> {
        let threshold = self.settings.significance_threshold;
        let mut cache = Vec::new();
        let mut frontier: Vec<Ray> = Vec::new();

        for (mic_idx, mic) in geometry.microphones.iter().enumerate() {
            let offset = *mic - geometry.speaker;
            let mut primary = Ray::new(geometry.speaker, offset);
            primary.distance = physics::distance(geometry.speaker, *mic);
            cache.push(primary.clone());

            frontier.clear();
            frontier.push(primary);
            let mut hits = 0;

            while hits < self.settings.max_reflections {
                let Some(current) = frontier.pop() else {
                    break;
                };
                let intersection = self.trace_ray(geometry, &current);
                if !intersection.hit {
                    continue;
                }
                for child in self.generate_reflection_rays(geometry, &current, &intersection) {
                    if child.intensity > threshold {
                        cache.push(child.clone());
                        frontier.push(child);
                    }
                }
                hits += 1;
            }

            debug!(
                "mic {}: {} hits, {} rays cached so far, {} left in frontier",
                mic_idx,
                hits,
                cache.len(),
                frontier.len()
            );
        }

        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_geometry() -> ChamberGeometry {
        ChamberGeometry::default()
    }

    #[test]
    fn test_miss_has_infinite_distance() {
        let tracer = RayTracer::default();
        // Origine hors de la chambre, direction qui s'en éloigne
        let ray = Ray::new(Vec2::new(2.0, 2.0), Vec2::new(1.0, 1.0));
        let hit = tracer.trace_ray(&empty_geometry(), &ray);
        assert!(!hit.hit);
        assert!(hit.distance.is_infinite());
    }

    #[test]
    fn test_zero_direction_never_hits() {
        let tracer = RayTracer::default();
        let ray = Ray::new(Vec2::new(0.5, 0.5), Vec2::ZERO);
        assert!(!tracer.trace_ray(&empty_geometry(), &ray).hit);
    }

    #[test]
    fn test_specular_direction() {
        let tracer = RayTracer::default();
        let geometry = empty_geometry();
        let ray = Ray::new(Vec2::new(0.5, 0.3), Vec2::new(1.0, 1.0));
        let hit = tracer.trace_ray(&geometry, &ray);
        assert!(hit.hit && hit.is_wall);
        assert_eq!(hit.wall, Some(Wall::Right));

        let children = tracer.generate_reflection_rays(&geometry, &ray, &hit);
        assert_eq!(children.len(), 3);
        let r = children[0].direction;
        let expected = Vec2::new(1.0, 1.0).normalize();
        assert!((r - Vec2::new(-expected.x, expected.y)).length() < 1e-5, "r={:?}", r);
        for c in &children {
            assert_eq!(c.bounce_count, 1);
            assert!((c.direction.length() - 1.0).abs() < 1e-5);
            assert!(c.intensity <= ray.intensity);
        }
        assert!((children[1].intensity - children[0].intensity * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_contribution_behind_or_far_is_zero() {
        let tracer = RayTracer::default();
        let ray = Ray::new(Vec2::new(0.5, 0.5), Vec2::X);
        assert_eq!(tracer.calculate_ray_contribution(&ray, Vec2::new(0.2, 0.5)), 0.0);

        let far = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        assert_eq!(tracer.calculate_ray_contribution(&far, Vec2::new(1.0, 1.0)), 0.0);

        let on_axis = tracer.calculate_ray_contribution(&ray, Vec2::new(0.8, 0.5));
        let expected = 1.0 / (1.0 + 0.09 * 10.0);
        assert!((on_axis - expected).abs() < 1e-5);
    }
}
