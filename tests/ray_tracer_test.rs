use chamber_sim::acoustic_engine::types::{ChamberGeometry, Ray, Wall, NUM_MICROPHONES};
use chamber_sim::acoustic_engine::zone::Zone;
use chamber_sim::acoustic_engine::{AcousticSettings, AcousticSettingsBuilder, BandFrequencyMapping, RayTracer};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn geometry_with_zone(zone: Zone) -> ChamberGeometry {
    let mut geometry = ChamberGeometry::default();
    geometry.zones.push(zone);
    geometry
}

// ==================================
// 1. Murs
// ==================================

#[test]
fn test_horizontal_ray_hits_right_wall() {
    let tracer = RayTracer::default();
    let ray = Ray::new(Vec2::new(0.0, 0.5), Vec2::new(1.0, 0.0));
    let hit = tracer.trace_ray(&ChamberGeometry::default(), &ray);

    assert!(hit.hit);
    assert!(hit.is_wall);
    assert_eq!(hit.wall, Some(Wall::Right));
    assert_eq!(hit.zone_id, None);
    assert!((hit.point.x - 1.0).abs() < 1e-6, "point={:?}", hit.point);
    assert!((hit.point.y - 0.5).abs() < 1e-6);
    assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
    assert!((hit.distance - 1.0).abs() < 1e-6);
}

#[test]
fn test_each_wall_reports_inward_normal() {
    let tracer = RayTracer::default();
    let geometry = ChamberGeometry::default();
    let center = Vec2::new(0.5, 0.5);

    let cases = [
        (Vec2::new(-1.0, 0.0), Wall::Left, Vec2::new(1.0, 0.0)),
        (Vec2::new(0.0, -1.0), Wall::Bottom, Vec2::new(0.0, 1.0)),
        (Vec2::new(0.0, 1.0), Wall::Top, Vec2::new(0.0, -1.0)),
    ];
    for (dir, wall, normal) in cases {
        let hit = tracer.trace_ray(&geometry, &Ray::new(center, dir));
        assert_eq!(hit.wall, Some(wall), "dir={:?}", dir);
        assert_eq!(hit.normal, normal);
        assert!((hit.distance - 0.5).abs() < 1e-6);
    }
}

// ==================================
// 2. Zones
// ==================================

#[test]
fn test_zone_edge_normal_opposes_ray() {
    let tracer = RayTracer::default();
    let geometry = geometry_with_zone(Zone::new(0.4, 0.2, 0.6, 0.8, 5.0));

    // Entrée par la gauche
    let hit = tracer.trace_ray(&geometry, &Ray::new(Vec2::new(0.1, 0.5), Vec2::X));
    assert!(hit.hit && !hit.is_wall);
    assert_eq!(hit.zone_id, Some(0));
    assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
    assert!((hit.point.x - 0.4).abs() < 1e-6);

    // Sortie par la gauche depuis l'intérieur
    let hit = tracer.trace_ray(&geometry, &Ray::new(Vec2::new(0.5, 0.5), Vec2::NEG_X));
    assert_eq!(hit.zone_id, Some(0));
    assert_eq!(hit.normal, Vec2::new(1.0, 0.0));
    assert!((hit.distance - 0.1).abs() < 1e-6);

    // Bord horizontal
    let hit = tracer.trace_ray(&geometry, &Ray::new(Vec2::new(0.5, 0.1), Vec2::Y));
    assert_eq!(hit.zone_id, Some(0));
    assert_eq!(hit.normal, Vec2::new(0.0, -1.0));
    assert!((hit.point.y - 0.2).abs() < 1e-6);
}

#[test]
fn test_ray_passing_beside_zone_hits_wall() {
    let tracer = RayTracer::default();
    let geometry = geometry_with_zone(Zone::new(0.4, 0.6, 0.6, 0.8, 5.0));
    let hit = tracer.trace_ray(&geometry, &Ray::new(Vec2::new(0.0, 0.3), Vec2::X));
    assert_eq!(hit.wall, Some(Wall::Right));
}

#[test]
fn test_tie_keeps_wall() {
    let tracer = RayTracer::default();
    // Le bord droit de la zone coïncide avec le mur droit
    let geometry = geometry_with_zone(Zone::new(0.9, 0.0, 1.0, 1.0, 5.0));
    let hit = tracer.trace_ray(&geometry, &Ray::new(Vec2::new(0.95, 0.5), Vec2::X));
    assert!(hit.is_wall, "tie should keep the wall candidate: {:?}", hit);
    assert_eq!(hit.zone_id, None);
}

#[test]
fn test_nearest_of_two_zones() {
    let tracer = RayTracer::default();
    let mut geometry = geometry_with_zone(Zone::new(0.7, 0.0, 0.8, 1.0, 2.0));
    geometry.zones.push(Zone::new(0.3, 0.0, 0.4, 1.0, 2.0));
    let hit = tracer.trace_ray(&geometry, &Ray::new(Vec2::new(0.0, 0.5), Vec2::X));
    assert_eq!(hit.zone_id, Some(1));
    assert!((hit.distance - 0.3).abs() < 1e-6);
}

// ==================================
// 3. Réflexions
// ==================================

#[test]
fn test_zone_boundary_filters_high_bands_more() {
    let tracer = RayTracer::default();
    let geometry = geometry_with_zone(Zone::new(0.4, 0.0, 0.6, 1.0, 10.0));
    let ray = Ray::new(Vec2::new(0.0, 0.5), Vec2::X);
    let hit = tracer.trace_ray(&geometry, &ray);
    let children = tracer.generate_reflection_rays(&geometry, &ray, &hit);

    let values = children[0].frequency_bands.values();
    assert!(values[20] < values[4], "values={:?}", values);
    assert!(values.iter().all(|v| (0.1..=1.0).contains(v)));
}

#[test]
fn test_wall_absorption_grows_with_frequency() {
    let tracer = RayTracer::default();
    let geometry = ChamberGeometry::default();
    let ray = Ray::new(Vec2::new(0.5, 0.5), Vec2::X);
    let hit = tracer.trace_ray(&geometry, &ray);
    let specular = &tracer.generate_reflection_rays(&geometry, &ray, &hit)[0];

    let values = specular.frequency_bands.values();
    for pair in values.windows(2) {
        assert!(pair[1] <= pair[0], "values={:?}", values);
    }
    // 0.7 (réflexion) · 1/(1 + 0.1·0.5) · 0.8
    let expected = 0.7 / 1.05 * 0.8;
    assert!((specular.intensity - expected).abs() < 1e-5);
    assert!((specular.distance - 0.5).abs() < 1e-6);
}

#[test]
fn test_top_band_uses_octave_frequency_by_default() {
    let geometry = ChamberGeometry::default();
    let ray = Ray::new(Vec2::new(0.5, 0.5), Vec2::X);

    let tracer = RayTracer::default();
    let hit = tracer.trace_ray(&geometry, &ray);
    let top = tracer.generate_reflection_rays(&geometry, &ray, &hit)[0]
        .frequency_bands
        .value(23)
        .unwrap();
    // f = 100 · 2^23
    let expected = 1.0 - (0.1 + 0.05 * 2.0_f32.powi(23).log10());
    assert!((top - expected).abs() < 1e-5, "top={} expected={}", top, expected);
    assert!((top - 0.5538).abs() < 1e-3);

    let centered = RayTracer::new(
        AcousticSettingsBuilder::default()
            .band_frequency(BandFrequencyMapping::Center)
            .build()
            .unwrap(),
    );
    let specular = &centered.generate_reflection_rays(&geometry, &ray, &hit)[0];
    let f = specular.frequency_bands.bands()[23].center_frequency();
    let expected = 1.0 - (0.1 + 0.05 * (f / 100.0).log10());
    assert!((specular.frequency_bands.value(23).unwrap() - expected).abs() < 1e-5);
}

#[test]
fn test_dense_zone_clamps_top_band_transmission() {
    let geometry = geometry_with_zone(Zone::new(0.4, 0.0, 0.6, 1.0, 10.0));
    let ray = Ray::new(Vec2::new(0.0, 0.5), Vec2::X);

    let tracer = RayTracer::default();
    let hit = tracer.trace_ray(&geometry, &ray);
    let values = tracer.generate_reflection_rays(&geometry, &ray, &hit)[0]
        .frequency_bands
        .values();
    assert!((values[23] - 0.1).abs() < 1e-6, "values={:?}", values);

    let centered = RayTracer::new(
        AcousticSettingsBuilder::default()
            .band_frequency(BandFrequencyMapping::Center)
            .build()
            .unwrap(),
    );
    let values = centered.generate_reflection_rays(&geometry, &ray, &hit)[0]
        .frequency_bands
        .values();
    assert!(values[23] > 0.2, "values={:?}", values);
}

// ==================================
// 4. Cache de rayons
// ==================================

#[test]
fn test_rebuild_terminates_within_cap_for_random_geometries() {
    let settings = AcousticSettings::default();
    let tracer = RayTracer::new(settings.clone());
    let per_mic_cap = 1 + settings.max_reflections() * settings.rays_per_reflection();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..25 {
        let mut geometry = ChamberGeometry::default();
        geometry.set_speaker_position(rng.random(), rng.random());
        for mic in 0..NUM_MICROPHONES {
            geometry.set_microphone_position(mic, rng.random(), rng.random());
        }
        for _ in 0..rng.random_range(0..6) {
            geometry.zones.push(Zone::new(
                rng.random(),
                rng.random(),
                rng.random(),
                rng.random(),
                rng.random_range(0.1..10.0),
            ));
        }

        let rays = tracer.build_ray_cache(&geometry);
        assert!(rays.len() >= NUM_MICROPHONES);
        assert!(rays.len() <= NUM_MICROPHONES * per_mic_cap, "{} rays", rays.len());
        for ray in &rays {
            assert!(ray.intensity <= 1.0);
            assert!(ray.intensity.is_finite() && ray.distance.is_finite());
        }
    }
}

#[test]
fn test_cached_rays_are_significant_except_primaries() {
    let tracer = RayTracer::default();
    let geometry = ChamberGeometry::default();
    let rays = tracer.build_ray_cache(&geometry);
    let threshold = tracer.settings().significance_threshold();

    let primaries = rays.iter().filter(|r| r.bounce_count == 0).count();
    assert_eq!(primaries, NUM_MICROPHONES);
    assert!(rays.iter().all(|r| r.intensity > threshold));
}

#[test]
fn test_reflection_cap_is_configurable() {
    let settings = AcousticSettingsBuilder::default().max_reflections(0).build().unwrap();
    let tracer = RayTracer::new(settings);
    let rays = tracer.build_ray_cache(&ChamberGeometry::default());
    assert_eq!(rays.len(), NUM_MICROPHONES);
}
