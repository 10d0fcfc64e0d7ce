use chamber_sim::acoustic_engine::zone::{Zone, MAX_DENSITY, MIN_DENSITY};
use chamber_sim::ChamberController;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_bounds_are_ordered_after_any_update() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut zone = Zone::centered(1.0);

    for _ in 0..500 {
        let (x1, y1, x2, y2) = (
            rng.random_range(-0.5..1.5),
            rng.random_range(-0.5..1.5),
            rng.random_range(-0.5..1.5),
            rng.random_range(-0.5..1.5),
        );
        zone.set_bounds(x1, y1, x2, y2);
        assert!(zone.x1() <= zone.x2(), "{:?}", zone);
        assert!(zone.y1() <= zone.y2(), "{:?}", zone);
        for v in [zone.x1(), zone.y1(), zone.x2(), zone.y2()] {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}

#[test]
fn test_density_is_clamped() {
    let mut zone = Zone::centered(1.0);
    zone.set_density(100.0);
    assert_eq!(zone.density(), MAX_DENSITY);
    zone.set_density(0.0);
    assert_eq!(zone.density(), MIN_DENSITY);
}

#[test]
fn test_controller_zone_lifecycle() {
    let controller = ChamberController::default();
    controller.set_default_density(3.0);

    let index = controller.add_zone();
    assert_eq!(index, 0);
    let zone = controller.zone(index).unwrap();
    assert_eq!((zone.x1(), zone.y1(), zone.x2(), zone.y2()), (0.25, 0.25, 0.75, 0.75));
    assert_eq!(zone.density(), 3.0);

    assert!(controller.set_zone_bounds(index, 0.9, 0.8, 0.1, 0.2));
    let zone = controller.zone(index).unwrap();
    assert_eq!((zone.x1(), zone.y1(), zone.x2(), zone.y2()), (0.1, 0.2, 0.9, 0.8));

    assert!(controller.remove_zone(index));
    assert!(controller.zone(index).is_none());
    assert!(!controller.set_zone_bounds(index, 0.0, 0.0, 1.0, 1.0));
}
