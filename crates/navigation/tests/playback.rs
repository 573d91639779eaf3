use glam::{Quat, Vec3};
use navigation::{
    ControlPoint, Curve, NavigatorPhase, PathNavigator, Pose, SegmentLengthTable, SpiralParams,
    StableUp,
};

fn orbit_points() -> Vec<ControlPoint> {
    vec![
        ControlPoint::from_euler_degrees(Vec3::new(10.0, 2.0, 0.0), Vec3::new(0.0, 90.0, 0.0), 0.0),
        ControlPoint::from_euler_degrees(Vec3::new(0.0, 4.0, 10.0), Vec3::new(10.0, 0.0, 0.0), 5.0),
        ControlPoint::from_euler_degrees(Vec3::new(-10.0, 2.0, 0.0), Vec3::new(0.0, -90.0, 0.0), 0.0),
        ControlPoint::from_euler_degrees(Vec3::new(0.0, 0.0, -10.0), Vec3::new(-10.0, 180.0, 0.0), 0.0),
        ControlPoint::from_euler_degrees(Vec3::new(10.0, 2.0, 0.0), Vec3::new(0.0, 90.0, 0.0), 0.0),
    ]
}

fn run(nav: &mut PathNavigator, dt: f32) -> Vec<Pose> {
    let mut poses = Vec::new();
    while let Some(pose) = nav.tick(dt) {
        poses.push(pose);
        assert!(poses.len() < 100_000, "navigator never finished");
    }
    poses
}

#[test]
fn spline_playback_is_deterministic() {
    let curve = Curve::CatmullRom {
        points: orbit_points(),
    };
    let mut a = PathNavigator::new(curve.clone(), 4.0);
    let mut b = PathNavigator::new(curve, 4.0);
    a.trigger().unwrap();
    b.trigger().unwrap();
    let pa = run(&mut a, 1.0 / 60.0);
    let pb = run(&mut b, 1.0 / 60.0);
    assert!(!pa.is_empty());
    assert_eq!(pa, pb);
}

#[test]
fn playback_ends_exactly_when_path_is_covered() {
    let curve = Curve::CatmullRom {
        points: orbit_points(),
    };
    let mut nav = PathNavigator::new(curve, 7.5);
    nav.trigger().unwrap();
    let total = nav.total();
    loop {
        let before = nav.state();
        let pose = nav.tick(1.0 / 30.0);
        let after = nav.state();
        match pose {
            Some(_) => {
                assert_eq!(after.phase, NavigatorPhase::Moving);
                assert!(after.traveled < total);
            }
            None => {
                assert_eq!(before.phase, NavigatorPhase::Moving);
                assert_eq!(after.phase, NavigatorPhase::Idle);
                assert!(after.traveled >= total);
                break;
            }
        }
    }
}

#[test]
fn retrigger_restarts_from_the_beginning() {
    let curve = Curve::CatmullRom {
        points: orbit_points(),
    };
    let mut nav = PathNavigator::new(curve, 3.0);
    nav.trigger().unwrap();
    let first = nav.tick(0.1).unwrap();
    for _ in 0..20 {
        nav.tick(0.1);
    }
    nav.trigger().unwrap();
    assert_eq!(nav.state().traveled, 0.0);
    let again = nav.tick(0.1).unwrap();
    assert_eq!(first, again);
}

#[test]
fn great_circle_playback_stays_on_sphere() {
    let center = Vec3::new(0.0, 1.0, 0.0);
    let radius = 6.0;
    let curve = Curve::GreatCircle {
        points: vec![
            center + Vec3::new(radius, 0.0, 0.0),
            center + Vec3::new(0.0, radius, 0.0),
            center + Vec3::new(0.0, 0.0, radius),
            center + Vec3::new(-radius, 0.0, 0.0),
        ],
        center,
    };
    let mut nav = PathNavigator::new(curve, 5.0);
    nav.trigger().unwrap();
    let poses = run(&mut nav, 1.0 / 60.0);
    assert!(poses.len() > 100);
    for pose in poses {
        let r = (pose.position - center).length();
        assert!((r - radius).abs() < 1e-3, "radius {r}");
    }
}

#[test]
fn arc_length_lookup_covers_both_ends() {
    let curve = Curve::CatmullRom {
        points: orbit_points(),
    };
    let table = SegmentLengthTable::for_curve(&curve);
    assert_eq!(table.lookup(0.0), (0, 0.0));
    assert_eq!(table.lookup(table.total()), (table.segment_count() - 1, 1.0));
}

#[test]
fn spiral_radius_decays() {
    let spiral = SpiralParams {
        start_radius: 12.0,
        decay_rate: 0.8,
        total_turns: 3.0,
        tilt_degrees: 0.0,
    };
    let curve = Curve::Spiral(spiral);
    assert!((curve.position(0, 0.0) - Vec3::new(0.0, 0.0, 12.0)).length() < 1e-5);
    let expected = 12.0 * (-0.8f32).exp();
    assert!((curve.position(0, 1.0).length() - expected).abs() < 1e-4);
}

#[test]
fn spiral_look_at_origin_never_flips_up() {
    let curve = Curve::Spiral(SpiralParams {
        start_radius: 20.0,
        decay_rate: 0.5,
        total_turns: 5.0,
        tilt_degrees: 25.0,
    });
    let mut nav = PathNavigator::new(curve, 30.0).with_look_at(Some(Vec3::ZERO));
    nav.trigger().unwrap();
    let poses = run(&mut nav, 1.0 / 60.0);
    assert!(poses.len() > 100);
    for pair in poses.windows(2) {
        assert!(pair[0].up().dot(pair[1].up()) > 0.0);
    }
}

#[test]
fn stable_up_survives_forward_through_the_pole() {
    let mut stable = StableUp::default();
    let mut prev = stable.current();
    for i in 0..=180 {
        let angle = (i as f32).to_radians();
        let forward = Quat::from_rotation_x(angle) * Vec3::NEG_Z;
        let up = stable.update(forward, 1.0 / 60.0);
        assert!(up.is_finite());
        assert!(prev.dot(up) > 0.0, "up flipped at step {i}");
        prev = up;
    }
}
