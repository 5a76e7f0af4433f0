//! Ray traces against boxes, their plane volumes and chamfered volumes

use level_collision::foundation::logging;
use level_collision::prelude::*;
use approx::assert_relative_eq;

fn unit_box() -> BBox {
    BBox::from_scalars(0.0, 0.0, 0.0, 10.0, 10.0, 10.0)
        .unwrap()
        .with_contents(CollideType::SOLID)
}

fn assert_same_hit(start: &Vec3, delta: &Vec3, bbox: Option<Hit<'_>>, volume: Option<Hit<'_>>) {
    match (bbox, volume) {
        (None, None) => {}
        (Some(a), Some(b)) => {
            assert_eq!(a.distance, b.distance, "distance for {start:?} + {delta:?}");
            assert_eq!(a.impact, b.impact, "impact for {start:?} + {delta:?}");
            assert_eq!(a.normal, b.normal, "normal for {start:?} + {delta:?}");
            assert_eq!(a.direction, b.direction);
        }
        (a, b) => panic!("{start:?} + {delta:?}: box gave {a:?}, volume gave {b:?}"),
    }
}

#[test]
fn test_box_and_its_volume_agree() {
    logging::init();
    let boxes = [
        unit_box(),
        BBox::from_scalars(-8.0, -16.0, 0.0, 8.0, 16.0, 4.0).unwrap(),
        // Flat on Z.
        BBox::from_scalars(0.0, 0.0, 5.0, 10.0, 10.0, 5.0).unwrap(),
    ];
    let coords = [-15.0, -5.0, 0.0, 5.0, 10.0, 15.0, 25.0];
    let steps = [-30.0, -7.0, 0.0, 7.0, 30.0];

    let mut hits = 0;
    for bbox in &boxes {
        let volume = bbox.as_volume();
        for &x in &coords {
            for &y in &coords {
                for &z in &coords {
                    let start = Vec3::new(x, y, z);
                    for &dx in &steps {
                        for &dy in &steps {
                            for &dz in &steps {
                                let delta = Vec3::new(dx, dy, dz);
                                let box_hit = bbox.trace_ray(&start, &delta);
                                let volume_hit = volume.trace_ray(&start, &delta);
                                hits += usize::from(box_hit.is_some());
                                assert_same_hit(&start, &delta, box_hit, volume_hit);
                            }
                        }
                    }
                }
            }
        }
    }
    assert!(hits > 1000, "only {hits} hits, the grid should cross the boxes often");
}

#[test]
fn test_box_scenarios() {
    let bbox = unit_box();

    let hit = bbox.trace_ray(&Vec3::new(-5.0, 5.0, 5.0), &Vec3::new(20.0, 0.0, 0.0)).unwrap();
    assert_eq!(hit.impact, Vec3::new(0.0, 5.0, 5.0));
    assert_eq!(hit.normal, Vec3::new(-1.0, 0.0, 0.0));
    assert_relative_eq!(hit.distance, 5.0);
    assert_eq!(hit.direction, Vec3::x());

    let start = Vec3::new(5.0, 5.0, 5.0);
    let hit = bbox.trace_ray(&start, &Vec3::new(20.0, 0.0, 0.0)).unwrap();
    assert_eq!(hit.distance, 0.0);
    assert_eq!(hit.impact, start);
    assert_eq!(hit.normal, -hit.direction);

    assert!(bbox.trace_ray(&Vec3::new(-5.0, 50.0, 50.0), &Vec3::new(20.0, 0.0, 0.0)).is_none());
}

#[test]
fn test_edge_tie_goes_to_later_axis() {
    // Entering X and Y at the same instant. The Y face winning is just the
    // order the axes are checked in, but both shapes must pick the same one.
    let bbox = unit_box();
    let start = Vec3::new(-5.0, -5.0, 5.0);
    let delta = Vec3::new(20.0, 20.0, 0.0);
    let hit = bbox.trace_ray(&start, &delta).unwrap();
    assert_eq!(hit.normal, Vec3::new(0.0, -1.0, 0.0));
    assert_eq!(hit.impact, Vec3::new(0.0, 0.0, 5.0));

    let volume = bbox.as_volume();
    let hit = volume.trace_ray(&start, &delta).unwrap();
    assert_eq!(hit.normal, Vec3::new(0.0, -1.0, 0.0));
}

#[test]
fn test_near_edge_rays_agree() {
    // Entering X and Y a hair apart, on either side of the edge.
    let bbox = unit_box();
    let volume = bbox.as_volume();
    let delta = Vec3::new(10.0, 10.0, 0.0);

    let start = Vec3::new(-5.0, -5.000_000_1, 5.0);
    let hit = bbox.trace_ray(&start, &delta).unwrap();
    assert_eq!(hit.normal, Vec3::new(0.0, -1.0, 0.0));
    assert!(hit.impact.x > 0.0);
    assert_same_hit(&start, &delta, Some(hit), volume.trace_ray(&start, &delta));

    let start = Vec3::new(-5.000_000_5, -5.0, 5.0);
    let hit = bbox.trace_ray(&start, &delta).unwrap();
    assert_eq!(hit.normal, Vec3::new(-1.0, 0.0, 0.0));
    assert_same_hit(&start, &delta, Some(hit), volume.trace_ray(&start, &delta));

    // Both impacts lie on the box itself.
    for start in [Vec3::new(-5.0, -5.000_000_1, 5.0), Vec3::new(-5.000_000_5, -5.0, 5.0)] {
        let hit = volume.trace_ray(&start, &delta).unwrap();
        assert!(hit.impact.x > -1e-12 && hit.impact.y > -1e-12, "{:?} is outside the box", hit.impact);
    }
}

#[test]
fn test_chamfered_corner() {
    let bbox = unit_box();
    let mut planes = bbox.as_volume().planes().to_vec();
    // Cut off the corner at (10, 10, 10).
    planes.push(Plane::from_point(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(10.0, 10.0, 5.0)).unwrap());
    let volume = Volume::new(bbox.clone(), planes);

    // Straight at the missing corner along the diagonal.
    let start = Vec3::new(20.0, 20.0, 20.0);
    let delta = Vec3::new(-15.0, -15.0, -15.0);
    let box_hit = bbox.trace_ray(&start, &delta).unwrap();
    assert_relative_eq!(box_hit.impact, Vec3::new(10.0, 10.0, 10.0), epsilon = 1e-9);

    let hit = volume.trace_ray(&start, &delta).unwrap();
    let third = 1.0 / 3.0_f64.sqrt();
    assert_relative_eq!(hit.normal, Vec3::new(third, third, third), epsilon = 1e-12);
    // The chamfer passes through x + y + z = 25.
    assert_relative_eq!(hit.impact.sum(), 25.0, epsilon = 1e-9);
    assert!(hit.distance > box_hit.distance);
    assert!(matches!(hit.target, HitTarget::Volume(_)));

    // Into the cut region, stopping short of the chamfer.
    let start = Vec3::new(20.0, 9.0, 9.0);
    let delta = Vec3::new(-12.0, 0.0, 0.0);
    assert!(bbox.trace_ray(&start, &delta).is_some());
    assert!(volume.trace_ray(&start, &delta).is_none());
}

#[test]
fn test_dispatcher_prefers_nearest_shape() {
    let near = unit_box().with_name("near");
    let far = BBox::from_scalars(20.0, 0.0, 0.0, 30.0, 10.0, 10.0)
        .unwrap()
        .with_name("far")
        .as_volume();
    let shapes = [Collider::from(far), Collider::from(near)];
    let hit = trace_ray(&Vec3::new(-5.0, 5.0, 5.0), &Vec3::new(50.0, 0.0, 0.0), &shapes).unwrap();
    assert_eq!(hit.target.bbox().name(), "near");

    let hit = trace_ray(&Vec3::new(45.0, 5.0, 5.0), &Vec3::new(-50.0, 0.0, 0.0), &shapes).unwrap();
    assert_eq!(hit.target.bbox().name(), "far");
    assert_eq!(hit.normal, Vec3::x());
}
