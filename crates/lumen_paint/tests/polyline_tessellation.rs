//! Polyline building and tessellation, end to end

use std::f32::consts::TAU;

use lumen_core::{Color, Point};
use lumen_paint::{fill_convex, stroke, CornerFlags, Gradient, Mesh, Polyline};

fn regular_polygon(n: usize, radius: f32) -> Vec<Point> {
    (0..n)
        .map(|i| Point::from_angle(TAU * i as f32 / n as f32) * radius + Point::splat(50.0))
        .collect()
}

#[test]
fn closed_ngon_solid_stroke_has_two_triangles_per_edge() {
    for n in [3, 5, 8, 31] {
        let pts = regular_polygon(n, 20.0);
        let mut mesh = Mesh::new();
        stroke(&pts, true, Color::WHITE, 1.0, 0.0, &mut mesh);
        assert_eq!(mesh.vertices.len(), n * 4);
        assert_eq!(mesh.indices.len(), n * 2 * 3);
    }
}

#[test]
fn arc_to_fast_full_circle_has_thirteen_points() {
    let center = Point::new(10.0, 20.0);
    let mut p = Polyline::new();
    p.arc_to_fast(center, 5.0, 0, 12);
    assert_eq!(p.len(), 13);
    assert_eq!(p.points()[0], p.points()[12]);
    assert_eq!(p.points()[0], Point::new(15.0, 20.0));
}

#[test]
fn adaptive_bezier_flat_curve_is_short() {
    let mut p = Polyline::new();
    p.line_to(Point::ZERO);
    p.bezier_curve_to(
        Point::new(10.0, 0.0),
        Point::new(20.0, 0.0),
        Point::new(30.0, 0.0),
        0,
    );
    assert!(p.len() <= 2);
    assert_eq!(p.last(), Some(Point::new(30.0, 0.0)));
}

#[test]
fn adaptive_bezier_sharp_curve_is_bounded() {
    let mut p = Polyline::new();
    p.line_to(Point::ZERO);
    p.bezier_curve_to(
        Point::new(0.0, 400.0),
        Point::new(400.0, 400.0),
        Point::new(400.0, 0.0),
        0,
    );
    assert!(p.len() > 2);
    assert!(p.len() <= 1 + (1 << 10));
}

#[test]
fn uniform_bezier_sampling() {
    let mut p = Polyline::new();
    p.line_to(Point::ZERO);
    p.bezier_curve_to(
        Point::new(0.0, 10.0),
        Point::new(10.0, 10.0),
        Point::new(10.0, 0.0),
        8,
    );
    assert_eq!(p.len(), 9);
}

#[test]
fn quadratic_curve_matches_its_control_polygon() {
    let mut p = Polyline::new();
    p.line_to(Point::ZERO)
        .quad_curve_to(Point::new(10.0, 10.0), Point::new(20.0, 0.0), 4);
    assert_eq!(p.len(), 5);
    assert_eq!(p.last(), Some(Point::new(20.0, 0.0)));

    // B(0.5) = 0.25 * start + 0.5 * cp + 0.25 * end
    let mid = p.points()[2];
    assert!((mid.x - 10.0).abs() < 1e-4, "{mid:?}");
    assert!((mid.y - 5.0).abs() < 1e-4, "{mid:?}");
}

#[test]
fn curves_on_an_empty_polyline_start_at_the_control_point() {
    let mut cubic = Polyline::new();
    cubic.bezier_curve_to(
        Point::new(1.0, 2.0),
        Point::new(5.0, 5.0),
        Point::new(9.0, 0.0),
        3,
    );
    assert_eq!(cubic.points()[0], Point::new(1.0, 2.0));
    assert_eq!(cubic.len(), 4);

    let mut quad = Polyline::new();
    quad.quad_curve_to(Point::new(3.0, 3.0), Point::new(6.0, 0.0), 2);
    assert_eq!(quad.points()[0], Point::new(3.0, 3.0));
    assert_eq!(quad.last(), Some(Point::new(6.0, 0.0)));
}

#[test]
fn rounded_rect_fills_with_fringe() {
    let mut p = Polyline::new();
    p.rectangle(Point::ZERO, Point::new(40.0, 20.0), 6.0, CornerFlags::TOP);
    assert!(p.is_convex());

    let mut mesh = Mesh::new();
    fill_convex(p.points(), Gradient::solid(Color::BLUE), 1.0, &mut mesh);
    assert_eq!(mesh.vertices.len(), p.len() * 2);
    assert!(mesh.has_translucency());
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
}

#[test]
fn meshes_accumulate() {
    let square = [
        Point::ZERO,
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    let mut mesh = Mesh::new();
    fill_convex(&square, Gradient::solid(Color::WHITE), 0.0, &mut mesh);
    fill_convex(&square, Gradient::solid(Color::WHITE), 0.0, &mut mesh);
    assert_eq!(mesh.indices[6..], [4, 5, 6, 4, 6, 7]);
}
