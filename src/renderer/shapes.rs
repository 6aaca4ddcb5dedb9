//! Triangle tessellation for fallback geometry
//!
//! Every function appends to a caller-owned vertex list so the compositor can
//! reuse one scratch buffer per frame.

use glam::Vec2;
use std::f32::consts::{FRAC_PI_4, SQRT_2, TAU};

use super::batch::StarDecoration;
use super::vertex::Vertex;
use crate::color::Color;
use crate::sim::SwirlPool;
use crate::{rotate_deg, trns};

/// Segment count that keeps a circle of `radius` looking round
pub fn circle_vertices(radius: f32) -> u32 {
    11 + (radius.max(0.0) * 4.0 / 20.0) as u32
}

/// Round up to a multiple of 4 so a star's tips land on vertices
pub fn mul4(value: u32) -> u32 {
    value.div_ceil(4) * 4
}

/// Distance from center to the edge of a rounded four point star along
/// `theta_deg`, 1 at the tips and `sqrt(2) - 1` between them
pub fn circle_star_point(theta_deg: f32) -> f32 {
    let theta = theta_deg.rem_euclid(90.0).to_radians();
    let b = -2.0 * SQRT_2 * (theta - FRAC_PI_4).cos();
    (-b - (b * b - 4.0).max(0.0).sqrt()) / 2.0
}

fn ring_point(center: Vec2, radius: f32, i: u32, segments: u32) -> Vec2 {
    let theta = (i as f32 / segments as f32) * TAU;
    center + Vec2::new(theta.cos(), theta.sin()) * radius
}

/// Filled circle
pub fn circle(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: Color, segments: u32) {
    radial_gradient(out, center, radius, color, color, segments);
}

/// Triangle fan from `inner` at the center to `outer` at `radius`
pub fn radial_gradient(
    out: &mut Vec<Vertex>,
    center: Vec2,
    radius: f32,
    inner: Color,
    outer: Color,
    segments: u32,
) {
    if radius <= 0.0 || segments < 3 {
        return;
    }
    out.reserve(segments as usize * 3);
    for i in 0..segments {
        out.push(Vertex::at(center, inner));
        out.push(Vertex::at(ring_point(center, radius, i, segments), outer));
        out.push(Vertex::at(ring_point(center, radius, i + 1, segments), outer));
    }
}

/// Annulus from `inner_radius` to `outer_radius`, fading `inner` to `outer`
pub fn ring_gradient(
    out: &mut Vec<Vertex>,
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    inner: Color,
    outer: Color,
    segments: u32,
) {
    let inner_radius = inner_radius.max(0.0);
    if outer_radius <= inner_radius || segments < 3 {
        return;
    }
    out.reserve(segments as usize * 6);
    for i in 0..segments {
        let a_in = Vertex::at(ring_point(center, inner_radius, i, segments), inner);
        let b_in = Vertex::at(ring_point(center, inner_radius, i + 1, segments), inner);
        let a_out = Vertex::at(ring_point(center, outer_radius, i, segments), outer);
        let b_out = Vertex::at(ring_point(center, outer_radius, i + 1, segments), outer);
        out.extend_from_slice(&[a_in, b_in, b_out, a_in, b_out, a_out]);
    }
}

/// Rounded four point star, `in_color` at the center fading to `out_color`
pub fn star(out: &mut Vec<Vertex>, star: &StarDecoration) {
    let sides = mul4(circle_vertices(star.width + star.height));
    let space = 360.0 / sides as f32;
    let scale = Vec2::new(star.width, star.height);
    let center_color = Color::from_rgba8888(star.in_color);
    let edge_color = Color::from_rgba8888(star.out_color);

    let edge = |t: f32| {
        star.pos + rotate_deg(trns(t, circle_star_point(t)) * scale, star.angle_offset)
    };

    out.reserve(sides as usize * 3);
    for i in 0..sides {
        let t1 = i as f32 * space;
        let t2 = (i + 1) as f32 * space;
        out.push(Vertex::at(star.pos, center_color));
        out.push(Vertex::at(edge(t1), edge_color));
        out.push(Vertex::at(edge(t2), edge_color));
    }
}

/// Ribbon through `points` (oldest first), tapering from the old end up to
/// `width` at the head
pub fn trail_ribbon<I>(out: &mut Vec<Vertex>, points: I, width: f32, color: Color)
where
    I: ExactSizeIterator<Item = Vec2>,
{
    let n = points.len();
    if n < 2 || width <= 0.0 {
        return;
    }

    let mut points = points.enumerate();
    let Some((_, mut prev)) = points.next() else {
        return;
    };
    let mut prev_width = width / n as f32;

    for (i, p) in points {
        let w = width * (i + 1) as f32 / n as f32;
        let dir = (p - prev).normalize_or_zero();
        let perp = Vec2::new(-dir.y, dir.x);

        let a1 = prev + perp * prev_width;
        let b1 = prev - perp * prev_width;
        let a2 = p + perp * w;
        let b2 = p - perp * w;

        out.push(Vertex::at(a1, color));
        out.push(Vertex::at(b1, color));
        out.push(Vertex::at(a2, color));

        out.push(Vertex::at(a2, color));
        out.push(Vertex::at(b1, color));
        out.push(Vertex::at(b2, color));

        prev = p;
        prev_width = w;
    }
}

/// Round cap over the trail head
pub fn trail_cap(out: &mut Vec<Vertex>, head: Vec2, width: f32, color: Color) {
    circle(out, head, width, color, circle_vertices(width).max(8));
}

/// Ribbons and caps for every live swirl, using the style from the last
/// trail step
pub fn swirl_trails(out: &mut Vec<Vertex>, pool: &SwirlPool) {
    for particle in pool.iter() {
        let style = particle.style();
        let trail = particle.trail();
        let Some(head) = trail.head() else {
            continue;
        };
        trail_cap(out, head, style.width, style.color);
        trail_ribbon(out, trail.points(), style.width, style.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_point_extremes() {
        assert!((circle_star_point(0.0) - 1.0).abs() < 1e-4);
        assert!((circle_star_point(90.0) - 1.0).abs() < 1e-4);
        assert!((circle_star_point(45.0) - (SQRT_2 - 1.0)).abs() < 1e-4);
        assert!((circle_star_point(-45.0) - circle_star_point(45.0)).abs() < 1e-5);
    }

    #[test]
    fn test_mul4() {
        assert_eq!(mul4(11), 12);
        assert_eq!(mul4(12), 12);
        assert_eq!(mul4(13), 16);
    }

    #[test]
    fn test_circle_vertices_grows_with_radius() {
        assert_eq!(circle_vertices(0.0), 11);
        assert_eq!(circle_vertices(20.0), 15);
        assert_eq!(circle_vertices(-5.0), 11);
    }

    #[test]
    fn test_star_tips_reach_width_and_height() {
        let s = StarDecoration {
            pos: Vec2::new(10.0, 0.0),
            width: 8.0,
            height: 4.0,
            angle_offset: 0.0,
            in_color: Color::WHITE.to_rgba8888(),
            out_color: Color::CLEAR.to_rgba8888(),
        };
        let mut verts = Vec::new();
        star(&mut verts, &s);
        assert_eq!(verts.len() % 3, 0);
        assert_eq!((verts.len() / 3) % 4, 0);

        let max_x = verts.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        let max_y = verts.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert!((max_x - 18.0).abs() < 1e-3);
        assert!((max_y - 4.0).abs() < 1e-3);
        assert_eq!(verts[0].color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(verts[1].color[3], 0.0);
    }

    #[test]
    fn test_gradient_edges_use_outer_color() {
        let mut verts = Vec::new();
        radial_gradient(&mut verts, Vec2::ZERO, 5.0, Color::WHITE, Color::CLEAR, 12);
        assert_eq!(verts.len(), 36);
        for tri in verts.chunks(3) {
            assert_eq!(tri[0].pos(), Vec2::ZERO);
            assert!((tri[1].pos().length() - 5.0).abs() < 1e-4);
            assert_eq!(tri[2].color, Color::CLEAR.to_array());
        }
    }

    #[test]
    fn test_ring_leaves_the_hole_empty() {
        let mut verts = Vec::new();
        ring_gradient(&mut verts, Vec2::ZERO, 4.0, 16.0, Color::WHITE, Color::CLEAR, 12);
        assert_eq!(verts.len(), 72);
        for v in &verts {
            let r = v.pos().length();
            assert!(r > 4.0 - 1e-4 && r < 16.0 + 1e-4);
            if (r - 4.0).abs() < 1e-4 {
                assert_eq!(v.color, Color::WHITE.to_array());
            } else {
                assert_eq!(v.color, Color::CLEAR.to_array());
            }
        }

        verts.clear();
        ring_gradient(&mut verts, Vec2::ZERO, 8.0, 8.0, Color::WHITE, Color::CLEAR, 12);
        assert!(verts.is_empty());
    }

    #[test]
    fn test_ribbon_tapers_toward_tail() {
        let points = vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        let mut verts = Vec::new();
        trail_ribbon(&mut verts, points.into_iter(), 3.0, Color::WHITE);
        assert_eq!(verts.len(), 12);
        let tail_half = verts[0].position[1];
        let head_half = verts[11].position[1].abs();
        assert!((tail_half - 1.0).abs() < 1e-5);
        assert!((head_half - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_single_point_ribbon_is_empty() {
        let mut verts = Vec::new();
        trail_ribbon(&mut verts, std::iter::once(Vec2::ONE), 3.0, Color::WHITE);
        assert!(verts.is_empty());
    }
}
