//! Vector overlays drawn on top of the base map using tiny-skia.

use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform,
};

use genmap_common::LatLng;

use crate::mercator::destination_point;
use crate::staticmap::Viewport;
use crate::style::{AreaStyle, LineStyle, MarkerStyle};

/// Vertices used to approximate a full geodesic circle.
const CIRCLE_SEGMENTS: usize = 180;

/// An object placed on the map.
#[derive(Debug, Clone)]
pub enum MapObject {
    /// Map pin whose tip sits on the position.
    Marker {
        position: LatLng,
        style: MarkerStyle,
    },
    /// Polyline through the given positions.
    Path {
        points: Vec<LatLng>,
        style: LineStyle,
    },
    /// Geodesic circle with a radius in meters.
    Circle {
        center: LatLng,
        radius_m: f64,
        style: AreaStyle,
    },
    /// Geodesic sector sweeping clockwise from `start_deg`.
    Sector {
        center: LatLng,
        radius_m: f64,
        start_deg: f64,
        sweep_deg: f64,
        style: AreaStyle,
    },
}

impl MapObject {
    /// A representative position, used to center a map with no explicit center.
    pub fn anchor(&self) -> Option<LatLng> {
        match self {
            MapObject::Marker { position, .. } => Some(*position),
            MapObject::Path { points, .. } => points.first().copied(),
            MapObject::Circle { center, .. } | MapObject::Sector { center, .. } => Some(*center),
        }
    }

    /// Draw the object onto the pixmap.
    pub fn draw(&self, pixmap: &mut Pixmap, viewport: &Viewport) {
        match self {
            MapObject::Marker { position, style } => {
                let (x, y) = viewport.project(position);
                draw_marker(pixmap, x, y, style);
            }
            MapObject::Path { points, style } => {
                let projected: Vec<(f32, f32)> =
                    points.iter().map(|p| viewport.project(p)).collect();
                draw_polyline(pixmap, &projected, style);
            }
            MapObject::Circle {
                center,
                radius_m,
                style,
            } => {
                let ring: Vec<(f32, f32)> = (0..CIRCLE_SEGMENTS)
                    .map(|i| {
                        let bearing = i as f64 * 360.0 / CIRCLE_SEGMENTS as f64;
                        viewport.project(&destination_point(*center, bearing, *radius_m))
                    })
                    .collect();
                draw_area(pixmap, &ring, style);
            }
            MapObject::Sector {
                center,
                radius_m,
                start_deg,
                sweep_deg,
                style,
            } => {
                let steps = ((sweep_deg / 360.0) * CIRCLE_SEGMENTS as f64).ceil().max(2.0) as usize;
                let mut ring = Vec::with_capacity(steps + 2);
                ring.push(viewport.project(center));
                for i in 0..=steps {
                    let bearing = start_deg + sweep_deg * i as f64 / steps as f64;
                    ring.push(viewport.project(&destination_point(*center, bearing, *radius_m)));
                }
                draw_area(pixmap, &ring, style);
            }
        }
    }
}

fn paint_for(color: crate::style::Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn draw_polyline(pixmap: &mut Pixmap, points: &[(f32, f32)], style: &LineStyle) {
    if points.len() < 2 {
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(points[0].0, points[0].1);
    for &(x, y) in &points[1..] {
        pb.line_to(x, y);
    }

    let mut stroke = Stroke::default();
    stroke.width = style.width;
    stroke.line_cap = LineCap::Round;
    stroke.line_join = LineJoin::Round;
    if style.dashed {
        stroke.dash = StrokeDash::new(vec![style.width * 4.0, style.width * 3.0], 0.0);
    }

    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, &paint_for(style.color), &stroke, Transform::identity(), None);
    }
}

fn draw_area(pixmap: &mut Pixmap, ring: &[(f32, f32)], style: &AreaStyle) {
    if ring.len() < 3 {
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(ring[0].0, ring[0].1);
    for &(x, y) in &ring[1..] {
        pb.line_to(x, y);
    }
    pb.close();

    let Some(path) = pb.finish() else {
        return;
    };

    pixmap.fill_path(
        &path,
        &paint_for(style.fill),
        FillRule::Winding,
        Transform::identity(),
        None,
    );

    let mut stroke = Stroke::default();
    stroke.width = style.stroke_width;
    stroke.line_join = LineJoin::Round;
    pixmap.stroke_path(&path, &paint_for(style.stroke), &stroke, Transform::identity(), None);
}

/// Pin with its tip at (x, y): a round head joined to the tip by a wedge.
fn draw_marker(pixmap: &mut Pixmap, x: f32, y: f32, style: &MarkerStyle) {
    let size = style.size;
    let radius = size * 0.5;
    let head_y = y - size;

    let mut pb = PathBuilder::new();
    pb.move_to(x, y);
    pb.line_to(x - radius * 0.8, head_y + radius * 0.6);
    pb.line_to(x + radius * 0.8, head_y + radius * 0.6);
    pb.close();
    pb.push_circle(x, head_y, radius);

    let Some(path) = pb.finish() else {
        return;
    };

    let paint = paint_for(style.color);
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

    let mut outline = Stroke::default();
    outline.width = 1.0;
    let mut outline_paint = Paint::default();
    outline_paint.set_color_rgba8(0, 0, 0, 160);
    outline_paint.anti_alias = true;
    pixmap.stroke_path(&path, &outline_paint, &outline, Transform::identity(), None);

    if let Some(dot) = PathBuilder::from_circle(x, head_y, radius * 0.35) {
        let mut dot_paint = Paint::default();
        dot_paint.set_color_rgba8(255, 255, 255, 255);
        dot_paint.anti_alias = true;
        pixmap.fill_path(&dot, &dot_paint, FillRule::Winding, Transform::identity(), None);
    }
}
