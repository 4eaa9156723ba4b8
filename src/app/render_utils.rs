use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::kg::NodeKind;

pub(super) fn kind_color(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Organization => Color32::from_rgb(86, 156, 214),
        NodeKind::Event => Color32::from_rgb(197, 134, 192),
        NodeKind::Location => Color32::from_rgb(78, 201, 176),
        NodeKind::Person => Color32::from_rgb(220, 170, 80),
        NodeKind::Document => Color32::from_rgb(150, 150, 160),
        NodeKind::TextUnit => Color32::from_rgb(120, 130, 180),
        NodeKind::Community => Color32::from_rgb(110, 190, 110),
        NodeKind::Claim => Color32::from_rgb(214, 110, 110),
        NodeKind::Default => Color32::from_rgb(160, 170, 180),
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(18, 21, 27));

    let step = (64.0 * zoom.clamp(0.5, 1.6)).max(24.0);
    let origin = rect.center() + pan;
    let grid = Stroke::new(1.0, Color32::from_rgba_unmultiplied(55, 64, 76, 60));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], grid);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], grid);
        y += step;
    }
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;
    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn point_segment_distance(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return start.distance(point);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    (start + segment * t).distance(point)
}

fn normalize_log(value: usize, max: usize) -> f32 {
    let max = (max.max(1) as f32).ln_1p();
    if max <= f32::EPSILON {
        return 0.0;
    }
    ((value as f32).ln_1p() / max).clamp(0.0, 1.0)
}

/// Degree-scaled base radius in world-independent units.
pub(super) fn node_radius(degree: usize, max_degree: usize) -> f32 {
    5.0 + (normalize_log(degree, max_degree) * 18.0)
}
