use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, vec2};

use super::ViewModel;
use super::cluster::{self, CLUSTER_ZOOM_THRESHOLD, ClusterNode};
use super::filter;
use super::highlight::Element;
use super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, kind_color, node_radius,
    point_segment_distance, screen_to_world, segment_visible, world_to_screen,
};
use crate::util::short_label;

const LINK_PICK_DISTANCE: f32 = 6.0;
const LABEL_ZOOM: f32 = 1.2;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    fn handle_graph_pan(&mut self, response: &egui::Response, dragging_node: bool) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || (response.dragged_by(egui::PointerButton::Primary) && !dragging_node)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Advances the focus camera move: a proportional chase toward the
    /// element's position that lands exactly when the move duration elapses.
    fn apply_focus_camera(&mut self, ui: &Ui, now: f64) {
        let Some((focus, t)) = self.interaction.focus_progress(now) else {
            return;
        };
        let goal_zoom = focus.zoom;
        let goal_pan = -focus.target * goal_zoom;

        let dt = ui.ctx().input(|input| input.stable_dt).clamp(0.0, 0.1);
        let remaining = (super::highlight::FOCUS_MOVE_SECS as f32) * (1.0 - t);
        let alpha = if remaining <= f32::EPSILON {
            1.0
        } else {
            (dt / remaining).clamp(0.0, 1.0)
        };

        self.zoom += (goal_zoom - self.zoom) * alpha;
        self.pan += (goal_pan - self.pan) * alpha;
        ui.ctx().request_repaint();
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let now = ui.ctx().input(|input| input.time);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.apply_focus_camera(ui, now);

        let filtered = filter::apply(&self.current, self.flags, self.reveal.admitted());
        let lod = cluster::build_lod(&self.current, &filtered, self.zoom);

        let mut node_mask = vec![false; self.current.node_count()];
        for &index in &lod.singles {
            node_mask[index] = true;
        }
        let mut link_mask = vec![false; self.current.links.len()];
        for &index in &lod.link_indices {
            link_mask[index] = true;
        }

        let pan = self.pan;
        let zoom = self.zoom;
        let positions = self
            .current
            .nodes
            .iter()
            .map(|node| world_to_screen(rect, pan, zoom, node.pos))
            .collect::<Vec<_>>();
        let radii = (0..self.current.node_count())
            .map(|index| {
                (node_radius(self.current.degree(index), self.max_degree) * zoom.powf(0.40))
                    .clamp(2.5, 46.0)
            })
            .collect::<Vec<_>>();

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered_element = pointer.and_then(|pointer| {
            self.pick_element(&lod, &positions, &radii, rect, pointer)
        });
        let hovered_cluster = if hovered_element.is_none() {
            pointer.and_then(|pointer| pick_cluster(&lod.clusters, rect, pan, zoom, pointer))
        } else {
            None
        };

        if hovered_element.is_some() || hovered_cluster.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if hovered_element != self.interaction.hovered() {
            self.interaction.submit_hover(hovered_element, now);
        }
        if self
            .interaction
            .tick_hover(&self.current, &node_mask, &link_mask, now)
        {
            ui.ctx().request_repaint();
        }

        self.handle_clicks(&response, hovered_element, hovered_cluster.map(|index| &lod.clusters[index]));
        self.handle_node_drag(&response, hovered_element);
        let dragging_node = self.dragged_node.is_some();
        self.handle_graph_pan(&response, dragging_node);

        let highlight_active = !self.interaction.highlight.is_empty();
        let selection = self.interaction.selected.clone();
        let search_active = !self.search_hit_nodes.is_empty();
        let zoom_sqrt = zoom.sqrt();

        for &link_index in &lod.link_indices {
            let link = &self.current.links[link_index];
            let start = positions[link.source];
            let end = positions[link.target];
            if !segment_visible(rect, start, end, 2.5) {
                continue;
            }

            let is_highlighted = self.interaction.highlight.links.contains(&link_index);
            let is_selected = selection.as_ref().is_some_and(|selection| {
                selection.target == Element::Link(link_index)
                    || selection.linked_links.contains(&link_index)
            });

            let (width, color) = if is_selected {
                (
                    (2.6 * zoom_sqrt).clamp(1.4, 4.6),
                    Color32::from_rgb(245, 206, 93),
                )
            } else if is_highlighted {
                (
                    (2.2 * zoom_sqrt).clamp(1.2, 4.0),
                    Color32::from_rgb(241, 146, 94),
                )
            } else if highlight_active {
                (
                    (0.8 * zoom_sqrt).clamp(0.45, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 130),
                )
            } else {
                (
                    (1.1 * zoom_sqrt).clamp(0.55, 3.0),
                    Color32::from_rgba_unmultiplied(96, 104, 118, 170),
                )
            };
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        for cluster in &lod.clusters {
            let position = world_to_screen(rect, pan, zoom, cluster.pos);
            let radius = cluster_radius(cluster) * zoom.powf(0.40);
            if !circle_visible(rect, position, radius) {
                continue;
            }
            painter.circle_filled(
                position,
                radius,
                Color32::from_rgba_unmultiplied(96, 132, 176, 200),
            );
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(1.2, Color32::from_rgba_unmultiplied(170, 200, 230, 220)),
            );
            painter.text(
                position,
                Align2::CENTER_CENTER,
                cluster.members.len().to_string(),
                FontId::proportional(12.0),
                Color32::from_gray(240),
            );
        }

        for &index in &lod.singles {
            let position = positions[index];
            let radius = radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let node = &self.current.nodes[index];
            let is_hovered = hovered_element == Some(Element::Node(index));
            let is_highlighted = self.interaction.highlight.nodes.contains(&index);
            let is_selected = selection.as_ref().is_some_and(|selection| {
                selection.target == Element::Node(index)
            });
            let is_linked = selection
                .as_ref()
                .is_some_and(|selection| selection.linked_nodes.contains(&index));
            let is_search_hit = self.search_hit_nodes.contains(&index);

            let base = kind_color(node.kind);
            let color = if is_hovered {
                Color32::from_rgb(255, 164, 101)
            } else if is_selected {
                Color32::from_rgb(245, 206, 93)
            } else if is_highlighted || is_linked {
                blend_color(base, Color32::from_rgb(246, 137, 92), 0.55)
            } else if is_search_hit {
                blend_color(base, Color32::from_rgb(103, 196, 255), 0.65)
            } else if highlight_active || search_active {
                dim_color(base, 0.45)
            } else {
                base
            };

            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if is_selected { 2.2 } else { 1.0 },
                    Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                ),
            );
            if is_selected {
                painter.circle_stroke(
                    position,
                    radius + 4.0,
                    Stroke::new(1.4, Color32::from_rgba_unmultiplied(245, 206, 93, 150)),
                );
            }

            let should_label = is_hovered
                || is_selected
                || is_highlighted
                || is_search_hit
                || zoom > LABEL_ZOOM;
            if should_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_label(&node.name, 36),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(element) = hovered_element {
            let caption = match element {
                Element::Node(index) => {
                    let node = &self.current.nodes[index];
                    format!(
                        "{}  |  {}  |  degree {}",
                        short_label(&node.name, 48),
                        node.kind.label(),
                        self.current.degree(index)
                    )
                }
                Element::Link(index) => {
                    let link = &self.current.links[index];
                    format!(
                        "{} \u{2192} {}  |  {}",
                        short_label(&self.current.nodes[link.source].name, 24),
                        short_label(&self.current.nodes[link.target].name, 24),
                        short_label(&link.kind, 36),
                    )
                }
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                caption,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        } else if let Some(index) = hovered_cluster {
            let cluster = &lod.clusters[index];
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{} grouped nodes (click to zoom in)", cluster.members.len()),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }

    /// Nearest single node under the pointer wins, then the nearest link
    /// within the pick distance.
    fn pick_element(
        &self,
        lod: &cluster::LodView,
        positions: &[Pos2],
        radii: &[f32],
        rect: Rect,
        pointer: Pos2,
    ) -> Option<Element> {
        let node = lod
            .singles
            .iter()
            .filter_map(|&index| {
                if !circle_visible(rect, positions[index], radii[index]) {
                    return None;
                }
                let distance = positions[index].distance(pointer);
                (distance <= radii[index]).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((index, _)) = node {
            return Some(Element::Node(index));
        }

        lod.link_indices
            .iter()
            .filter_map(|&link_index| {
                let link = &self.current.links[link_index];
                let start = positions[link.source];
                let end = positions[link.target];
                if !segment_visible(rect, start, end, LINK_PICK_DISTANCE) {
                    return None;
                }
                let distance = point_segment_distance(pointer, start, end);
                (distance <= LINK_PICK_DISTANCE).then_some((link_index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| Element::Link(index))
    }

    fn handle_clicks(
        &mut self,
        response: &egui::Response,
        hovered: Option<Element>,
        hovered_cluster: Option<&ClusterNode>,
    ) {
        if !response.clicked_by(egui::PointerButton::Primary) {
            return;
        }

        match hovered {
            Some(Element::Node(index)) => self.interaction.select_node(&self.current, index),
            Some(Element::Link(index)) => self.interaction.select_link(&self.current, index),
            None => {
                if let Some(cluster) = hovered_cluster {
                    // Jump just past the detail threshold, centered on the
                    // cluster, so its members come apart.
                    self.zoom = CLUSTER_ZOOM_THRESHOLD * 1.2;
                    self.pan = -cluster.pos * self.zoom;
                } else {
                    self.interaction.clear_selection();
                }
            }
        }
    }

    fn handle_node_drag(&mut self, response: &egui::Response, hovered: Option<Element>) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(Element::Node(index)) = hovered
        {
            self.dragged_node = Some(index);
        }
        if response.drag_stopped() {
            self.dragged_node = None;
        }
        if let Some(index) = self.dragged_node
            && response.dragged_by(egui::PointerButton::Primary)
            && let Some(node) = self.current.nodes.get_mut(index)
        {
            node.pos += response.drag_delta() / self.zoom;
        }
    }
}

fn cluster_radius(cluster: &ClusterNode) -> f32 {
    10.0 + (cluster.weight * 6.0)
}

fn pick_cluster(
    clusters: &[ClusterNode],
    rect: Rect,
    pan: eframe::egui::Vec2,
    zoom: f32,
    pointer: Pos2,
) -> Option<usize> {
    clusters
        .iter()
        .enumerate()
        .filter_map(|(index, cluster)| {
            let position = world_to_screen(rect, pan, zoom, cluster.pos);
            let radius = cluster_radius(cluster) * zoom.powf(0.40);
            let distance = position.distance(pointer);
            (distance <= radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}
