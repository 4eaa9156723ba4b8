use eframe::egui::{self, RichText, Ui};

use super::ViewModel;
use super::highlight::{Element, Selection};
use crate::util::short_label;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selection) = self.interaction.selected.clone() else {
            ui.label("Click a node or link in the graph, or pick a search result.");
            return;
        };

        match selection.target {
            Element::Node(index) => self.node_details(ui, index, &selection),
            Element::Link(index) => self.link_details(ui, index, &selection),
        }
    }

    fn node_details(&mut self, ui: &mut Ui, index: usize, selection: &Selection) {
        let Some(node) = self.current.nodes.get(index) else {
            ui.label("The selected node is no longer in the displayed graph.");
            return;
        };

        let name = node.name.clone();
        let kind = node.kind.label();
        let id = node.id.clone();
        let human_readable_id = node.human_readable_id.clone();
        let description = node.description.clone();
        let summary = node.summary.clone();
        let text = node.text.clone();
        let degree = self.current.degree(index);

        ui.label(RichText::new(name).strong());
        ui.small(kind);
        ui.add_space(6.0);

        ui.label(format!("Id: {id}"));
        if let Some(readable) = human_readable_id {
            ui.label(format!("Reference id: {readable}"));
        }
        ui.label(format!("Connections: {degree}"));

        for (title, body) in [
            ("Description", description),
            ("Summary", summary),
            ("Text", text),
        ] {
            if let Some(body) = body {
                ui.add_space(4.0);
                ui.label(RichText::new(title).strong());
                ui.label(short_label(&body, 600));
            }
        }

        self.linked_context(ui, selection);
    }

    fn link_details(&mut self, ui: &mut Ui, index: usize, selection: &Selection) {
        let Some(link) = self.current.links.get(index) else {
            ui.label("The selected relationship is no longer in the displayed graph.");
            return;
        };

        let source = self.current.nodes[link.source].name.clone();
        let target = self.current.nodes[link.target].name.clone();
        let kind = link.kind.clone();
        let description = link.description.clone();

        ui.label(RichText::new(format!("{source} \u{2192} {target}")).strong());
        ui.small(kind);
        ui.add_space(6.0);

        if let Some(description) = description {
            ui.label(short_label(&description, 600));
        }

        self.linked_context(ui, selection);
    }

    fn linked_context(&mut self, ui: &mut Ui, selection: &Selection) {
        ui.separator();
        ui.label(RichText::new("Linked context").strong());

        if selection.linked_nodes.is_empty() {
            ui.label("No connected nodes.");
            return;
        }

        let rows = selection
            .linked_nodes
            .iter()
            .filter_map(|&index| {
                self.current
                    .nodes
                    .get(index)
                    .map(|node| (index, node.name.clone(), node.kind.label()))
            })
            .collect::<Vec<_>>();

        egui::ScrollArea::vertical()
            .id_salt("linked_context_scroll")
            .max_height(320.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (index, name, kind) in rows {
                    ui.horizontal(|ui| {
                        if ui
                            .link(format!("{} ({kind})", short_label(&name, 40)))
                            .clicked()
                        {
                            self.interaction.select_node(&self.current, index);
                        }
                        if ui.small_button("Focus").clicked() {
                            let now = ui.ctx().input(|input| input.time);
                            self.interaction
                                .begin_focus(&self.current, Element::Node(index), now);
                            self.results_open = false;
                        }
                    });
                }
            });
    }
}
