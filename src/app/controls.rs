use eframe::egui::{self, RichText, Ui};

use super::ViewModel;
use super::highlight::Element;
use crate::api::{self, SearchMode};

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Categories");
        ui.add_space(4.0);

        let presence = self.presence;

        let mut documents = self.flags.documents;
        if ui
            .add_enabled(
                presence.documents,
                egui::Checkbox::new(&mut documents, "Documents"),
            )
            .changed()
        {
            self.flags.set_documents(documents, presence);
        }

        let mut text_units = self.flags.text_units;
        if ui
            .add_enabled(
                presence.text_units,
                egui::Checkbox::new(&mut text_units, "Text units"),
            )
            .changed()
        {
            self.flags.set_text_units(text_units, presence);
        }

        let mut communities = self.flags.communities;
        if ui
            .add_enabled(
                presence.communities,
                egui::Checkbox::new(&mut communities, "Communities"),
            )
            .changed()
        {
            self.flags.set_communities(communities, presence);
        }

        let mut claims = self.flags.claims;
        if ui
            .add_enabled(presence.claims, egui::Checkbox::new(&mut claims, "Claims"))
            .changed()
        {
            self.flags.set_claims(claims, presence);
        }

        ui.separator();
        ui.heading("Find");
        ui.add_space(4.0);

        let search_response = ui.text_edit_singleline(&mut self.search_query);
        if search_response.changed() {
            self.run_local_search();
        }

        if self.results_open {
            let hits = self.search_hits.clone();
            if hits.is_empty() {
                ui.small("No matches.");
            } else {
                ui.small(format!("{} matches", hits.len()));
            }
            egui::ScrollArea::vertical()
                .id_salt("search_results_scroll")
                .max_height(260.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    for hit in &hits {
                        let prefix = match hit.element {
                            Element::Node(_) => "\u{25cf}",
                            Element::Link(_) => "\u{2500}",
                        };
                        if ui.link(format!("{prefix} {}", hit.label)).clicked() {
                            self.activate_search_hit(hit.element, ui);
                        }
                    }
                });
        }

        ui.separator();
        ui.heading("Remote search");
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            let status = match self.server_up {
                Some(true) => RichText::new("\u{25cf} up").color(egui::Color32::from_rgb(110, 200, 110)),
                Some(false) => RichText::new("\u{25cf} down").color(egui::Color32::from_rgb(214, 110, 110)),
                None => RichText::new("\u{25cf} probing").color(egui::Color32::GRAY),
            };
            ui.label(status);
            let probing = self.status_rx.is_some();
            if ui.add_enabled(!probing, egui::Button::new("Probe")).clicked() {
                self.server_up = None;
                self.status_rx = Some(api::spawn_status_probe(self.api_url.clone()));
            }
        });

        ui.text_edit_singleline(&mut self.api_query);
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.api_mode, SearchMode::Local, "Local");
            ui.selectable_value(&mut self.api_mode, SearchMode::Global, "Global");
        });

        ui.horizontal(|ui| {
            let can_search = self.api_rx.is_none() && !self.api_query.trim().is_empty();
            if ui.add_enabled(can_search, egui::Button::new("Search")).clicked() {
                self.run_remote_search();
            }
            if self.api_rx.is_some() {
                ui.spinner();
            }
        });

        if let Some(error) = &self.api_error {
            ui.colored_label(egui::Color32::from_rgb(214, 110, 110), error.as_str());
        }

        if self.showing_search_subgraph() && ui.button("Show full graph").clicked() {
            self.revert_to_base();
        }
    }

    /// Empty queries clear and close the result list; a non-empty query with
    /// zero matches still opens it so the emptiness is visible.
    pub(in crate::app) fn run_local_search(&mut self) {
        if self.search_query.trim().is_empty() {
            self.search_hits.clear();
            self.search_hit_nodes.clear();
            self.results_open = false;
            return;
        }

        self.search_hits = self.search_index.search(&self.search_query);
        self.search_hit_nodes = self
            .search_hits
            .iter()
            .filter_map(|hit| match hit.element {
                Element::Node(index) => Some(index),
                Element::Link(_) => None,
            })
            .collect();
        self.results_open = true;
    }

    fn run_remote_search(&mut self) {
        self.api_error = None;
        self.api_rx = Some(api::spawn_search(
            self.api_url.clone(),
            self.api_query.trim().to_owned(),
            self.api_mode,
        ));
    }

    fn activate_search_hit(&mut self, element: Element, ui: &Ui) {
        match element {
            Element::Node(index) => self.interaction.select_node(&self.current, index),
            Element::Link(index) => self.interaction.select_link(&self.current, index),
        }
        let now = ui.ctx().input(|input| input.time);
        self.interaction.begin_focus(&self.current, element, now);
        self.results_open = false;
    }
}
