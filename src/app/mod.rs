use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::api::{self, SearchMode, SearchResponse};
use crate::kg::{GraphSnapshot, load_dataset};
use crate::layout::force_layout;

mod cluster;
mod controls;
mod details;
mod filter;
mod highlight;
mod mapper;
mod offload;
mod render_utils;
mod reveal;
mod search;
mod view;

use filter::{CategoryFlags, CategoryPresence};
use highlight::Interaction;
use offload::LayoutOffload;
use reveal::RevealScheduler;
use search::{SearchHit, SearchIndex};

const INITIAL_LAYOUT_ITERATIONS: usize = 150;
const LARGE_GRAPH_LAYOUT_ITERATIONS: usize = 40;

type LoadResult = Result<GraphSnapshot, String>;

pub struct GraphLensApp {
    data_dir: PathBuf,
    api_url: String,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    /// Original dataset, retained so a search substitution can be reverted.
    base: GraphSnapshot,
    /// Canonical snapshot currently driving the view.
    current: GraphSnapshot,
    next_version: u64,
    max_degree: usize,

    flags: CategoryFlags,
    presence: CategoryPresence,
    interaction: Interaction,

    search_index: SearchIndex,
    search_query: String,
    search_hits: Vec<SearchHit>,
    search_hit_nodes: HashSet<usize>,
    results_open: bool,

    api_url: String,
    api_query: String,
    api_mode: SearchMode,
    api_rx: Option<Receiver<Result<SearchResponse, String>>>,
    api_error: Option<String>,
    server_up: Option<bool>,
    status_rx: Option<Receiver<bool>>,

    offload: LayoutOffload,
    reveal: RevealScheduler,

    pan: Vec2,
    zoom: f32,
    dragged_node: Option<usize>,
}

impl GraphLensApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, data_dir: PathBuf, api_url: String) -> Self {
        let state = Self::start_load(data_dir.clone());
        Self {
            data_dir,
            api_url,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(data_dir: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_and_place(&data_dir).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(data_dir: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(data_dir),
        }
    }
}

fn load_and_place(data_dir: &std::path::Path) -> anyhow::Result<GraphSnapshot> {
    let mut snapshot = load_dataset(data_dir)?;
    let ids = snapshot
        .nodes
        .iter()
        .map(|node| node.id.clone())
        .collect::<Vec<_>>();
    let edges = snapshot
        .links
        .iter()
        .map(|link| (link.source, link.target))
        .collect::<Vec<_>>();
    let iterations = if snapshot.node_count() > offload::OFFLOAD_NODE_THRESHOLD {
        LARGE_GRAPH_LAYOUT_ITERATIONS
    } else {
        INITIAL_LAYOUT_ITERATIONS
    };
    let positions = force_layout(&ids, &edges, iterations);
    for (node, pos) in snapshot.nodes.iter_mut().zip(positions) {
        node.pos = pos;
    }
    Ok(snapshot)
}

impl eframe::App for GraphLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(snapshot) => {
                            AppState::Ready(Box::new(ViewModel::new(snapshot, self.api_url.clone())))
                        }
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.data_dir.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.data_dir.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(snapshot) => AppState::Ready(Box::new(ViewModel::new(
                                    snapshot,
                                    self.api_url.clone(),
                                ))),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background loader disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(base: GraphSnapshot, api_url: String) -> Self {
        let current = base.clone();
        let next_version = base.version + 1;
        let mut model = Self {
            max_degree: 0,
            presence: CategoryPresence::default(),
            flags: CategoryFlags::default(),
            interaction: Interaction::new(),
            search_index: SearchIndex::build(&current),
            search_query: String::new(),
            search_hits: Vec::new(),
            search_hit_nodes: HashSet::new(),
            results_open: false,
            api_query: String::new(),
            api_mode: SearchMode::Local,
            api_rx: None,
            api_error: None,
            server_up: None,
            status_rx: Some(api::spawn_status_probe(api_url.clone())),
            api_url,
            offload: LayoutOffload::new(),
            reveal: RevealScheduler::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            dragged_node: None,
            base,
            current,
            next_version,
        };
        model.refresh_derived();
        model
    }

    fn allocate_version(&mut self) -> u64 {
        let version = self.next_version;
        self.next_version += 1;
        version
    }

    /// Installs a replacement snapshot: derived state is rebuilt, the reveal
    /// loop restarts from empty, and anything indexed against the old
    /// snapshot is dropped.
    fn adopt_snapshot(&mut self, snapshot: GraphSnapshot) {
        self.current = snapshot;
        self.interaction.reset_for_snapshot();
        self.search_query.clear();
        self.search_hits.clear();
        self.search_hit_nodes.clear();
        self.results_open = false;
        self.dragged_node = None;
        self.refresh_derived();
    }

    fn refresh_derived(&mut self) {
        self.presence = CategoryPresence::scan(&self.current);
        self.max_degree = (0..self.current.node_count())
            .map(|index| self.current.degree(index))
            .max()
            .unwrap_or(0);
        if self.search_index.version() != self.current.version {
            self.search_index = SearchIndex::build(&self.current);
        }
        self.reveal.reset(self.current.version, self.current.node_count());
        self.offload.maybe_submit(&self.current);
    }

    fn revert_to_base(&mut self) {
        let mut snapshot = self.base.clone();
        snapshot.version = self.allocate_version();
        self.adopt_snapshot(snapshot);
    }

    fn showing_search_subgraph(&self) -> bool {
        self.current.version != self.base.version
    }

    fn poll_remote(&mut self, ctx: &Context) {
        if let Some(rx) = self.status_rx.take() {
            match rx.try_recv() {
                Ok(up) => self.server_up = Some(up),
                Err(TryRecvError::Empty) => {
                    self.status_rx = Some(rx);
                    ctx.request_repaint();
                }
                Err(TryRecvError::Disconnected) => self.server_up = Some(false),
            }
        }

        if let Some(rx) = self.api_rx.take() {
            match rx.try_recv() {
                Ok(Ok(response)) => {
                    let version = self.allocate_version();
                    let mapped =
                        mapper::map_search_context(&self.base, &response.context_data, version);
                    log::debug!(
                        "remote search mapped {} nodes / {} links",
                        mapped.node_count(),
                        mapped.links.len()
                    );
                    self.adopt_snapshot(mapped);
                    ctx.request_repaint();
                }
                Ok(Err(error)) => {
                    // Prior results stay on screen; the failure is only logged
                    // and shown inline.
                    log::warn!("remote search failed: {error}");
                    self.api_error = Some(error);
                }
                Err(TryRecvError::Empty) => {
                    self.api_rx = Some(rx);
                    ctx.request_repaint();
                }
                Err(TryRecvError::Disconnected) => {
                    self.api_error = Some("search worker disconnected".to_owned());
                }
            }
        }
    }

    fn show(&mut self, ctx: &Context, reload_requested: &mut bool, is_reloading: bool) {
        self.poll_remote(ctx);

        if self.offload.poll(&mut self.current) {
            ctx.request_repaint();
        }

        if !self.reveal.complete() {
            self.reveal.tick(self.current.version);
            ctx.request_repaint();
        }

        let now = ctx.input(|input| input.time);
        if self.interaction.tick_focus(now).is_some() {
            self.results_open = false;
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("graphlens");
                    ui.separator();
                    ui.label(format!(
                        "dataset: {} nodes / {} links",
                        self.base.node_count(),
                        self.base.links.len()
                    ));
                    if self.showing_search_subgraph() {
                        ui.label(format!(
                            "showing search subgraph: {} nodes / {} links",
                            self.current.node_count(),
                            self.current.links.len()
                        ));
                    }
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload dataset"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        match self.server_up {
                            Some(true) => ui.label("api: up"),
                            Some(false) => ui.label("api: down"),
                            None => ui.label("api: probing..."),
                        };
                        if self.offload.in_flight() {
                            ui.spinner();
                            ui.label("layout");
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_reloading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading knowledge graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }
}
