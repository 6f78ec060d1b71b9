// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// - la vue graphique (ChartView) et sa plage
// - le preset de plage affiché dans l'en-tête
// - le classement des articles de la même plage
// - la confirmation de sortie
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// ============================================================================

use std::sync::mpsc;
use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::api::{FetchCommand, FetchOutcome};
use crate::chart::{ChartView, FetchStatus};
use crate::config::Config;
use crate::models::{DateRange, PostStats, RangePreset};

/// Message de la ligne d'état, par priorité décroissante
///
/// CONCEPT : Calculé, jamais stocké
/// - status_line() le dérive de l'état à chaque rendu
/// - aucun risque d'afficher un message périmé
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// Première pression de 'q'
    ConfirmQuit,
    Loading,
    Error(String),
    /// Échantillons hors plage ignorés au dernier merge
    Anomalies(usize),
    Ready,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Two-step quit : première pression de 'q' → true, seconde → sortie
    pub confirm_quit: bool,

    /// Preset de la plage affichée (Custom après un décalage ou --start/--end)
    pub preset: RangePreset,

    pub chart: ChartView,

    /// Classement des articles pour la plage affichée
    pub posts: Vec<PostStats>,
    pub posts_error: Option<String>,

    /// Index de l'article sélectionné dans le tableau
    pub selected_post: usize,

    /// Hauteur fixe du graphique (config), sinon calculée au rendu
    pub chart_height: Option<u16>,
}

impl App {
    pub fn new(
        range: DateRange,
        preset: RangePreset,
        config: &Config,
        commands: mpsc::Sender<FetchCommand>,
    ) -> Self {
        Self {
            running: true,
            confirm_quit: false,
            preset,
            chart: ChartView::new(range, config, commands),
            posts: Vec::new(),
            posts_error: None,
            selected_post: 0,
            chart_height: config.chart_height,
        }
    }

    /// Monte la vue graphique (premier fetch, minuterie)
    pub fn start(&mut self, now: Instant) {
        self.chart.activate(now);
    }

    /// Démonte la vue graphique avant la sortie
    pub fn shutdown(&mut self) -> bool {
        self.chart.teardown()
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Tick : appelé à chaque itération de la boucle
    pub fn tick(&mut self, now: Instant, wall: NaiveDateTime) {
        self.chart.on_tick(now, wall);
    }

    // ========================================================================
    // Plage affichée
    // ========================================================================

    /// Preset suivant (touche 'l')
    pub fn next_preset(&mut self, today: NaiveDate) {
        self.select_preset(self.preset.next(), today);
    }

    /// Preset précédent (touche 'h')
    pub fn previous_preset(&mut self, today: NaiveDate) {
        self.select_preset(self.preset.previous(), today);
    }

    fn select_preset(&mut self, preset: RangePreset, today: NaiveDate) {
        match preset.resolve(today) {
            Some(range) => {
                info!(preset = preset.label(), %range, "Range preset selected");
                self.preset = preset;
                self.change_range(range);
            }
            None => warn!(preset = preset.label(), "Preset has no range"),
        }
    }

    /// Décale la plage de sa propre longueur (touches '[' et ']')
    pub fn shift_range(&mut self, forward: bool) {
        match self.chart.range().shifted(forward) {
            Some(range) => {
                self.preset = RangePreset::Custom;
                self.change_range(range);
            }
            None => warn!(forward, "Range cannot be shifted further"),
        }
    }

    fn change_range(&mut self, range: DateRange) {
        if self.chart.set_range(range) {
            self.posts.clear();
            self.posts_error = None;
            self.selected_post = 0;
        }
    }

    /// Rafraîchissement manuel (touche 'r')
    pub fn refresh(&mut self) {
        debug!("Manual refresh");
        self.chart.request_refresh();
    }

    // ========================================================================
    // Résultats du worker
    // ========================================================================

    /// Applique un résultat du worker ; retourne false s'il est périmé
    pub fn handle_outcome(&mut self, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::StatsLoaded { tag, samples } => self.chart.apply_samples(tag, &samples),
            FetchOutcome::StatsFailed { tag, error } => self.chart.apply_failure(tag, &error),

            FetchOutcome::PostsLoaded { tag, posts } => {
                if self.chart.latest_tag() != Some(tag) {
                    debug!(generation = tag.generation, "Discarding stale posts");
                    return false;
                }
                info!(posts = posts.len(), "Posts ranking updated");
                self.posts = posts;
                self.posts_error = None;
                self.selected_post = self.selected_post.min(self.posts.len().saturating_sub(1));
                true
            }
            FetchOutcome::PostsFailed { tag, error } => {
                if self.chart.latest_tag() != Some(tag) {
                    debug!(generation = tag.generation, "Discarding stale posts error");
                    return false;
                }
                self.posts_error = Some(error);
                true
            }
        }
    }

    // ========================================================================
    // Tableau des articles
    // ========================================================================

    pub fn navigate_up(&mut self) {
        self.selected_post = self.selected_post.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.posts.len().saturating_sub(1);
        self.selected_post = (self.selected_post + 1).min(max_index);
    }

    pub fn selected_post(&self) -> Option<&PostStats> {
        self.posts.get(self.selected_post)
    }

    // ========================================================================
    // Ligne d'état
    // ========================================================================

    pub fn status_line(&self) -> StatusLine {
        if self.confirm_quit {
            return StatusLine::ConfirmQuit;
        }
        if self.chart.is_loading() {
            return StatusLine::Loading;
        }
        if let FetchStatus::Failed(error) = self.chart.status() {
            return StatusLine::Error(error.clone());
        }
        match self.chart.last_report() {
            Some(report) if report.has_anomalies() => StatusLine::Anomalies(report.anomalies.len()),
            _ => StatusLine::Ready,
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
