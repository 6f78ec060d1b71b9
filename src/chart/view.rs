// ============================================================================
// ChartView : cycle de vie du graphique
// ============================================================================
// Assemble les briques du graphique pour une plage donnée :
// - squelette des jours + merge des échantillons (Dataset)
// - géométrie recalculée à chaque rendu (ChartLayout)
// - survol et tooltip (InteractionController)
// - rafraîchissement automatique (RefreshScheduler)
//
// Une seule requête stats est en vol à la fois. Une demande de
// rafraîchissement qui arrive pendant ce temps est mémorisée et relancée
// une seule fois à la réception. Une réponse dont le tag n'est pas celui
// de la requête en vol est jetée (plage changée entre-temps).
// Chaque fetch stats part avec un fetch du classement des articles, sous
// le même tag.
//
// CONCEPT RUST : RAII
// - activate() acquiert tooltip, gestion des clics et minuterie
// - teardown() les libère, Drop appelle teardown()
// ============================================================================

use std::sync::mpsc;
use std::time::Instant;

use chrono::NaiveDateTime;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::api::{FetchCommand, RequestTag};
use crate::chart::geometry::{ChartLayout, Padding, RectF};
use crate::chart::interaction::{BarTarget, InteractionController};
use crate::chart::refresh::{RefreshDecision, RefreshScheduler};
use crate::config::Config;
use crate::models::{Dataset, DateRange, MergeReport, SparseSample};

/// État du dernier chargement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Failed(String),
}

/// Convertit une zone du terminal en rectangle flottant
pub fn rect_f(area: Rect) -> RectF {
    RectF::new(
        f64::from(area.x),
        f64::from(area.y),
        f64::from(area.width),
        f64::from(area.height),
    )
}

/// Vue graphique : données, géométrie, interaction et rafraîchissement
#[derive(Debug)]
pub struct ChartView {
    padding: Padding,
    dataset: Dataset,
    interaction: InteractionController,
    refresh: RefreshScheduler,
    commands: mpsc::Sender<FetchCommand>,

    /// Compteur des requêtes émises
    /// CONCEPT : Tag de requête plutôt qu'annulation
    /// - une requête HTTP en cours ne s'annule pas depuis le thread UI
    /// - chaque envoi incrémente generation ; le couple (generation, plage)
    ///   identifie la seule réponse attendue
    generation: u64,
    in_flight: Option<RequestTag>,
    /// Dernier tag émis : le classement des articles suit la même règle
    latest: Option<RequestTag>,
    refresh_pending: bool,

    /// Zone du graphique dans le terminal
    area: Rect,
    /// Zone totale du terminal (le tooltip peut déborder du graphique)
    screen: Rect,

    active: bool,
    status: FetchStatus,
    last_report: Option<MergeReport>,
}

impl ChartView {
    pub fn new(range: DateRange, config: &Config, commands: mpsc::Sender<FetchCommand>) -> Self {
        Self {
            padding: Padding::TERMINAL,
            dataset: Dataset::skeleton(range),
            interaction: InteractionController::new(config.labels.clone()),
            refresh: RefreshScheduler::new(config.refresh_period()),
            commands,
            generation: 0,
            in_flight: None,
            latest: None,
            refresh_pending: false,
            area: Rect::default(),
            screen: Rect::default(),
            active: false,
            status: FetchStatus::Idle,
            last_report: None,
        }
    }

    // ========================================
    // Cycle de vie
    // ========================================

    /// Monte la vue : tooltip attaché, minuterie démarrée, premier fetch
    pub fn activate(&mut self, now: Instant) {
        if self.active {
            return;
        }
        info!(range = %self.dataset.range(), "Activating chart view");
        self.active = true;
        self.interaction.activate();
        self.refresh.start(now);
        self.dispatch();
    }

    /// Démonte la vue ; sans effet si déjà démontée
    ///
    /// Après le démontage plus aucune réponse n'est acceptée.
    pub fn teardown(&mut self) -> bool {
        if !self.active {
            return false;
        }
        info!("Tearing down chart view");
        self.active = false;
        self.interaction.teardown();
        self.refresh.cancel();
        self.in_flight = None;
        self.latest = None;
        self.refresh_pending = false;
        if self.status == FetchStatus::Loading {
            self.status = FetchStatus::Idle;
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    // ========================================
    // Plage et chargement
    // ========================================

    /// Change la plage affichée
    ///
    /// Même plage : rien. Sinon squelette reconstruit, tooltip masqué et
    /// nouvelle requête (la réponse de l'ancienne sera jetée).
    pub fn set_range(&mut self, range: DateRange) -> bool {
        if range == self.dataset.range() {
            return false;
        }
        info!(from = %self.dataset.range(), to = %range, "Changing chart range");

        // L'ancien Dataset est remplacé, pas vidé : aucune réponse de
        // l'ancienne plage ne peut plus l'atteindre
        self.dataset = Dataset::skeleton(range);
        self.interaction.reset();
        self.last_report = None;
        self.refresh_pending = false;
        self.in_flight = None;
        self.latest = None;

        if self.active {
            self.dispatch();
        }
        true
    }

    /// Demande un rechargement de la plage courante
    ///
    /// Si une requête est déjà en vol, la demande est fusionnée : un seul
    /// fetch supplémentaire partira à sa réception.
    pub fn request_refresh(&mut self) {
        if !self.active {
            return;
        }
        if self.in_flight.is_some() {
            debug!("Refresh requested while loading, coalesced");
            self.refresh_pending = true;
            return;
        }
        self.dispatch();
    }

    /// Tick de la boucle d'événements : échéance du rafraîchissement
    pub fn on_tick(&mut self, now: Instant, wall: NaiveDateTime) {
        let range = self.dataset.range();
        if self.refresh.poll(now, wall, &range) == RefreshDecision::Fetch {
            debug!(%range, "Auto refresh");
            self.request_refresh();
        }
    }

    /// Réception des échantillons ; retourne false si la réponse est jetée
    pub fn apply_samples(&mut self, tag: RequestTag, samples: &[SparseSample]) -> bool {
        if !self.accept(tag) {
            return false;
        }

        let report = self.dataset.merge(samples);
        if report.has_anomalies() {
            warn!(count = report.anomalies.len(), "Samples outside the displayed range");
        }
        info!(
            merged = report.merged,
            y_max = self.dataset.y_max(),
            "Chart data updated"
        );
        self.last_report = Some(report);
        self.status = FetchStatus::Idle;

        // Le tooltip affiché doit suivre les nouveaux comptes
        if let Some(index) = self.interaction.active_index() {
            let target = self.target_for(index);
            self.interaction.retarget(target, rect_f(self.screen));
        }

        self.after_response();
        true
    }

    /// Échec du chargement : les données affichées sont conservées
    pub fn apply_failure(&mut self, tag: RequestTag, error: &str) -> bool {
        if !self.accept(tag) {
            return false;
        }
        warn!(range = %tag.range, error, "Chart data fetch failed");
        self.status = FetchStatus::Failed(error.to_string());
        self.after_response();
        true
    }

    /// CONCEPT : Comparaison stricte du tag
    /// - Option<RequestTag> == Some(tag) : None (rien en vol) ne correspond
    ///   à aucune réponse, ce qui couvre aussi la vue démontée
    fn accept(&mut self, tag: RequestTag) -> bool {
        if self.in_flight != Some(tag) {
            debug!(generation = tag.generation, range = %tag.range, "Discarding stale response");
            return false;
        }
        self.in_flight = None;
        true
    }

    fn after_response(&mut self) {
        if self.refresh_pending {
            self.refresh_pending = false;
            self.dispatch();
        }
    }

    fn dispatch(&mut self) {
        self.generation += 1;
        let tag = RequestTag {
            generation: self.generation,
            range: self.dataset.range(),
        };

        debug!(generation = tag.generation, range = %tag.range, "Dispatching stats request");
        // CONCEPT RUST : and_then sur Result
        // - le second envoi n'a lieu que si le premier a réussi
        // - une seule branche d'erreur : le worker a disparu
        let sent = self
            .commands
            .send(FetchCommand::Stats { tag })
            .and_then(|_| self.commands.send(FetchCommand::Posts { tag }));

        match sent {
            Ok(()) => {
                self.in_flight = Some(tag);
                self.latest = Some(tag);
                self.status = FetchStatus::Loading;
            }
            Err(_) => {
                warn!("Fetch worker is gone, request dropped");
                self.in_flight = None;
                self.status = FetchStatus::Failed("worker stopped".to_string());
            }
        }
    }

    // ========================================
    // Géométrie et souris
    // ========================================

    /// Mémorise où le graphique est dessiné
    pub fn set_area(&mut self, area: Rect, screen: Rect) {
        self.area = area;
        self.screen = screen;
    }

    /// Géométrie pour la zone courante (None : rien à dessiner)
    pub fn layout(&self) -> Option<ChartLayout> {
        ChartLayout::compute(
            &self.dataset,
            f64::from(self.area.width),
            f64::from(self.area.height),
            self.padding,
        )
    }

    /// Barre sous la cellule (column, row) du terminal
    pub fn target_at(&self, column: u16, row: u16) -> Option<BarTarget> {
        let area = rect_f(self.area);
        let cell = RectF::new(f64::from(column), f64::from(row), 1.0, 1.0);
        if !area.intersects(&cell) {
            return None;
        }

        // CONCEPT RUST : ? sur Option
        // - pas de géométrie ou pas de barre sous la cellule : None remonte
        let layout = self.layout()?;
        let local = cell.translate(-area.x, -area.y);
        let index = layout.bar_in_cell(local)?.index;
        self.build_target(&layout, index)
    }

    fn target_for(&self, index: usize) -> Option<BarTarget> {
        let layout = self.layout()?;
        self.build_target(&layout, index)
    }

    fn build_target(&self, layout: &ChartLayout, index: usize) -> Option<BarTarget> {
        let pair = layout.bars.iter().find(|p| p.index == index)?;
        let bucket = self.dataset.get(index)?.clone();
        let anchor = layout
            .to_outer(pair.bounds())
            .translate(f64::from(self.area.x), f64::from(self.area.y));

        Some(BarTarget {
            index,
            bucket,
            anchor,
            bar_width: layout.bar_width,
        })
    }

    pub fn on_mouse_move(&mut self, column: u16, row: u16) {
        if !self.active {
            return;
        }
        let target = self.target_at(column, row);
        self.interaction.pointer_move(target, rect_f(self.screen));
    }

    pub fn on_click(&mut self, column: u16, row: u16) {
        if !self.active {
            return;
        }
        let target = self.target_at(column, row);
        let (x, y) = (f64::from(column) + 0.5, f64::from(row) + 0.5);
        self.interaction
            .click(x, y, target, rect_f(self.area), rect_f(self.screen));
    }

    /// Masque le tooltip (touche Échap)
    pub fn dismiss_tooltip(&mut self) {
        self.interaction.reset();
    }

    // ========================================
    // Accesseurs
    // ========================================

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn range(&self) -> DateRange {
        self.dataset.range()
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// Tag de la dernière requête émise (None après démontage)
    pub fn latest_tag(&self) -> Option<RequestTag> {
        self.latest
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_report(&self) -> Option<&MergeReport> {
        self.last_report.as_ref()
    }

    pub fn area(&self) -> Rect {
        self.area
    }
}

impl Drop for ChartView {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::interaction::HoverState;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap()
    }

    fn view() -> (ChartView, mpsc::Receiver<FetchCommand>) {
        let (tx, rx) = mpsc::channel();
        let view = ChartView::new(range(), &Config::default(), tx);
        (view, rx)
    }

    /// Commandes émises par un dispatch : stats puis articles, même tag
    fn stats_tag(rx: &mpsc::Receiver<FetchCommand>) -> RequestTag {
        let commands: Vec<FetchCommand> = rx.try_iter().collect();
        assert_eq!(commands.len(), 2, "{:?}", commands);
        let tag = commands[0].tag();
        assert_eq!(
            commands,
            vec![FetchCommand::Stats { tag }, FetchCommand::Posts { tag }]
        );
        tag
    }

    fn samples() -> Vec<SparseSample> {
        vec![SparseSample::new("2024-01-02", 10u64, 5u64)]
    }

    #[test]
    fn test_skeleton_before_activation() {
        let (view, rx) = view();
        assert_eq!(view.dataset().len(), 3);
        assert!(view.dataset().buckets().iter().all(|b| b.pageviews == 0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_activation_fetches_and_merges() {
        let (mut view, rx) = view();
        view.activate(Instant::now());
        assert!(view.interaction().tooltip().is_attached());

        let tag = stats_tag(&rx);
        assert_eq!(tag.range, range());
        assert_eq!(view.status(), &FetchStatus::Loading);

        assert!(view.apply_samples(tag, &samples()));
        let counts: Vec<u64> = view.dataset().buckets().iter().map(|b| b.pageviews).collect();
        assert_eq!(counts, vec![0, 10, 0]);
        assert_eq!(view.dataset().y_max(), 10);
        assert_eq!(view.status(), &FetchStatus::Idle);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let (mut view, rx) = view();
        view.activate(Instant::now());
        let old = stats_tag(&rx);

        let next = DateRange::new(date(2024, 2, 1), date(2024, 2, 5)).unwrap();
        assert!(view.set_range(next));
        let current = stats_tag(&rx);

        assert!(!view.apply_samples(old, &samples()));
        assert_eq!(view.dataset().range(), next);
        assert_eq!(view.dataset().total_pageviews(), 0);

        assert!(view.apply_samples(current, &[SparseSample::new("2024-02-03", 4u64, 2u64)]));
        assert_eq!(view.dataset().total_pageviews(), 4);
    }

    #[test]
    fn test_same_range_is_a_no_op() {
        let (mut view, rx) = view();
        view.activate(Instant::now());
        let _ = stats_tag(&rx);

        assert!(!view.set_range(range()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_refresh_while_loading_is_coalesced() {
        let (mut view, rx) = view();
        view.activate(Instant::now());
        let first = stats_tag(&rx);

        view.request_refresh();
        view.request_refresh();
        view.request_refresh();
        assert!(rx.try_recv().is_err());

        assert!(view.apply_samples(first, &samples()));
        let second = stats_tag(&rx);
        assert!(second.generation > first.generation);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failure_keeps_previous_data() {
        let (mut view, rx) = view();
        view.activate(Instant::now());
        let first = stats_tag(&rx);
        view.apply_samples(first, &samples());

        view.request_refresh();
        let second = stats_tag(&rx);
        assert!(view.apply_failure(second, "HTTP 500"));

        assert_eq!(view.dataset().total_pageviews(), 10);
        assert_eq!(view.status(), &FetchStatus::Failed("HTTP 500".to_string()));
    }

    #[test]
    fn test_auto_refresh_only_inside_range() {
        let start = Instant::now();
        let (mut view, rx) = view();
        view.activate(start);
        let first = stats_tag(&rx);
        view.apply_samples(first, &samples());

        let period = Config::default().refresh_period();
        let past = date(2024, 3, 1).and_hms_opt(8, 0, 0).unwrap();
        view.on_tick(start + period, past);
        assert!(rx.try_recv().is_err());

        let inside = date(2024, 1, 2).and_hms_opt(8, 0, 0).unwrap();
        view.on_tick(start + period * 2, inside);
        let tag = stats_tag(&rx);
        assert_eq!(tag.range, range());
        // Pas de reconstruction : les comptes restent affichés pendant le chargement
        assert_eq!(view.dataset().total_pageviews(), 10);
    }

    #[test]
    fn test_teardown_is_idempotent_and_stops_everything() {
        let start = Instant::now();
        let (mut view, rx) = view();
        view.activate(start);
        let tag = stats_tag(&rx);

        assert!(view.teardown());
        assert!(!view.teardown());
        assert!(!view.interaction().tooltip().is_attached());
        assert_eq!(view.latest_tag(), None);

        assert!(!view.apply_samples(tag, &samples()));
        let inside = date(2024, 1, 2).and_hms_opt(8, 0, 0).unwrap();
        view.on_tick(start + Duration::from_secs(3600), inside);
        view.request_refresh();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_worker_gone_reports_failure() {
        let (mut view, rx) = view();
        drop(rx);
        view.activate(Instant::now());
        assert!(!view.is_loading());
        assert!(matches!(view.status(), FetchStatus::Failed(_)));
    }

    // Zone 40x20 : marges 7/1/1/2, cases de 32/3 cellules.
    // Paire du 2 janvier : visiteurs x ∈ [18.2, 23[, y ∈ [9.5, 18[ ;
    // pages vues x ∈ [23, 27.8[, y ∈ [1, 18[
    #[test]
    fn test_mouse_hover_and_outside_click() {
        let (mut view, rx) = view();
        view.set_area(Rect::new(0, 0, 40, 20), Rect::new(0, 0, 80, 40));
        view.activate(Instant::now());
        let tag = stats_tag(&rx);
        view.apply_samples(tag, &samples());

        view.on_mouse_move(20, 10);
        assert_eq!(view.interaction().active_index(), Some(1));
        let content = view.interaction().tooltip().content().unwrap();
        assert_eq!(content.heading, "Jan 2, 2024");
        assert_eq!(content.pageviews, 10);

        view.on_mouse_move(2, 10);
        assert_eq!(view.interaction().state(), &HoverState::Idle);

        // Au-dessus de la barre des visiteurs (haut à 9.5) : rien de peint
        view.on_mouse_move(20, 3);
        assert_eq!(view.interaction().state(), &HoverState::Idle);

        view.on_click(20, 10);
        view.on_mouse_move(2, 10);
        assert!(view.interaction().tooltip().is_visible());

        // Clic dans le graphique hors barre : ignoré
        view.on_click(2, 10);
        assert!(view.interaction().tooltip().is_visible());

        view.on_click(60, 30);
        assert!(!view.interaction().tooltip().is_visible());
    }

    #[test]
    fn test_range_change_hides_tooltip() {
        let (mut view, rx) = view();
        view.set_area(Rect::new(0, 0, 40, 20), Rect::new(0, 0, 80, 40));
        view.activate(Instant::now());
        let tag = stats_tag(&rx);
        view.apply_samples(tag, &samples());
        view.on_click(20, 10);

        view.set_range(DateRange::new(date(2024, 2, 1), date(2024, 2, 5)).unwrap());
        assert_eq!(view.interaction().state(), &HoverState::Idle);
        assert!(!view.interaction().tooltip().is_visible());
    }
}
