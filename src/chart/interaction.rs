// ============================================================================
// Interaction : survol des barres et tooltip
// ============================================================================
// Machine à états :
//
//   Idle ──survol / clic d'une barre──▶ Hovering
//   Hovering ──survol d'une autre barre──▶ Hovering
//   Hovering ──sortie de la barre (non épinglée)──▶ Idle
//   Hovering ──clic hors du graphique et du tooltip──▶ Idle
//
// Un clic sur une barre épingle le tooltip : il reste affiché quand le
// pointeur quitte la barre, jusqu'à un clic à l'extérieur.
//
// Le tooltip est un nœud unique possédé par le contrôleur : attaché à
// l'activation de la vue, détaché au démontage. Lui seul modifie sa
// visibilité et son contenu.
// ============================================================================

use tracing::{debug, trace};

use crate::chart::geometry::RectF;
use crate::config::Labels;
use crate::models::DayBucket;
use crate::numbers::format_grouped;

/// Format de la date dans l'en-tête du tooltip ("Jan 2, 2024")
pub const TOOLTIP_DATE_FORMAT: &str = "%b %-d, %Y";

/// Bordures + marge intérieure horizontale du tooltip
const TOOLTIP_CHROME_WIDTH: usize = 4;

/// Contenu du tooltip pour un jour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipContent {
    pub heading: String,
    pub visitors: u64,
    pub pageviews: u64,
    pub visitors_label: String,
    pub pageviews_label: String,
}

impl TooltipContent {
    pub fn from_bucket(bucket: &DayBucket, labels: &Labels) -> Self {
        Self {
            heading: bucket.date.format(TOOLTIP_DATE_FORMAT).to_string(),
            visitors: bucket.visitors,
            pageviews: bucket.pageviews,
            visitors_label: labels.visitors.clone(),
            pageviews_label: labels.pageviews.clone(),
        }
    }

    /// Lignes affichées : en-tête, visiteurs, pages vues
    pub fn lines(&self) -> [String; 3] {
        [
            self.heading.clone(),
            format!("{} {}", format_grouped(self.visitors), self.visitors_label),
            format!("{} {}", format_grouped(self.pageviews), self.pageviews_label),
        ]
    }

    /// Taille en cellules (bordures comprises)
    pub fn size(&self) -> (f64, f64) {
        let lines = self.lines();
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        ((widest + TOOLTIP_CHROME_WIDTH) as f64, (lines.len() + 2) as f64)
    }
}

/// Place le tooltip au-dessus de la paire de barres, centré horizontalement
///
/// `anchor` est la boîte de la paire à l'écran ; le tooltip est décalé de la
/// moitié de sa largeur puis d'une largeur de barre (le centre de la paire),
/// et posé juste au-dessus. Il reste dans `viewport`.
pub fn position_tooltip(anchor: RectF, size: (f64, f64), bar_width: f64, viewport: RectF) -> RectF {
    let (width, height) = size;

    let mut x = anchor.x - 0.5 * width + bar_width;
    x = x.min(viewport.right() - width).max(viewport.x);

    let y = (anchor.y - height).max(viewport.y);

    RectF::new(x, y, width, height)
}

/// Nœud tooltip, unique pour la durée de vie de la vue
#[derive(Debug, Default)]
pub struct Tooltip {
    attached: bool,
    visible: bool,
    content: Option<TooltipContent>,
    rect: RectF,
}

impl Tooltip {
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Détache le nœud ; retourne false s'il l'était déjà
    pub fn detach(&mut self) -> bool {
        let was_attached = self.attached;
        self.attached = false;
        self.hide();
        was_attached
    }

    pub fn show(&mut self, content: TooltipContent, rect: RectF) {
        if !self.attached {
            return;
        }
        self.content = Some(content);
        self.rect = rect;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_visible(&self) -> bool {
        self.attached && self.visible
    }

    pub fn content(&self) -> Option<&TooltipContent> {
        self.content.as_ref()
    }

    /// Position du tooltip à l'écran (valide quand il est visible)
    pub fn rect(&self) -> RectF {
        self.rect
    }
}

/// Barre visée par le pointeur, en coordonnées écran
#[derive(Debug, Clone, PartialEq)]
pub struct BarTarget {
    pub index: usize,
    pub bucket: DayBucket,
    /// Boîte de la paire de barres à l'écran
    pub anchor: RectF,
    pub bar_width: f64,
}

/// État de survol
///
/// CONCEPT RUST : Enum avec données
/// - Idle ne porte rien ; Hovering porte le jour, l'ancre et l'épinglage
/// - impossible d'avoir un "index survolé" sans être en Hovering
#[derive(Debug, Clone, PartialEq)]
pub enum HoverState {
    Idle,
    Hovering {
        index: usize,
        bucket: DayBucket,
        anchor: RectF,
        /// Épinglé par un clic : la sortie du pointeur ne le masque pas
        pinned: bool,
    },
}

/// Contrôleur du survol et propriétaire du tooltip
#[derive(Debug)]
pub struct InteractionController {
    state: HoverState,
    tooltip: Tooltip,
    labels: Labels,
}

impl InteractionController {
    pub fn new(labels: Labels) -> Self {
        Self {
            state: HoverState::Idle,
            tooltip: Tooltip::default(),
            labels,
        }
    }

    /// Attache le tooltip (activation de la vue)
    pub fn activate(&mut self) {
        self.tooltip.attach();
    }

    /// Détache le tooltip et revient à Idle (démontage de la vue)
    pub fn teardown(&mut self) -> bool {
        self.state = HoverState::Idle;
        self.tooltip.detach()
    }

    pub fn state(&self) -> &HoverState {
        &self.state
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Index du jour survolé
    pub fn active_index(&self) -> Option<usize> {
        match self.state {
            HoverState::Hovering { index, .. } => Some(index),
            HoverState::Idle => None,
        }
    }

    /// Déplacement du pointeur : `target` est la barre sous le pointeur
    pub fn pointer_move(&mut self, target: Option<BarTarget>, viewport: RectF) {
        // CONCEPT RUST : match sur un tuple
        // - (barre sous le pointeur, état courant) : chaque transition de la
        //   machine à états est une branche, le compilateur vérifie qu'aucun
        //   cas n'est oublié
        match (target, &self.state) {
            (Some(t), HoverState::Hovering { index, .. }) if *index == t.index => {}
            (Some(t), _) => self.enter(t, false, viewport),
            (None, HoverState::Hovering { pinned: false, .. }) => {
                trace!("Pointer left bar");
                self.reset();
            }
            (None, _) => {}
        }
    }

    /// Clic à la position (x, y) de l'écran
    ///
    /// Sur une barre : affiche et épingle. Ailleurs dans le graphique ou
    /// dans le tooltip : ignoré. Partout ailleurs : masque le tooltip.
    pub fn click(&mut self, x: f64, y: f64, target: Option<BarTarget>, chart_area: RectF, viewport: RectF) {
        if let Some(t) = target {
            self.enter(t, true, viewport);
            return;
        }

        let inside_tooltip = self.tooltip.is_visible() && self.tooltip.rect().contains(x, y);
        if chart_area.contains(x, y) || inside_tooltip {
            trace!(x, y, "Click inside chart or tooltip ignored");
            return;
        }

        debug!(x, y, "Click outside chart, hiding tooltip");
        self.reset();
    }

    /// Met à jour la barre survolée après un nouveau merge
    ///
    /// Garde l'épinglage ; si la barre a disparu, revient à Idle.
    pub fn retarget(&mut self, target: Option<BarTarget>, viewport: RectF) {
        // CONCEPT RUST : let-else
        // - déstructure ou sort de la fonction, sans imbriquer un if let
        let HoverState::Hovering { pinned, .. } = self.state else {
            return;
        };
        match target {
            Some(t) => self.enter(t, pinned, viewport),
            None => self.reset(),
        }
    }

    /// Retour à Idle, tooltip masqué (clic extérieur, Échap, changement de plage)
    pub fn reset(&mut self) {
        self.state = HoverState::Idle;
        self.tooltip.hide();
    }

    fn enter(&mut self, target: BarTarget, pinned: bool, viewport: RectF) {
        let content = TooltipContent::from_bucket(&target.bucket, &self.labels);
        let rect = position_tooltip(target.anchor, content.size(), target.bar_width, viewport);

        debug!(index = target.index, date = %target.bucket.date, pinned, "Showing tooltip");
        self.tooltip.show(content, rect);
        self.state = HoverState::Hovering {
            index: target.index,
            bucket: target.bucket,
            anchor: target.anchor,
            pinned,
        };
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
