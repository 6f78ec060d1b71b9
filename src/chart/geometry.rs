// ============================================================================
// Géométrie du graphique
// ============================================================================
// Transforme (dataset, largeur, hauteur, marges) en coordonnées :
// - une paire de barres par jour (visiteurs à gauche, pages vues à droite)
// - les lignes horizontales de l'axe Y
// - les graduations et libellés de l'axe X
//
// Les unités sont abstraites (f64) : des cellules de terminal pour le rendu
// ratatui, mais le calcul ne dépend pas du backend.
//
// Toutes les positions de barres et de lignes sont relatives à la zone
// intérieure (après les marges). `to_outer` ajoute les marges.
// ============================================================================

use crate::chart::axis::{effective_step, gridline_values, Y_TICKS};
use crate::models::Dataset;

/// À partir de ce nombre de jours, seules les graduations hebdomadaires sont marquées
pub const LONG_RANGE_DAYS: usize = 90;

/// Espacement des graduations pour les longues plages
pub const LONG_RANGE_MARK_EVERY: usize = 7;

/// Format du libellé du premier jour ("Jan 1, 2024")
pub const FIRST_LABEL_FORMAT: &str = "%b %-d, %Y";

/// Format du libellé du dernier jour ("Jan 3")
pub const LAST_LABEL_FORMAT: &str = "%b %-d";

/// Part de la case occupée par la paire de barres
const BARS_FILL: f64 = 0.9;

/// Marges autour de la zone intérieure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Padding {
    /// Marges pour un rendu en cellules : 7 colonnes pour les valeurs de
    /// l'axe Y, 2 lignes en bas pour les graduations et les dates
    pub const TERMINAL: Padding = Padding {
        left: 7.0,
        right: 1.0,
        top: 1.0,
        bottom: 2.0,
    };
}

impl Default for Padding {
    fn default() -> Self {
        Padding::TERMINAL
    }
}

/// Rectangle en coordonnées flottantes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectF {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Point dans le rectangle (bord droit et bas exclus)
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Recouvrement d'aire non nulle
    pub fn intersects(&self, other: &RectF) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }

    /// Plus petit rectangle contenant les deux
    pub fn union(&self, other: &RectF) -> RectF {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        RectF {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> RectF {
        RectF {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Ligne horizontale de l'axe Y
#[derive(Debug, Clone, PartialEq)]
pub struct Gridline {
    pub value: u64,
    /// Ordonnée dans la zone intérieure
    pub y: f64,
}

/// Graduation de l'axe X (une par jour)
#[derive(Debug, Clone, PartialEq)]
pub struct XTick {
    pub index: usize,
    /// Abscisse du centre de la case, dans la zone intérieure
    pub x: f64,
    /// Trait de graduation affiché
    pub mark: bool,
    /// Libellé de date (premier et dernier jour uniquement)
    pub label: Option<String>,
}

/// Paire de barres d'un jour (jamais créée pour un jour sans pages vues)
#[derive(Debug, Clone, PartialEq)]
pub struct BarPair {
    pub index: usize,
    pub visitors: RectF,
    pub pageviews: RectF,
}

impl BarPair {
    /// Boîte englobante de la paire : sert d'ancre au tooltip, pas au survol
    pub fn bounds(&self) -> RectF {
        self.visitors.union(&self.pageviews)
    }

    /// Les deux rectangles réellement peints
    ///
    /// Le vide au-dessus de la barre la plus courte n'appartient pas à la
    /// paire : seul ce qui est dessiné réagit à la souris.
    pub fn painted(&self) -> [RectF; 2] {
        [self.visitors, self.pageviews]
    }
}

/// Géométrie complète d'un rendu
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub padding: Padding,
    pub inner_width: f64,
    pub inner_height: f64,
    /// Largeur de la case d'un jour
    pub tick_width: f64,
    /// Largeur d'une barre (la paire fait le double)
    pub bar_width: f64,
    /// Décalage de la paire dans sa case, pour la centrer
    pub bar_padding: f64,
    pub y_max: u64,
    pub step: u64,
    pub gridlines: Vec<Gridline>,
    pub x_ticks: Vec<XTick>,
    pub bars: Vec<BarPair>,
}

impl ChartLayout {
    /// Calcule la géométrie, ou None quand il n'y a rien à dessiner
    ///
    /// CONCEPT RUST : Option comme "rien à dessiner"
    /// - l'appelant doit traiter le cas None (message à la place du graphique)
    /// - pas de ChartLayout à moitié valide avec des largeurs négatives
    ///
    /// Rien n'est dessiné pour 0 ou 1 bucket (un seul point n'est pas un
    /// histogramme) ni pour une zone intérieure vide.
    pub fn compute(dataset: &Dataset, width: f64, height: f64, padding: Padding) -> Option<Self> {
        let ticks = dataset.len();
        if ticks <= 1 {
            return None;
        }

        let inner_width = width - padding.left - padding.right;
        let inner_height = height - padding.top - padding.bottom;
        if !(inner_width > 0.0 && inner_height > 0.0) {
            return None;
        }

        let tick_width = inner_width / ticks as f64;
        let mut layout = ChartLayout {
            width,
            height,
            padding,
            inner_width,
            inner_height,
            tick_width,
            bar_width: BARS_FILL * tick_width * 0.5,
            bar_padding: (1.0 - BARS_FILL) * 0.5 * tick_width,
            y_max: dataset.y_max(),
            step: effective_step(dataset.y_max(), Y_TICKS),
            gridlines: Vec::new(),
            x_ticks: Vec::with_capacity(ticks),
            bars: Vec::new(),
        };

        layout.gridlines = gridline_values(layout.y_max)
            .into_iter()
            .map(|value| Gridline { value, y: layout.y(value) })
            .collect();

        let last = ticks - 1;
        for (i, bucket) in dataset.buckets().iter().enumerate() {
            let label = if i == 0 {
                Some(bucket.date.format(FIRST_LABEL_FORMAT).to_string())
            } else if i == last {
                Some(bucket.date.format(LAST_LABEL_FORMAT).to_string())
            } else {
                None
            };

            layout.x_ticks.push(XTick {
                index: i,
                x: layout.x(i) + 0.5 * tick_width,
                mark: ticks < LONG_RANGE_DAYS || i % LONG_RANGE_MARK_EVERY == 0,
                label,
            });

            // Une barre de hauteur nulle ne se voit pas : on ne la crée pas.
            // Un jour sans pages vues n'a donc ni barre ni tooltip.
            if bucket.pageviews == 0 {
                continue;
            }

            let x = layout.x(i) + layout.bar_padding;
            layout.bars.push(BarPair {
                index: i,
                visitors: layout.bar_rect(x, bucket.visitors),
                pageviews: layout.bar_rect(x + layout.bar_width, bucket.pageviews),
            });
        }

        Some(layout)
    }

    /// Abscisse gauche de la case du jour `index`
    ///
    /// CONCEPT : Position = index × largeur
    /// - pas d'accumulation (x précédent + largeur) : pas de dérive d'arrondi
    /// - barres, graduations et survol utilisent tous cette même fonction
    pub fn x(&self, index: usize) -> f64 {
        index as f64 * self.tick_width
    }

    /// Ordonnée d'une valeur : 0 en haut (y_max), inner_height en bas (0)
    ///
    /// Avec y_max == 0 tout est sur la ligne de base.
    pub fn y(&self, value: u64) -> f64 {
        if self.y_max == 0 {
            return self.inner_height;
        }
        let value = value.min(self.y_max) as f64;
        self.inner_height * (1.0 - value / self.y_max as f64)
    }

    fn bar_rect(&self, x: f64, value: u64) -> RectF {
        let y = self.y(value);
        RectF::new(x, y, self.bar_width, self.inner_height - y)
    }

    /// Passe d'un rectangle de la zone intérieure aux coordonnées du graphique
    pub fn to_outer(&self, rect: RectF) -> RectF {
        rect.translate(self.padding.left, self.padding.top)
    }

    /// Paire de barres sous un point (coordonnées du graphique, marges comprises)
    pub fn bar_at(&self, x: f64, y: f64) -> Option<&BarPair> {
        self.bars
            .iter()
            .find(|pair| pair.painted().iter().any(|r| self.to_outer(*r).contains(x, y)))
    }

    /// Paire de barres touchant une cellule du terminal
    ///
    /// Une barre plus fine qu'une cellule reste atteignable : on teste le
    /// recouvrement avec la cellule entière plutôt que son centre.
    pub fn bar_in_cell(&self, cell: RectF) -> Option<&BarPair> {
        self.bars
            .iter()
            .find(|pair| pair.painted().iter().any(|r| self.to_outer(*r).intersects(&cell)))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
