// ============================================================================
// Module : chart
// ============================================================================
// Cœur du graphique journalier, indépendant du rendu terminal :
// - axis        : pas de l'axe Y
// - geometry    : position des barres, graduations, libellés
// - interaction : survol, clic, tooltip
// - refresh     : rafraîchissement automatique
// - view        : assemblage et cycle de vie
// ============================================================================

pub mod axis;
pub mod geometry;
pub mod interaction;
pub mod refresh;
pub mod view;

pub use axis::{effective_step, gridline_values, step, Y_TICKS};
pub use geometry::{BarPair, ChartLayout, Gridline, Padding, RectF, XTick};
pub use interaction::{BarTarget, HoverState, InteractionController, Tooltip, TooltipContent};
pub use refresh::{RefreshDecision, RefreshScheduler};
pub use view::{rect_f, ChartView, FetchStatus};
