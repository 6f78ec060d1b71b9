// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod bars;      // Widget histogramme
pub mod dashboard; // Rendu de l'écran principal
pub mod events;    // Clavier, souris, ticks
pub mod tooltip;   // Popup du jour survolé

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
