// ============================================================================
// Gestion des événements
// ============================================================================
// Traduit les événements crossterm en événements de l'application :
// - clavier (presets, décalage de plage, rafraîchissement, sortie)
// - souris (survol et clic sur les barres, en cellules du terminal)
// - tick régulier (250 ms) qui pilote le rafraîchissement automatique
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind,
};

/// Intervalle de poll : un Tick est émis si rien n'arrive
pub const TICK_RATE: Duration = Duration::from_millis(250);

/// Événements de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Pointeur déplacé (survol)
    MouseMove { column: u16, row: u16 },

    /// Clic gauche
    Click { column: u16, row: u16 },

    /// Terminal redimensionné
    Resize,

    /// Tick régulier
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// Si rien n'arrive pendant TICK_RATE, retourne Event::Tick.
    pub fn next(&self) -> Result<Event> {
        if event::poll(TICK_RATE)? {
            Ok(translate(event::read()?))
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Convertit un événement crossterm
///
/// Sur certains OS on reçoit Press ET Release : seul Press compte.
/// Les glissés comptent comme des survols.
pub fn translate(raw: CrosstermEvent) -> Event {
    match raw {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
        CrosstermEvent::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => Event::MouseMove {
                column: mouse.column,
                row: mouse.row,
            },
            MouseEventKind::Down(MouseButton::Left) => Event::Click {
                column: mouse.column,
                row: mouse.row,
            },
            _ => Event::Tick,
        },
        CrosstermEvent::Resize(_, _) => Event::Resize,
        _ => Event::Tick,
    }
}

// ============================================================================
// Helpers : touches
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        _ => None,
    }
}

/// 'q' : quitter (deux pressions)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// Échap : masque le tooltip
pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up | KeyCode::Char('k')))
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down | KeyCode::Char('j')))
}

/// 'l' ou flèche droite : preset suivant
pub fn is_next_preset_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('l') | KeyCode::Right))
}

/// 'h' ou flèche gauche : preset précédent
pub fn is_previous_preset_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('h') | KeyCode::Left))
}

/// ']' : plage suivante
pub fn is_shift_forward_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(']')))
}

/// '[' : plage précédente
pub fn is_shift_backward_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('[')))
}

/// 'r' : rafraîchissement manuel
pub fn is_refresh_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('r') | KeyCode::Char('R')))
}

// ============================================================================
// Tests unitaires
// ============================================================================
