// ============================================================================
// Tooltip : popup au-dessus de la barre survolée
// ============================================================================
// Le contrôleur d'interaction décide du contenu, de la visibilité et de la
// position (en cellules flottantes). Ici on arrondit à la grille du
// terminal, on efface le fond (Clear) et on dessine le cadre.
// ============================================================================

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::chart::{RectF, Tooltip};
use crate::ui::bars::{PAGEVIEWS_COLOR, VISITORS_COLOR};

/// Arrondit un rectangle flottant à la grille, borné par `bounds`
pub fn snap_to_cells(rect: RectF, bounds: Rect) -> Rect {
    let x = rect.x.round().max(0.0) as u16;
    let y = rect.y.round().max(0.0) as u16;
    let width = rect.width.round().max(0.0) as u16;
    let height = rect.height.round().max(0.0) as u16;
    Rect::new(x, y, width, height).intersection(bounds)
}

/// Dessine le tooltip s'il est visible
pub fn render_tooltip(frame: &mut Frame, tooltip: &Tooltip) {
    if !tooltip.is_visible() {
        return;
    }
    let Some(content) = tooltip.content() else {
        return;
    };

    let area = snap_to_cells(tooltip.rect(), frame.size());
    if area.width < 3 || area.height < 3 {
        return;
    }

    let [heading, visitors, pageviews] = content.lines();
    let text = vec![
        Line::from(Span::styled(heading, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(visitors, Style::default().fg(VISITORS_COLOR))),
        Line::from(Span::styled(pageviews, Style::default().fg(PAGEVIEWS_COLOR))),
    ];

    let block = Block::default().borders(Borders::ALL);
    let paragraph = Paragraph::new(text).block(block);

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_rounds_and_clamps() {
        let bounds = Rect::new(0, 0, 80, 24);
        assert_eq!(snap_to_cells(RectF::new(10.4, 2.6, 16.0, 5.0), bounds), Rect::new(10, 3, 16, 5));

        let clipped = snap_to_cells(RectF::new(70.0, 22.0, 16.0, 5.0), bounds);
        assert_eq!(clipped, Rect::new(70, 22, 10, 2));
    }
}
