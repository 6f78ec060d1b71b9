// ============================================================================
// Widget : histogramme journalier
// ============================================================================
// Dessine un ChartLayout dans le Buffer ratatui, cellule par cellule :
// - lignes de grille horizontales + libellés Y (nombres abrégés)
// - paires de barres visiteurs / pages vues
// - graduations X et dates du premier et du dernier jour
//
// ALGORITHME (barres) :
// - une colonne appartient à une barre si son centre tombe dans la barre ;
//   une barre plus fine qu'une cellule garde au moins une colonne
// - le haut d'une barre tombe rarement sur une frontière de cellule : la
//   cellule partielle utilise les blocs inférieurs ▁▂▃▄▅▆▇ (huitièmes)
// ============================================================================

use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use crate::chart::{ChartLayout, RectF};
use crate::numbers::format_pretty;

/// Blocs inférieurs, de 1/8 à 8/8 de cellule
const LOWER_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub const VISITORS_COLOR: Color = Color::Rgb(104, 159, 210);
pub const PAGEVIEWS_COLOR: Color = Color::Rgb(34, 113, 177);
const ACTIVE_VISITORS_COLOR: Color = Color::Rgb(150, 195, 235);
const ACTIVE_PAGEVIEWS_COLOR: Color = Color::Rgb(70, 150, 215);
const GRID_COLOR: Color = Color::DarkGray;
const LABEL_COLOR: Color = Color::Gray;

/// Histogramme d'un ChartLayout
pub struct DailyBars<'a> {
    layout: &'a ChartLayout,
    active: Option<usize>,
}

impl<'a> DailyBars<'a> {
    pub fn new(layout: &'a ChartLayout) -> Self {
        Self {
            layout,
            active: None,
        }
    }

    /// Jour survolé, dessiné en couleur plus claire
    pub fn active(mut self, index: Option<usize>) -> Self {
        self.active = index;
        self
    }
}

impl Widget for DailyBars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = self.layout;
        let mut canvas = Canvas { area, buf };

        let inner_left = i64::from(area.x) + layout.padding.left as i64;
        let inner_top = i64::from(area.y) + layout.padding.top as i64;
        let inner_width = layout.inner_width.floor() as i64;
        let inner_rows = layout.inner_height.floor() as i64;
        if inner_width <= 0 || inner_rows <= 0 {
            return;
        }

        // Grille et libellés Y
        let grid_style = Style::default().fg(GRID_COLOR);
        let label_width = (layout.padding.left as usize).saturating_sub(1);
        for gridline in &layout.gridlines {
            let row = inner_top + gridline_row(gridline.y, inner_rows);
            for col in inner_left..inner_left + inner_width {
                canvas.put(col, row, '─', grid_style);
            }
            let label = format!("{:>width$}", format_pretty(gridline.value), width = label_width);
            canvas.text(i64::from(area.x), row, &label, Style::default().fg(LABEL_COLOR));
        }

        // Barres : pages vues puis visiteurs (ordre sans importance, les
        // rectangles ne se recouvrent pas)
        for pair in &layout.bars {
            let active = self.active == Some(pair.index);
            let (visitors_color, pageviews_color) = if active {
                (ACTIVE_VISITORS_COLOR, ACTIVE_PAGEVIEWS_COLOR)
            } else {
                (VISITORS_COLOR, PAGEVIEWS_COLOR)
            };
            let modifier = if active { Modifier::BOLD } else { Modifier::empty() };

            for (rect, color) in [(pair.pageviews, pageviews_color), (pair.visitors, visitors_color)] {
                let style = Style::default().fg(color).add_modifier(modifier);
                canvas.bar(rect, inner_left, inner_top, inner_rows, style);
            }
        }

        // Axe X : graduations puis dates
        let axis_row = inner_top + inner_rows;
        let label_row = axis_row + 1;
        let mut first_label_end = i64::MIN;
        let last_index = layout.x_ticks.len().saturating_sub(1);

        for tick in &layout.x_ticks {
            let col = inner_left + tick.x.floor() as i64;
            if tick.mark {
                canvas.put(col, axis_row, '╵', grid_style);
            }

            let Some(label) = &tick.label else {
                continue;
            };
            let len = label.chars().count() as i64;
            let label_style = Style::default().fg(LABEL_COLOR);

            if tick.index == 0 {
                let start = col.max(i64::from(area.x));
                canvas.text(start, label_row, label, label_style);
                first_label_end = start + len;
            } else if tick.index == last_index {
                let right = i64::from(area.x) + i64::from(area.width);
                let start = (col + 1 - len).min(right - len);
                // Pas de chevauchement avec la date du premier jour
                if start > first_label_end {
                    canvas.text(start, label_row, label, label_style);
                }
            }
        }
    }
}

/// Accès borné au Buffer : rien n'est écrit hors de la zone
///
/// CONCEPT RUST : Emprunt mutable dans une struct
/// - Canvas<'b> emprunte le Buffer le temps du rendu
/// - les coordonnées sont en i64 : une position négative ou trop grande
///   est ignorée au lieu de déborder un u16
struct Canvas<'b> {
    area: Rect,
    buf: &'b mut Buffer,
}

impl Canvas<'_> {
    fn contains(&self, col: i64, row: i64) -> bool {
        col >= i64::from(self.area.left())
            && col < i64::from(self.area.right())
            && row >= i64::from(self.area.top())
            && row < i64::from(self.area.bottom())
    }

    fn put(&mut self, col: i64, row: i64, ch: char, style: Style) {
        if !self.contains(col, row) {
            return;
        }
        if let (Ok(x), Ok(y)) = (u16::try_from(col), u16::try_from(row)) {
            self.buf.get_mut(x, y).set_char(ch).set_style(style);
        }
    }

    fn text(&mut self, col: i64, row: i64, text: &str, style: Style) {
        for (i, ch) in text.chars().enumerate() {
            self.put(col + i as i64, row, ch, style);
        }
    }

    /// Dessine une barre (coordonnées de la zone intérieure)
    fn bar(&mut self, rect: RectF, inner_left: i64, inner_top: i64, inner_rows: i64, style: Style) {
        if rect.height <= 0.0 {
            return;
        }
        for col in bar_columns(rect.x, rect.width) {
            for row in 0..inner_rows {
                if let Some(glyph) = cell_glyph(rect.y, row as f64) {
                    self.put(inner_left + col, inner_top + row, glyph, style);
                }
            }
        }
    }
}

/// Colonnes dont le centre tombe dans [x, x + width[ (au moins une)
///
/// CONCEPT RUST : Range<i64> comme valeur de retour
/// - l'appelant itère directement (`for col in bar_columns(..)`)
pub fn bar_columns(x: f64, width: f64) -> Range<i64> {
    let start = (x - 0.5).ceil() as i64;
    let end = (x + width - 0.5).ceil() as i64;
    if start < end {
        start..end
    } else {
        let center = (x + 0.5 * width).floor() as i64;
        center..center + 1
    }
}

/// Caractère de la cellule `row` pour une barre dont le haut est en `top`
///
/// La barre descend jusqu'à la ligne de base : seule la couverture du haut
/// de la cellule compte.
pub fn cell_glyph(top: f64, row: f64) -> Option<char> {
    let coverage = (row + 1.0 - top.max(row)).clamp(0.0, 1.0);
    let eighths = (coverage * 8.0).round() as usize;
    if eighths == 0 {
        None
    } else {
        Some(LOWER_BLOCKS[eighths - 1])
    }
}

/// Ligne d'une ligne de grille ; la ligne de base va sur la dernière rangée
pub fn gridline_row(y: f64, inner_rows: i64) -> i64 {
    (y.floor() as i64).clamp(0, inner_rows - 1)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Padding;
    use crate::models::{Dataset, DateRange, SparseSample};
    use chrono::NaiveDate;

    fn layout(width: u16, height: u16) -> ChartLayout {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        )
        .unwrap();
        let mut dataset = Dataset::skeleton(range);
        dataset.merge(&[SparseSample::new("2024-01-02", 10u64, 5u64)]);
        ChartLayout::compute(&dataset, f64::from(width), f64::from(height), Padding::TERMINAL).unwrap()
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf.get(x, y).symbol()).collect()
    }

    #[test]
    fn test_bar_columns() {
        assert_eq!(bar_columns(11.2, 4.8), 11..16);
        // Plus fine qu'une cellule : une colonne quand même
        assert_eq!(bar_columns(3.1, 0.3), 3..4);
    }

    #[test]
    fn test_cell_glyph_partial_top() {
        assert_eq!(cell_glyph(0.0, 3.0), Some('█'));
        assert_eq!(cell_glyph(3.5, 3.0), Some('▄'));
        assert_eq!(cell_glyph(3.97, 3.0), None);
        assert_eq!(cell_glyph(5.0, 3.0), None);
    }

    #[test]
    fn test_gridline_row_clamps_baseline() {
        assert_eq!(gridline_row(17.0, 17), 16);
        assert_eq!(gridline_row(0.0, 17), 0);
    }

    #[test]
    fn test_render_draws_bars_axis_and_labels() {
        let layout = layout(40, 20);
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        DailyBars::new(&layout).active(Some(1)).render(area, &mut buf);

        // Barre des pages vues du 2 janvier : pleine hauteur (ligne 1 = haut)
        assert_eq!(buf.get(25, 1).symbol(), "█");
        assert_eq!(buf.get(25, 17).symbol(), "█");
        // Pas de barre le 1er janvier (0 pages vues)
        assert_ne!(buf.get(10, 10).symbol(), "█");

        // Libellés X : premier et dernier jour
        let labels = row_text(&buf, 19);
        assert!(labels.contains("Jan 1, 2024"), "{}", labels);
        assert!(labels.contains("Jan 3"), "{}", labels);

        // Libellés Y tous les 3 (0, 3, 6, 9) : 3 tombe sur la ligne 12
        let top_grid: String = (0..6).map(|x| buf.get(x, 12).symbol()).collect();
        assert_eq!(top_grid.trim(), "3");
    }

    #[test]
    fn test_render_in_tiny_area_does_not_panic() {
        let layout = layout(40, 20);
        let area = Rect::new(0, 0, 5, 3);
        let mut buf = Buffer::empty(area);
        DailyBars::new(&layout).render(area, &mut buf);
    }
}
