// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Écran unique, découpé verticalement :
//
//   ┌ header ─ preset, plage, totaux ─────────────┐
//   ┌ chart ── histogramme visiteurs / pages vues ┐
//   ┌ posts ── classement des articles ───────────┐
//   ┌ footer ─ ligne d'état + raccourcis ─────────┐
//
// Le tooltip est dessiné en dernier, par-dessus le reste.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, StatusLine};
use crate::numbers::{format_grouped, format_pretty};
use crate::ui::bars::{DailyBars, PAGEVIEWS_COLOR, VISITORS_COLOR};
use crate::ui::tooltip::render_tooltip;

/// Bornes de la hauteur automatique du graphique
const MIN_CHART_HEIGHT: u16 = 10;
const MAX_CHART_HEIGHT: u16 = 24;

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 4;

/// Zones de l'écran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub header: Rect,
    /// Cadre du graphique
    pub chart: Rect,
    /// Intérieur du cadre : zone donnée à ChartLayout
    pub chart_inner: Rect,
    pub posts: Rect,
    pub footer: Rect,
}

/// Hauteur du graphique : fixée par la config, sinon la moitié de l'écran
/// bornée à [10, 24] lignes
pub fn chart_height(frame_height: u16, configured: Option<u16>) -> u16 {
    configured.unwrap_or_else(|| (frame_height / 2).clamp(MIN_CHART_HEIGHT, MAX_CHART_HEIGHT))
}

/// Découpe l'écran
///
/// Appelée par la boucle principale avant le rendu (pour que la souris
/// utilise la même géométrie que l'affichage) et par le rendu lui-même.
pub fn areas(size: Rect, configured_height: Option<u16>) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(chart_height(size.height, configured_height)),
            Constraint::Min(3),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(size);

    Areas {
        header: chunks[0],
        chart: chunks[1],
        chart_inner: chart_block().inner(chunks[1]),
        posts: chunks[2],
        footer: chunks[3],
    }
}

fn chart_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let areas = areas(frame.size(), app.chart_height);

    render_header(frame, app, areas.header);
    render_chart(frame, app, areas.chart, areas.chart_inner);
    render_posts(frame, app, areas.posts);
    render_footer(frame, app, areas.footer);

    // CONCEPT : Ordre de dessin = profondeur
    // - le tooltip est dessiné en dernier pour passer au-dessus de tout
    //   (il peut déborder sur l'en-tête ou le classement)
    render_tooltip(frame, app.chart.interaction().tooltip());
}

// ============================================================================
// Header : plage et totaux
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Pageviews ")
        .title_alignment(Alignment::Center);

    let dataset = app.chart.dataset();
    let labels = app.chart.interaction().labels();

    let line = Line::from(vec![
        Span::styled(
            app.preset.label(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(app.chart.range().to_string()),
        Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{} {}", format_pretty(dataset.total_visitors()), labels.visitors),
            Style::default().fg(VISITORS_COLOR).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} {}", format_pretty(dataset.total_pageviews()), labels.pageviews),
            Style::default().fg(PAGEVIEWS_COLOR).add_modifier(Modifier::BOLD),
        ),
    ]);

    let paragraph = Paragraph::new(line)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Graphique
// ============================================================================

fn render_chart(frame: &mut Frame, app: &App, area: Rect, inner: Rect) {
    let labels = app.chart.interaction().labels();
    let legend = Line::from(vec![
        Span::raw(" "),
        Span::styled("■ ", Style::default().fg(VISITORS_COLOR)),
        Span::raw(format!("{}  ", labels.visitors)),
        Span::styled("■ ", Style::default().fg(PAGEVIEWS_COLOR)),
        Span::raw(format!("{} ", labels.pageviews)),
    ]);
    frame.render_widget(chart_block().title(legend), area);

    match app.chart.layout() {
        Some(layout) => {
            let widget = DailyBars::new(&layout).active(app.chart.interaction().active_index());
            frame.render_widget(widget, app.chart.area().intersection(inner));
        }
        None => {
            // Pas d'histogramme (un seul jour, ou zone trop petite) : aucune
            // barre n'est dessinée, mais le cadre reste pour que la mise en
            // page ne saute pas. Un seul jour se résume à ses deux totaux.
            let dataset = app.chart.dataset();
            let message = if dataset.len() == 1 {
                format!(
                    "{} {} · {} {}",
                    format_grouped(dataset.total_visitors()),
                    labels.visitors,
                    format_grouped(dataset.total_pageviews()),
                    labels.pageviews
                )
            } else {
                "Terminal too small for the chart".to_string()
            };
            let paragraph = Paragraph::new(Line::from(Span::styled(
                message,
                Style::default().fg(Color::Gray),
            )))
            .alignment(Alignment::Center);
            frame.render_widget(paragraph, inner);
        }
    }
}

// ============================================================================
// Classement des articles
// ============================================================================

fn render_posts(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.selected_post() {
        Some(post) if !post.post_permalink.is_empty() => format!(" Top posts · {} ", post.post_permalink),
        _ => " Top posts ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    if app.posts.is_empty() {
        let (message, color) = match &app.posts_error {
            Some(error) => (format!("Error: {}", error), Color::Red),
            None if app.chart.is_loading() => ("Loading...".to_string(), Color::Gray),
            None => ("No posts viewed in this range".to_string(), Color::Gray),
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(message, Style::default().fg(color))))
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let labels = app.chart.interaction().labels();
    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Post"),
        Cell::from(labels.visitors.clone()),
        Cell::from(labels.pageviews.clone()),
    ])
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .posts
        .iter()
        .enumerate()
        .map(|(rank, post)| {
            Row::new(vec![
                Cell::from(format!("{}", rank + 1)),
                Cell::from(post.display_title()),
                Cell::from(format_grouped(post.visitors())),
                Cell::from(format_grouped(post.pageviews())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default().with_selected(Some(app.selected_post));
    frame.render_stateful_widget(table, area, &mut state);
}

// ============================================================================
// Footer : état + raccourcis
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let status = match app.status_line() {
        StatusLine::ConfirmQuit => Line::from(vec![
            Span::styled(
                "⚠  Press ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " again to quit, any other key to cancel ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]),
        StatusLine::Loading => Line::from(Span::styled("⏳ Loading...", Style::default().fg(Color::Gray))),
        StatusLine::Error(error) => Line::from(Span::styled(
            format!("✗ {}", error),
            Style::default().fg(Color::Red),
        )),
        StatusLine::Anomalies(count) => Line::from(Span::styled(
            format!("⚠ {} sample(s) outside the displayed range were ignored", count),
            Style::default().fg(Color::Yellow),
        )),
        StatusLine::Ready => Line::from(Span::styled("✓ Up to date", Style::default().fg(Color::Green))),
    };

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let shortcuts = Line::from(vec![
        Span::styled("[q]", key),
        Span::raw(" Quit  "),
        Span::styled("[h l]", key),
        Span::raw(" Preset  "),
        Span::styled("[[ ]]", key),
        Span::raw(" Shift range  "),
        Span::styled("[r]", key),
        Span::raw(" Refresh  "),
        Span::styled("[↑↓ / j k]", key),
        Span::raw(" Posts  "),
        Span::styled("[Esc]", key),
        Span::raw(" Close tooltip"),
    ]);

    let paragraph = Paragraph::new(vec![status, shortcuts])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{DateRange, RangePreset, SparseSample};
    use chrono::NaiveDate;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::mpsc;
    use std::time::Instant;

    #[test]
    fn test_chart_height() {
        assert_eq!(chart_height(60, None), 24);
        assert_eq!(chart_height(30, None), 15);
        assert_eq!(chart_height(12, None), 10);
        assert_eq!(chart_height(60, Some(8)), 8);
    }

    #[test]
    fn test_areas_stack_vertically() {
        let a = areas(Rect::new(0, 0, 100, 40), None);
        assert_eq!(a.header.height, HEADER_HEIGHT);
        assert_eq!(a.chart.y, HEADER_HEIGHT);
        assert_eq!(a.chart.height, 20);
        assert_eq!(a.chart_inner, Rect::new(1, HEADER_HEIGHT + 1, 98, 18));
        assert_eq!(a.footer.height, FOOTER_HEIGHT);
        assert_eq!(a.footer.bottom(), 40);
    }

    /// Dessine l'écran 100x40 et le renvoie sous forme de texte
    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();

        let buffer = terminal.backend().buffer();
        (0..40)
            .map(|y| (0..100).map(|x| buffer.get(x, y).symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_single_day_shows_totals_without_bars() {
        let (tx, rx) = mpsc::channel();
        let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let mut app = App::new(DateRange::single_day(day), RangePreset::Custom, &Config::default(), tx);

        let size = Rect::new(0, 0, 100, 40);
        let a = areas(size, app.chart_height);
        app.chart.set_area(a.chart_inner, size);
        app.start(Instant::now());
        let tag = rx.try_iter().last().unwrap().tag();
        app.handle_outcome(crate::api::FetchOutcome::StatsLoaded {
            tag,
            samples: vec![SparseSample::new("2024-01-03", 1250u64, 400u64)],
        });

        let screen = draw(&app);
        assert!(screen.contains("400 Visitors · 1 250 Pageviews"), "{}", screen);
        assert!(!screen.contains("█"));
    }

    #[test]
    fn test_render_full_screen() {
        let (tx, rx) = mpsc::channel();
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        )
        .unwrap();
        let mut app = App::new(range, RangePreset::Custom, &Config::default(), tx);

        let size = Rect::new(0, 0, 100, 40);
        let a = areas(size, app.chart_height);
        app.chart.set_area(a.chart_inner, size);
        app.start(Instant::now());
        let tag = rx.try_iter().last().unwrap().tag();
        app.handle_outcome(crate::api::FetchOutcome::StatsLoaded {
            tag,
            samples: vec![SparseSample::new("2024-01-03", 1250u64, 400u64)],
        });

        let screen = draw(&app);
        assert!(screen.contains("Custom"));
        assert!(screen.contains("1.3K Pageviews"));
        assert!(screen.contains("Jan 1, 2024"));
        assert!(screen.contains("█"));
    }
}
