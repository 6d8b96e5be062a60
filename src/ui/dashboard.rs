// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine les modèles de vue produits par render.rs :
//
//   ┌ header ─────────────────────────────┐
//   │ stats : aujourd'hui | semaine | mois │
//   │ table des signaux                    │
//   └ footer : message / raccourcis ──────┘
//
// Aucune décision métier ici : couleurs et libellés viennent des view models.
//
// CONCEPTS RATATUI :
// 1. Layout : découpage vertical puis horizontal (cartes)
// 2. Table + TableState : la sélection est portée par un état de rendu
// 3. Clear : efface la zone avant de dessiner l'overlay
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::{App, NoticeKind, Screen};
use crate::coordinator::VoteState;
use crate::models::Direction;
use crate::render::{
    render_signals_panel, render_stats_panel, SignalRow, SignalsView, StatsCard, StatsView, Tone,
    VoteButton,
};

const ALREADY_VOTED_LABEL: &str = "✓ Déjà voté";
const IN_FLIGHT_LABEL: &str = "… Envoi";

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);
    render_stats(frame, app, chunks[1]);
    render_signals(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    if let Screen::ComboDetails { signal_id } = &app.current_screen {
        render_combo_details(frame, app, signal_id);
    }
}

/// Header, cartes de stats, table, footer
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

fn border_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
}

fn render_header(frame: &mut Frame, area: Rect) {
    let block = border_block(" SignalBoard ").title_alignment(Alignment::Center);

    let text = Line::from(Span::styled(
        "Signaux de trading : votez win / lose",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ));

    frame.render_widget(Paragraph::new(text).block(block).alignment(Alignment::Center), area);
}

// ============================================================================
// Statistiques
// ============================================================================

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let cards = match render_stats_panel(&app.store) {
        StatsView::Cards(cards) => cards,
        StatsView::Loading => {
            render_placeholder(frame, area, " Statistiques ", "Chargement...", Color::Gray);
            return;
        }
        StatsView::Unavailable { message } => {
            render_placeholder(frame, area, " Statistiques ", message, Color::Red);
            return;
        }
    };

    let columns = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    for (card, column) in cards.iter().zip(columns.iter()) {
        render_stats_card(frame, card, *column);
    }
}

fn render_stats_card(frame: &mut Frame, card: &StatsCard, area: Rect) {
    let title = format!(" {} ", card.label);
    let lines = vec![
        Line::from(vec![Span::raw("Total     "), Span::styled(card.total.as_str(), bold(Color::White))]),
        Line::from(vec![Span::raw("Win/Lose  "), Span::styled(
            format!("{} / {}", card.wins, card.losses),
            bold(Color::White),
        )]),
        Line::from(vec![Span::raw("Win rate  "), Span::styled(
            format!("{}%", card.win_rate),
            bold(Color::Yellow),
        )]),
    ];

    frame.render_widget(Paragraph::new(lines).block(border_block(&title)), area);
}

// ============================================================================
// Table des signaux
// ============================================================================

fn render_signals(frame: &mut Frame, app: &App, area: Rect) {
    const TITLE: &str = " Signaux actifs ";

    let rows = match render_signals_panel(&app.store, &app.ledger, &app.utc_offset) {
        SignalsView::Table(rows) => rows,
        SignalsView::Loading => {
            render_placeholder(frame, area, TITLE, "Chargement des signaux...", Color::Gray);
            return;
        }
        SignalsView::Empty { message } => {
            render_placeholder(frame, area, TITLE, message, Color::Gray);
            return;
        }
        SignalsView::Unavailable { message } => {
            render_placeholder(frame, area, TITLE, message, Color::Red);
            return;
        }
    };

    let header = Row::new(
        ["Heure", "Coin", "Dir", "Entry", "TP", "SL", "R:R", "Combo", "Votes", ""]
            .into_iter()
            .map(|h| Cell::from(h).style(bold(Color::Yellow))),
    );

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| signal_row(row, app.vote_state(&row.signal_id)))
        .collect();

    let widths = [
        Constraint::Length(19),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(6),
        Constraint::Min(10),
        Constraint::Length(22),
        Constraint::Length(12),
    ];

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(border_block(TITLE))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD))
        .highlight_symbol("▶ ");

    let mut state = TableState::default().with_selected(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn signal_row(row: &SignalRow, state: VoteState) -> Row<'static> {
    let direction_color = match row.direction {
        Direction::Long => Color::Green,
        Direction::Short => Color::Red,
    };

    let marker = match state {
        VoteState::VoteInFlight(_) => Span::styled(IN_FLIGHT_LABEL, Style::default().fg(Color::Yellow)),
        _ if row.already_voted => Span::styled(ALREADY_VOTED_LABEL, Style::default().fg(Color::Cyan)),
        _ => Span::raw(""),
    };

    Row::new(vec![
        Cell::from(row.time.clone()),
        Cell::from(Span::styled(row.coin.clone(), bold(Color::White))),
        Cell::from(Span::styled(row.direction.label(), bold(direction_color))),
        Cell::from(row.entry.clone()),
        Cell::from(Span::styled(row.tp.clone(), tone_style(row.tp_tone))),
        Cell::from(Span::styled(row.sl.clone(), tone_style(row.sl_tone))),
        Cell::from(row.rr.clone()),
        Cell::from(row.combo_name.clone()),
        Cell::from(Line::from(vec![
            vote_button(&row.win_button, Color::Green),
            Span::raw(" "),
            vote_button(&row.lose_button, Color::Red),
        ])),
        Cell::from(marker),
    ])
}

fn vote_button(button: &VoteButton, color: Color) -> Span<'static> {
    let style = if button.enabled {
        bold(color)
    } else {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    };
    Span::styled(format!("[{}]", button.label), style)
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Profit => Style::default().fg(Color::Green),
        Tone::Loss => Style::default().fg(Color::Red),
    }
}

fn bold(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn render_placeholder(frame: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(color))),
    ];
    frame.render_widget(
        Paragraph::new(text).block(border_block(title)).alignment(Alignment::Center),
        area,
    );
}

// ============================================================================
// Footer
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", bold(Color::Yellow)),
            Span::styled("[q]", bold(Color::Red).add_modifier(Modifier::SLOW_BLINK)),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                bold(Color::Yellow),
            ),
        ])
    } else if let Some(notice) = &app.notice {
        let color = match notice.kind {
            NoticeKind::Info => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        Line::from(Span::styled(notice.text.clone(), bold(color)))
    } else if app.is_showing_details() {
        Line::from(vec![
            Span::styled("[Esc / Space]", bold(Color::Yellow)),
            Span::raw(" Fermer  "),
            Span::styled("[q]", bold(Color::Yellow)),
            Span::raw(" Quit"),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", bold(Color::Yellow)),
            Span::raw(" Quit  "),
            Span::styled("[↑↓ / j k]", bold(Color::Yellow)),
            Span::raw(" Navigate  "),
            Span::styled("[w]", bold(Color::Green)),
            Span::raw(" Win  "),
            Span::styled("[x]", bold(Color::Red)),
            Span::raw(" Lose  "),
            Span::styled("[Enter / i]", bold(Color::Yellow)),
            Span::raw(" Combo"),
        ])
    };

    frame.render_widget(Paragraph::new(line).block(block).alignment(Alignment::Center), area);
}

// ============================================================================
// Overlay : détails du combo
// ============================================================================

fn render_combo_details(frame: &mut Frame, app: &App, signal_id: &str) {
    let Some(signal) = app.store.lookup_signal(signal_id) else {
        return;
    };

    let area = centered_rect(60, 50, frame.size());
    let title = format!(" {} · {} ", signal.base_asset(), signal.combo_name);

    let mut lines = vec![
        Line::from(Span::styled(signal.combo_name.clone(), bold(Color::Yellow))),
        Line::from(""),
    ];
    lines.extend(signal.combo_details.lines().map(|l| Line::from(l.to_string())));

    let paragraph = Paragraph::new(lines)
        .block(border_block(&title).border_style(Style::default().fg(Color::Yellow)))
        .wrap(Wrap { trim: false });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// Rectangle centré de `percent_x` x `percent_y` dans `area`
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

// ============================================================================
// Tests
// ============================================================================
