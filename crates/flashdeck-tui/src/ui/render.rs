use flashdeck_core::deck::{Direction, Phase};
use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, Button, DeckView, LOAD_FAILED_MESSAGE};

use super::styles;

const BUTTONS: [(Button, &str); 3] = [
    (Button::Prev, "◀ Prev"),
    (Button::Random, "Random"),
    (Button::Next, "Next ▶"),
];

/// Width of each footer button, borders included
const BUTTON_WIDTH: u16 = 12;

/// Screen regions, top to bottom
struct Areas {
    title: Rect,
    card: Rect,
    progress: Rect,
    buttons: Rect,
    status: Rect,
}

fn split(area: Rect) -> Areas {
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(5),    // Card
            Constraint::Length(1), // Progress
            Constraint::Length(3), // Buttons
            Constraint::Length(2), // Status bar
        ])
        .split(area);

    Areas {
        title: chunks[0],
        card: chunks[1],
        progress: chunks[2],
        buttons: chunks[3],
        status: chunks[4],
    }
}

/// Where each footer button is drawn, for mouse hit-testing
pub fn button_areas(area: Rect) -> [(Button, Rect); 3] {
    let row = split(area).buttons;
    let total = BUTTON_WIDTH * 3 + 2;
    let start = row.x + row.width.saturating_sub(total) / 2;
    let rect = |i: u16| Rect {
        x: start + i * (BUTTON_WIDTH + 1),
        y: row.y,
        width: BUTTON_WIDTH.min(row.width),
        height: row.height,
    };
    [
        (Button::Prev, rect(0)),
        (Button::Random, rect(1)),
        (Button::Next, rect(2)),
    ]
}

/// Horizontal offset of the card for the current animation phase. Forward
/// exits to the left and enters from the right; backward mirrors it.
pub fn slide_offset(animation: Option<(Phase, Direction, f32)>, width: u16) -> i32 {
    let Some((phase, direction, fraction)) = animation else {
        return 0;
    };
    let w = f32::from(width);
    let offset = match (phase, direction) {
        (Phase::Exit, Direction::Forward) => -fraction * w,
        (Phase::Exit, Direction::Backward) => fraction * w,
        (Phase::Entry, Direction::Forward) => (1.0 - fraction) * w,
        (Phase::Entry, Direction::Backward) => -(1.0 - fraction) * w,
    };
    offset.round() as i32
}

/// Move `area` right (positive) or left (negative), clipping at its edges.
/// Returns None once it has slid fully out of view.
pub fn shift_rect(area: Rect, offset: i32) -> Option<Rect> {
    let magnitude = offset.unsigned_abs().min(u32::from(area.width)) as u16;
    let width = area.width - magnitude;
    if width == 0 {
        return None;
    }
    let x = if offset > 0 { area.x + magnitude } else { area.x };
    Some(Rect { x, width, ..area })
}

pub fn render(frame: &mut Frame, app: &App) {
    let areas = split(frame.area());

    render_title_bar(frame, areas.title);
    render_card(frame, app, areas.card);
    render_progress(frame, app, areas.progress);
    render_buttons(frame, app);
    render_status_bar(frame, app, areas.status);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, area: Rect) {
    let title = "  Flashdeck";
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

/// Paragraph with blank lines above so short text sits mid-card
fn centered_text<'a>(text: &'a str, inner: Rect, style: ratatui::style::Style) -> Paragraph<'a> {
    let width = usize::from(inner.width.max(1));
    let wrapped_lines: usize = text
        .lines()
        .map(|l| l.chars().count().max(1).div_ceil(width))
        .sum();
    let pad = usize::from(inner.height).saturating_sub(wrapped_lines) / 2;

    let mut lines: Vec<Line> = vec![Line::raw(""); pad];
    lines.extend(text.lines().map(|l| Line::styled(l, style)));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn render_card(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style, busy, offset) = match app.deck {
        DeckView::Loading => ("Loading cards...", styles::muted_style(), false, 0),
        DeckView::Message(message) => {
            let style = if message == LOAD_FAILED_MESSAGE {
                styles::error_style()
            } else {
                styles::muted_style()
            };
            (message, style, false, 0)
        }
        DeckView::Cards(ref nav) => {
            let text = nav.current_card().map(|c| c.display_text()).unwrap_or_default();
            let offset = slide_offset(nav.animation(), area.width);
            (text, styles::card_text_style(), nav.is_busy(), offset)
        }
    };

    let Some(card_area) = shift_rect(area, offset) else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(busy));
    let inner = block.inner(card_area);

    frame.render_widget(Clear, card_area);
    frame.render_widget(centered_text(text, inner, style).block(block), card_area);
}

fn render_progress(frame: &mut Frame, app: &App, area: Rect) {
    let Some(nav) = app.navigator() else {
        return;
    };
    let progress = Paragraph::new(Span::styled(nav.progress_label(), styles::muted_style()))
        .alignment(Alignment::Center);
    frame.render_widget(progress, area);
}

fn render_buttons(frame: &mut Frame, app: &App) {
    if app.navigator().is_none() {
        return;
    }
    for ((button, rect), (_, label)) in button_areas(frame.area()).into_iter().zip(BUTTONS) {
        let enabled = app.is_enabled(button);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::button_style(enabled));
        let paragraph = Paragraph::new(Span::styled(label, styles::button_style(enabled)))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, rect);
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[←/→] move | [r]andom | [q]uit";

    let (left_text, left_style) = if let Some(ref msg) = app.status_message {
        (format!(" {} ", msg), styles::status_bar_style())
    } else {
        match app.cache_version() {
            Some(version) => (
                format!(" Offline ready ({}) ", version),
                styles::status_bar_style().fg(styles::SECONDARY),
            ),
            None => (" Online only ".to_string(), styles::status_bar_style()),
        }
    };

    let padding = (area.width as usize)
        .saturating_sub(left_text.chars().count() + shortcuts.chars().count() + 1);

    let line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::styled(" ".repeat(padding), styles::status_bar_style()),
        Span::styled(shortcuts, styles::status_bar_style()),
    ]);

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(styles::muted_style());

    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()).block(block),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(50, 50, frame.area());
    frame.render_widget(Clear, area);

    let entries = [
        ("← / h", "Previous card"),
        ("→ / l", "Next card"),
        ("r", "Random card"),
        ("drag", "Swipe left or right"),
        ("?", "Toggle help"),
        ("q / Esc", "Quit"),
    ];

    let lines: Vec<Line> = entries
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("  {:<10}", key), styles::help_key_style()),
                Span::styled(*desc, styles::help_desc_style()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(styles::success_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

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
