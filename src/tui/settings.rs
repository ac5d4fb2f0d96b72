use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};

use crate::viz::Visualizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    None,
    Changed,
    Close,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsPanelState {
    pub selected_row: usize,
}

const SETTINGS_ROW_COUNT: usize = 3;
const SPEED_STEP: f64 = 0.25;
const MAX_SPEED: f64 = 4.0;

pub fn handle_key(
    key: KeyEvent,
    state: &mut SettingsPanelState,
    viz: &mut Visualizer,
) -> SettingsEvent {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') | KeyCode::Char('s') => {
            SettingsEvent::Close
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected_row = state.selected_row.saturating_sub(1);
            SettingsEvent::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected_row = (state.selected_row + 1).min(SETTINGS_ROW_COUNT - 1);
            SettingsEvent::None
        }
        KeyCode::Left | KeyCode::Char('h') => adjust(viz, state.selected_row, false),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
            adjust(viz, state.selected_row, true)
        }
        _ => SettingsEvent::None,
    }
}

pub fn draw(frame: &mut Frame, state: &SettingsPanelState, viz: &Visualizer) {
    let area = centered_rect(frame.area(), 52, 40);
    frame.render_widget(Clear, area);

    let title = Line::from(vec![
        Span::styled(
            "Setup",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("[Esc] close", Style::default().fg(Color::Gray)),
    ]);

    let selected_row = state.selected_row.min(SETTINGS_ROW_COUNT - 1);
    let mut lines = vec![
        settings_row(
            selected_row == 0,
            "animation speed",
            &format!("{:.2}x", viz.animation_speed()),
        ),
        settings_row(
            selected_row == 1,
            "mutation highlights",
            if viz.show_transitions() { "[ON]" } else { "[OFF]" },
        ),
        settings_row(selected_row == 2, "view mode", viz.view_mode().label()),
        Line::from(""),
        Line::from(Span::styled(
            "About this option",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    for text in selected_row_description(selected_row) {
        lines.push(Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(
            "Use arrows/hjkl to move, left/right to adjust.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .padding(Padding::new(1, 1, 1, 0)),
    );
    frame.render_widget(panel, area);
}

fn settings_row(selected: bool, key: &str, value: &str) -> Line<'static> {
    let indicator = if selected { ">" } else { " " };
    let base_style = if selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut value_style = Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD);
    if selected {
        value_style = value_style.bg(Color::DarkGray);
    }
    Line::from(vec![
        Span::styled(format!("{indicator} {key:<22}"), base_style),
        Span::styled(value.to_string(), value_style),
    ])
}

fn selected_row_description(selected_row: usize) -> [&'static str; 2] {
    match selected_row {
        0 => [
            "Scales highlight duration. Lower values hold the",
            "mutation emphasis on screen for longer.",
        ],
        1 => [
            "When off, mutations apply silently with no flash.",
            "Tree state stays correct either way.",
        ],
        2 => [
            "Tree draws the mirrored pages spatially; log shows",
            "every accepted engine record in arrival order.",
        ],
        _ => ["", ""],
    }
}

fn adjust(viz: &mut Visualizer, selected_row: usize, up: bool) -> SettingsEvent {
    match selected_row {
        0 => {
            let step = if up { SPEED_STEP } else { -SPEED_STEP };
            let speed = (viz.animation_speed() + step).clamp(SPEED_STEP, MAX_SPEED);
            viz.set_animation_speed(speed);
            SettingsEvent::Changed
        }
        1 => {
            viz.set_show_transitions(!viz.show_transitions());
            SettingsEvent::Changed
        }
        2 => {
            viz.set_view_mode(viz.view_mode().next());
            SettingsEvent::Changed
        }
        _ => SettingsEvent::None,
    }
}

fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - height_percent) / 2),
        Constraint::Percentage(height_percent),
        Constraint::Percentage((100 - height_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(area);
    Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .flex(Flex::Center)
    .split(vertical[1])[1]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn speed_adjusts_in_steps_and_clamps() {
        let mut viz = Visualizer::new();
        let mut state = SettingsPanelState::default();
        assert_eq!(
            handle_key(key(KeyCode::Right), &mut state, &mut viz),
            SettingsEvent::Changed
        );
        assert!((viz.animation_speed() - 1.25).abs() < 1e-9);
        for _ in 0..40 {
            handle_key(key(KeyCode::Left), &mut state, &mut viz);
        }
        assert!(viz.animation_speed() >= SPEED_STEP - 1e-9);
    }

    #[test]
    fn highlight_toggle_row() {
        let mut viz = Visualizer::new();
        let mut state = SettingsPanelState { selected_row: 1 };
        handle_key(key(KeyCode::Enter), &mut state, &mut viz);
        assert!(!viz.show_transitions());
        handle_key(key(KeyCode::Enter), &mut state, &mut viz);
        assert!(viz.show_transitions());
    }

    #[test]
    fn escape_closes() {
        let mut viz = Visualizer::new();
        let mut state = SettingsPanelState::default();
        assert_eq!(
            handle_key(key(KeyCode::Esc), &mut state, &mut viz),
            SettingsEvent::Close
        );
    }
}
