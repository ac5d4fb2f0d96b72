//! The interactive surface: terminal lifecycle, the cooperative loop that
//! interleaves event draining, highlight ticking and painting, and all
//! pointer/keyboard handling.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};

use crate::events::source::EventSource;
use crate::layout::{NODE_H, NODE_W, Pos};
use crate::tree::model::PageId;
use crate::tui::input::{self, Action};
use crate::tui::render::{self, CanvasRenderData, Connector, NodeBox};
use crate::tui::settings::{self, SettingsEvent, SettingsPanelState};
use crate::viz::Visualizer;

/// Frame cadence; also bounds how long a highlight overstays its expiry.
const TICK_MS: u64 = 50;
/// Cap on records applied per frame so a mutation burst cannot starve the
/// animation tick. The rest of the burst is picked up next frame.
const MAX_EVENTS_PER_FRAME: usize = 256;

const SPEED_STEP: f64 = 0.25;
const MAX_SPEED: f64 = 4.0;

/// Startup knobs from the CLI.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub speed: f64,
    pub transitions: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            transitions: true,
        }
    }
}

struct AppState {
    viz: Visualizer,
    source: EventSource,
    focused: Option<PageId>,
    hovered: Option<PageId>,
    show_help: bool,
    show_settings: bool,
    settings_state: SettingsPanelState,
    status_message: Option<String>,
}

impl AppState {
    fn new(source: EventSource, opts: ViewOptions) -> Self {
        let mut viz = Visualizer::new();
        viz.set_animation_speed(opts.speed);
        viz.set_show_transitions(opts.transitions);
        Self {
            viz,
            source,
            focused: None,
            hovered: None,
            show_help: false,
            show_settings: false,
            settings_state: SettingsPanelState::default(),
            status_message: None,
        }
    }

    /// Apply pending engine events, bounded per frame.
    fn drain_events(&mut self) {
        for _ in 0..MAX_EVENTS_PER_FRAME {
            let Some(ev) = self.source.try_recv() else {
                break;
            };
            self.viz.on_event(ev.code, &ev.payload);
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        // The canvas sits inside the outer border drawn by render::draw.
        let width = frame.area().width.saturating_sub(2) as i32;
        self.viz.relayout_if_needed(width);

        // Drop stale UI references to pages that left the layout.
        if let Some(page) = self.focused {
            if self.viz.layout().pos(page).is_none() {
                self.focused = None;
            }
        }
        if let Some(page) = self.hovered {
            if self.viz.layout().pos(page).is_none() {
                self.hovered = None;
            }
        }

        let mut boxes = Vec::new();
        let mut connectors = Vec::new();
        for (page, pos) in self.viz.layout().placed() {
            let Some(node) = self.viz.store().node(page) else {
                continue;
            };
            boxes.push(NodeBox {
                page,
                kind: node.kind,
                cell_count: node.cells.len(),
                pos,
                highlighted: self.viz.is_highlighted(page),
                focused: self.focused == Some(page),
                collapsed: !node.expanded,
            });
            if !node.expanded {
                continue;
            }
            for &child in &node.children {
                // Dangling children draw no line.
                let Some(child_pos) = self.viz.layout().pos(child) else {
                    continue;
                };
                connectors.push(Connector {
                    from: Pos {
                        x: pos.x + NODE_W / 2,
                        y: pos.y + NODE_H,
                    },
                    to: Pos {
                        x: child_pos.x + NODE_W / 2,
                        y: child_pos.y,
                    },
                });
            }
        }

        let detail_page = self.hovered.or(self.focused);
        let detail = detail_page.and_then(|p| self.viz.store().node(p));
        let log_lines: Vec<&str> = self.viz.log_lines().collect();

        let data = CanvasRenderData {
            boxes: &boxes,
            connectors: &connectors,
            view_mode: self.viz.view_mode(),
            log_lines: &log_lines,
            detail,
            show_help: self.show_help,
            node_count: self.viz.node_count(),
            events_seen: self.viz.events_seen(),
            speed: self.viz.animation_speed(),
            transitions: self.viz.show_transitions(),
            message: self.status_message.as_deref(),
        };
        render::draw(frame, &data);

        if self.show_settings {
            settings::draw(frame, &self.settings_state, &self.viz);
        }
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.show_settings {
            match settings::handle_key(key, &mut self.settings_state, &mut self.viz) {
                SettingsEvent::Close => self.show_settings = false,
                SettingsEvent::Changed | SettingsEvent::None => {}
            }
            return false;
        }

        match input::action_for_key(key) {
            Action::Quit => return true,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::OpenSettings => self.show_settings = true,
            Action::CycleView => {
                let mode = self.viz.view_mode().next();
                self.viz.set_view_mode(mode);
            }
            Action::SpeedUp => self.adjust_speed(SPEED_STEP),
            Action::SpeedDown => self.adjust_speed(-SPEED_STEP),
            Action::ToggleTransitions => {
                let on = !self.viz.show_transitions();
                self.viz.set_show_transitions(on);
            }
            Action::ToggleCollapse => {
                if let Some(page) = self.focused {
                    self.viz.toggle_expanded(page);
                }
            }
            Action::NextNode => self.cycle_focus(1),
            Action::PrevNode => self.cycle_focus(-1),
            Action::ClearAll => {
                self.viz.clear();
                self.focused = None;
                self.hovered = None;
                self.status_message = Some("visualization cleared".to_string());
            }
            Action::Cancel => {
                self.show_help = false;
                self.status_message = None;
                self.focused = None;
            }
            Action::Noop => {}
        }
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        // Layout coordinates are relative to the canvas, one cell inside
        // the outer border.
        let x = mouse.column as i32 - 1;
        let y = mouse.row as i32 - 1;
        match mouse.kind {
            MouseEventKind::Moved => {
                self.hovered = self.viz.node_at(x, y);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(page) = self.viz.node_at(x, y) {
                    self.focused = Some(page);
                    self.viz.toggle_expanded(page);
                }
            }
            _ => {}
        }
    }

    fn adjust_speed(&mut self, step: f64) {
        let speed = (self.viz.animation_speed() + step).clamp(SPEED_STEP, MAX_SPEED);
        self.viz.set_animation_speed(speed);
    }

    fn cycle_focus(&mut self, step: i32) {
        let order: Vec<PageId> = self.viz.layout().placed().map(|(id, _)| id).collect();
        if order.is_empty() {
            self.focused = None;
            return;
        }
        let next = match self.focused.and_then(|f| order.iter().position(|&p| p == f)) {
            Some(idx) => {
                (idx as i32 + step).rem_euclid(order.len() as i32) as usize
            }
            None => 0,
        };
        self.focused = Some(order[next]);
    }
}

pub fn run(source: EventSource, opts: ViewOptions) -> Result<()> {
    let mut app = AppState::new(source, opts);

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.drain_events();
        app.viz.tick_highlights();
        terminal.draw(|f| app.draw(f))?;

        if !event::poll(Duration::from_millis(TICK_MS))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if matches!(key.kind, KeyEventKind::Release | KeyEventKind::Repeat) {
                    continue;
                }
                if app.handle_key(key) {
                    break;
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            // Resize is picked up on the next draw via relayout_if_needed.
            _ => {}
        }
    }
    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
    }
}
