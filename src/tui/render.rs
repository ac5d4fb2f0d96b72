//! Pure drawing: takes a prepared view-model and paints it into a frame.

use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph};

use crate::layout::{NODE_H, NODE_W, Pos};
use crate::tree::model::{Node, PageId, PageKind};
use crate::viz::ViewMode;

const LEAF_COLOR: Color = Color::Green;
const INTERIOR_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const CONNECTOR_COLOR: Color = Color::DarkGray;

/// One node box, placed in canvas coordinates.
#[derive(Debug, Clone)]
pub struct NodeBox {
    pub page: PageId,
    pub kind: PageKind,
    pub cell_count: usize,
    pub pos: Pos,
    pub highlighted: bool,
    pub focused: bool,
    pub collapsed: bool,
}

/// A parent-to-child connector between two live, placed nodes.
#[derive(Debug, Clone, Copy)]
pub struct Connector {
    /// Bottom-center of the parent box.
    pub from: Pos,
    /// Top-center of the child box.
    pub to: Pos,
}

#[derive(Debug)]
pub struct CanvasRenderData<'a> {
    pub boxes: &'a [NodeBox],
    pub connectors: &'a [Connector],
    pub view_mode: ViewMode,
    pub log_lines: &'a [&'a str],
    pub detail: Option<&'a Node>,
    pub show_help: bool,
    pub node_count: usize,
    pub events_seen: u64,
    pub speed: f64,
    pub transitions: bool,
    pub message: Option<&'a str>,
}

pub fn draw(frame: &mut Frame, data: &CanvasRenderData<'_>) {
    let area = frame.area();
    let title = Line::from(vec![
        Span::styled("btvz", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled("[?] help", Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled("[q] quit", Style::default().fg(Color::DarkGray)),
    ]);
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let [canvas_area, status_area] =
        Layout::vertical([Constraint::Min(4), Constraint::Length(2)]).areas(inner);

    match data.view_mode {
        ViewMode::Tree => draw_tree(frame, canvas_area, data),
        ViewMode::Log => draw_log(frame, canvas_area, data.log_lines),
    }
    draw_status(frame, status_area, data);

    if let Some(node) = data.detail {
        draw_detail(frame, canvas_area, node);
    }
    if data.show_help {
        draw_help(frame, area);
    }
}

fn draw_tree(frame: &mut Frame, area: Rect, data: &CanvasRenderData<'_>) {
    if data.boxes.is_empty() {
        let empty = Paragraph::new("waiting for engine events...")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    // Connectors first so boxes paint over them.
    for conn in data.connectors {
        draw_connector(frame.buffer_mut(), area, *conn);
    }
    for node_box in data.boxes {
        draw_node_box(frame, area, node_box);
    }
}

fn draw_node_box(frame: &mut Frame, area: Rect, nb: &NodeBox) {
    // Boxes partially outside the canvas are skipped; narrow terminals
    // push outer siblings off-screen rather than distorting the layout.
    if nb.pos.x < 0 || nb.pos.y < 0 {
        return;
    }
    let rect = Rect::new(
        area.x.saturating_add(nb.pos.x as u16),
        area.y.saturating_add(nb.pos.y as u16),
        NODE_W as u16,
        NODE_H as u16,
    );
    if rect.right() > area.right() || rect.bottom() > area.bottom() {
        return;
    }

    let kind_color = match nb.kind {
        PageKind::Leaf => LEAF_COLOR,
        PageKind::Interior => INTERIOR_COLOR,
    };
    let border_color = if nb.highlighted {
        HIGHLIGHT_COLOR
    } else {
        kind_color
    };
    let mut border_style = Style::default().fg(border_color);
    if nb.focused || nb.highlighted {
        border_style = border_style.add_modifier(Modifier::BOLD);
    }
    let border_type = if nb.focused {
        BorderType::Thick
    } else {
        BorderType::Rounded
    };

    let collapse_marker = if nb.collapsed { " [+]" } else { "" };
    let lines = vec![
        Line::from(Span::styled(
            nb.kind.label(),
            Style::default().fg(kind_color),
        )),
        Line::from(Span::styled(
            format!("{} cells{collapse_marker}", nb.cell_count),
            Style::default().fg(Color::Gray),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .title(Span::styled(
            format!("pg {}", nb.page),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
        .padding(Padding::horizontal(1));
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

/// Elbow route: down from the parent's bottom-center, across on the row
/// above the child, then into the child's top-center.
fn draw_connector(buf: &mut Buffer, area: Rect, conn: Connector) {
    let style = Style::default().fg(CONNECTOR_COLOR);
    let bus_y = conn.to.y - 1;
    for y in conn.from.y..bus_y {
        put_char(buf, area, conn.from.x, y, "│", style);
    }
    let (lo, hi) = if conn.from.x <= conn.to.x {
        (conn.from.x, conn.to.x)
    } else {
        (conn.to.x, conn.from.x)
    };
    for x in lo..=hi {
        put_char(buf, area, x, bus_y, "─", style);
    }
    if conn.from.x < conn.to.x {
        put_char(buf, area, conn.from.x, bus_y, "└", style);
        put_char(buf, area, conn.to.x, bus_y, "┐", style);
    } else if conn.from.x > conn.to.x {
        put_char(buf, area, conn.from.x, bus_y, "┘", style);
        put_char(buf, area, conn.to.x, bus_y, "┌", style);
    } else {
        put_char(buf, area, conn.from.x, bus_y, "│", style);
    }
}

fn put_char(buf: &mut Buffer, area: Rect, x: i32, y: i32, symbol: &str, style: Style) {
    if x < 0 || y < 0 {
        return;
    }
    let (px, py) = (area.x as i32 + x, area.y as i32 + y);
    if px >= area.right() as i32 || py >= area.bottom() as i32 {
        return;
    }
    if let Some(cell) = buf.cell_mut((px as u16, py as u16)) {
        cell.set_symbol(symbol).set_style(style);
    }
}

fn draw_log(frame: &mut Frame, area: Rect, lines: &[&str]) {
    let visible = area.height as usize;
    let start = lines.len().saturating_sub(visible);
    let text: Vec<Line> = lines[start..]
        .iter()
        .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Gray))))
        .collect();
    frame.render_widget(Paragraph::new(text), area);
}

fn draw_status(frame: &mut Frame, area: Rect, data: &CanvasRenderData<'_>) {
    let fx = if data.transitions { "on" } else { "off" };
    let stats = Line::from(vec![
        Span::styled("nodes ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            data.node_count.to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  events ", Style::default().fg(Color::DarkGray)),
        Span::styled(data.events_seen.to_string(), Style::default().fg(Color::White)),
        Span::styled("  speed ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{:.2}x", data.speed), Style::default().fg(Color::White)),
        Span::styled("  fx ", Style::default().fg(Color::DarkGray)),
        Span::styled(fx, Style::default().fg(Color::White)),
        Span::styled("  view ", Style::default().fg(Color::DarkGray)),
        Span::styled(data.view_mode.label(), Style::default().fg(Color::White)),
    ]);
    let hints = match data.message {
        Some(msg) => Line::from(Span::styled(
            msg.to_string(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            "[Tab] focus  [Enter] collapse  [v] view  [+/-] speed  [t] fx  [s] setup  [x] clear",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(vec![stats, hints]), area);
}

fn draw_detail(frame: &mut Frame, area: Rect, node: &Node) {
    let width = 28u16.min(area.width);
    let rect = Rect::new(area.right().saturating_sub(width), area.y, width, area.height);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("kind  ", Style::default().fg(Color::DarkGray)),
            Span::raw(node.kind.label()),
        ]),
        Line::from(vec![
            Span::styled("cells ", Style::default().fg(Color::DarkGray)),
            Span::raw(node.cells.len().to_string()),
        ]),
        Line::from(""),
    ];
    let budget = rect.height.saturating_sub(5) as usize;
    for (idx, cell) in node.cells.iter().take(budget).enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{idx:>3}  "), Style::default().fg(Color::DarkGray)),
            Span::raw(format!("key {} ({})", cell.display_key, cell.key_len)),
        ]));
    }
    if node.cells.len() > budget {
        lines.push(Line::from(Span::styled(
            format!("... {} more", node.cells.len() - budget),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(
                format!("pg {}", node.page_id),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Gray))
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(Clear, rect);
    frame.render_widget(panel, rect);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let rect = centered_rect(area, 52, 50);
    let rows = [
        ("Tab / Shift-Tab", "cycle focused node"),
        ("Enter / z", "collapse or expand focused node"),
        ("mouse hover", "show page details"),
        ("mouse click", "collapse or expand a node"),
        ("v", "switch tree / event log view"),
        ("+ / -", "animation speed up / down"),
        ("t", "toggle mutation highlights"),
        ("s", "open settings"),
        ("x", "clear the visualization"),
        ("q", "quit"),
    ];
    let mut lines = Vec::new();
    for (keys, what) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{keys:<16}"), Style::default().fg(Color::Cyan)),
            Span::styled(what, Style::default().fg(Color::Gray)),
        ]));
    }
    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(
                "Keys",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .padding(Padding::new(1, 1, 1, 0)),
    );
    frame.render_widget(Clear, rect);
    frame.render_widget(panel, rect);
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
