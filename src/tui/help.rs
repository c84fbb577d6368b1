use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const KEYS: [(&str, &str); 12] = [
    ("Esc", "Leave text field, then quit"),
    ("Ctrl-C", "Quit"),
    ("Tab / Shift-Tab", "Move focus"),
    ("← / →", "Change variogram or method"),
    ("Enter", "Load points file / search (on those fields)"),
    ("Ctrl-S", "Submit a new job"),
    ("Ctrl-F", "Search job by identifier"),
    ("Ctrl-Y", "Copy current job id to clipboard"),
    ("Ctrl-E", "Export result as JSON and CSV"),
    ("Backspace", "Delete character"),
    ("Ctrl-U", "Clear field"),
    ("F1", "Toggle this help"),
];

fn key_line(key: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<16}"), Style::default().fg(Color::Magenta)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(KEYS.iter().map(|&(k, a)| key_line(k, a)));
    lines.push(Line::from(""));
    lines.push(Line::from("Points file:"));
    lines.push(Line::from("  one `lat lon value` row per line, # starts a comment"));
    lines.push(Line::from(""));
    lines.push(Line::from("Grid:"));
    lines.push(Line::from(
        "  start < stop, 0.1 <= step <= stop - start, lat within ±90, lon within ±180",
    ));

    f.render_widget(Clear, area);
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
