use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

use super::state::UiState;
use crate::render::{diverging_color, Heatmap, BANDS};

const UPPER_HALF: &str = "▀";
const LEGEND_STEPS: usize = 24;

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// Field drawn with half-block cells: two lattice rows per terminal row, north up.
struct HeatmapCells<'a> {
    heatmap: &'a Heatmap,
}

impl Widget for HeatmapCells<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let h = self.heatmap;
        if area.width == 0 || area.height == 0 || h.rows() == 0 || h.cols() == 0 {
            return;
        }
        let sub_rows = area.height as usize * 2;
        let cols = area.width as usize;
        // Nearest lattice index for a screen position; row 0 is the southernmost sample.
        let lattice_row = |sub: usize| {
            let from_top = sub * h.rows() / sub_rows;
            h.rows() - 1 - from_top.min(h.rows() - 1)
        };
        let lattice_col = |x: usize| (x * h.cols() / cols).min(h.cols() - 1);

        for y in 0..area.height {
            for x in 0..area.width {
                let col = lattice_col(x as usize);
                let top = h.color_at(lattice_row(y as usize * 2), col);
                let bottom = h.color_at(lattice_row(y as usize * 2 + 1), col);
                if let (Some(top), Some(bottom)) = (top, bottom) {
                    if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                        cell.set_symbol(UPPER_HALF)
                            .set_fg(rgb(top))
                            .set_bg(rgb(bottom));
                    }
                }
            }
        }
    }
}

fn legend(h: &Heatmap) -> Line<'static> {
    let mut spans = vec![Span::raw(format!("{:.3} ", h.min()))];
    for i in 0..LEGEND_STEPS {
        let t = (i as f64 + 0.5) / LEGEND_STEPS as f64;
        spans.push(Span::styled("█", Style::default().fg(rgb(diverging_color(t)))));
    }
    spans.push(Span::raw(format!(" {:.3}", h.max())));
    spans.push(Span::styled(
        format!("  ({BANDS} levels)"),
        Style::default().fg(Color::Gray),
    ));
    Line::from(spans)
}

fn axis_line(h: &Heatmap) -> Line<'static> {
    let first = |v: &[f64]| v.first().copied().unwrap_or(f64::NAN);
    let last = |v: &[f64]| v.last().copied().unwrap_or(f64::NAN);
    Line::from(Span::styled(
        format!(
            "lat {:.2}..{:.2} ({} rows)   lon {:.2}..{:.2} ({} cols)",
            first(h.lats()),
            last(h.lats()),
            h.rows(),
            first(h.lons()),
            last(h.lons()),
            h.cols()
        ),
        Style::default().fg(Color::Gray),
    ))
}

pub fn draw_result(area: Rect, f: &mut Frame, state: &UiState) {
    let title = match state.rendered.as_ref() {
        Some(job) => format!(
            "Result {} ({} / {})",
            job.process_id, job.variogram, job.method
        ),
        None => "Result".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(h) = state.heatmap.as_ref() else {
        let msg = if state.rendered.is_some() {
            "Result could not be drawn on its grid"
        } else {
            "No result yet"
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(msg, Style::default().fg(Color::Gray)))),
            inner,
        );
        return;
    };

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(inner);
    f.render_widget(HeatmapCells { heatmap: h }, parts[0]);
    f.render_widget(Paragraph::new(axis_line(h)), parts[1]);
    f.render_widget(Paragraph::new(legend(h)), parts[2]);
}
