mod export;
mod help;
mod plot;
mod state;

use crate::cli::{build_config, submit_request, Cli};
use crate::error::JobError;
use crate::model::{JobEvent, RenderedJob};
use crate::orchestrator::{self, UiCommand};
use crate::service::KrigingClient;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use state::{Focus, UiState};
use std::path::PathBuf;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // The terminal belongs to the UI, so logs go to a file.
    let mut startup_info = None;
    if let Some(path) = args.log_file.clone().or_else(crate::logging::default_log_path) {
        if let Err(e) = crate::logging::init_file(&path) {
            startup_info = Some(format!("Logging disabled: {e:#}"));
        }
    }

    let api = KrigingClient::new(&build_config(&args))?;

    // Unbounded channels avoid backpressure between the UI thread and the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<JobEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // Work requested on the command line is queued before the UI starts.
    if let Some(path) = args.points.clone() {
        let _ = cmd_tx.send(UiCommand::LoadPoints(path));
    }
    if let Some(id) = args.search.clone() {
        let _ = cmd_tx.send(UiCommand::Search(id));
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_args, startup_info, event_rx, cmd_tx));

    let res = orchestrator::run_controller(api, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    startup_info: Option<String>,
    mut event_rx: UnboundedReceiver<JobEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = initial_state(&args);
    if let Some(msg) = startup_info {
        state.set_error(msg);
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            match ev {
                JobEvent::ResultReady(job) => handle_result_ready(&args, &mut state, *job),
                other => state.apply_event(other),
            }
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut state, k) {
                    KeyAction::Nothing => {}
                    KeyAction::Send(cmd) => {
                        let _ = cmd_tx.send(cmd);
                    }
                    KeyAction::CopyProcessId => copy_process_id(&mut state),
                    KeyAction::Export => export_current(&mut state),
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
                // Redraw right away so typing feels immediate.
                last_tick = Instant::now()
                    .checked_sub(tick_rate)
                    .unwrap_or_else(Instant::now);
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn initial_state(args: &Cli) -> UiState {
    let req = submit_request(args);
    UiState {
        variogram: req.variogram,
        method: req.method,
        grid: req.grid,
        points_path: args
            .points
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        search: args.search.clone().unwrap_or_default(),
        ..Default::default()
    }
}

/// Build the heatmap, run command-line exports and show the result.
fn handle_result_ready(args: &Cli, state: &mut UiState, job: RenderedJob) {
    let processed = orchestrator::process_result(
        &job,
        args.export_json.as_deref(),
        args.export_csv.as_deref(),
    );
    let render_error = processed.heatmap.as_ref().err().map(|e| e.to_string());
    state.heatmap = processed.heatmap.ok();
    state.apply_event(JobEvent::ResultReady(Box::new(job)));
    if let Some(e) = render_error {
        state.set_error(format!("Cannot draw result: {e}"));
    } else if !processed.export_messages.is_empty() {
        state.set_info(processed.export_messages.join("; "));
    }
}

fn copy_process_id(state: &mut UiState) {
    let Some(id) = state.current_process_id() else {
        state.set_error("No job to copy yet");
        return;
    };
    match export::copy_to_clipboard(&id.to_string()) {
        Ok(_) => state.set_info(format!("✓ Copied to clipboard: {id}")),
        Err(e) => state.set_error(format!("Clipboard copy failed: {e:#}")),
    }
}

fn export_current(state: &mut UiState) {
    let Some(job) = state.rendered.as_ref() else {
        state.set_error("No result to export yet");
        return;
    };
    match export::export_result(job) {
        Ok((json, csv)) => {
            state.set_info(format!(
                "Exported JSON: {}  CSV: {}",
                json.display(),
                csv.display()
            ));
        }
        Err(e) => state.set_error(format!("Export failed: {e:#}")),
    }
}

/// What the UI loop should do after a key press.
#[derive(Debug)]
enum KeyAction {
    Nothing,
    Send(UiCommand),
    CopyProcessId,
    Export,
    Quit,
}

fn handle_key(state: &mut UiState, k: KeyEvent) -> KeyAction {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    match k.code {
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Esc if state.show_help => state.show_help = false,
        KeyCode::Esc if state.focus.is_selector() => return KeyAction::Quit,
        // Leaving a text field first keeps a stray Esc from dropping typed input.
        KeyCode::Esc => {
            state.focus = Focus::Variogram;
            state.set_info("Press Esc again to quit");
        }
        KeyCode::F(1) => state.show_help = !state.show_help,
        KeyCode::Char('s') if ctrl => {
            if !state.submit_enabled() {
                state.set_error(JobError::Busy.user_message());
                return KeyAction::Nothing;
            }
            return KeyAction::Send(UiCommand::Submit(state.submit_request()));
        }
        KeyCode::Char('f') if ctrl => {
            return KeyAction::Send(UiCommand::Search(state.search.clone()));
        }
        KeyCode::Char('y') if ctrl => return KeyAction::CopyProcessId,
        KeyCode::Char('e') if ctrl => return KeyAction::Export,
        KeyCode::Char('u') if ctrl => {
            if let Some(text) = state.focused_text_mut() {
                text.clear();
            }
        }
        KeyCode::Tab => state.focus = state.focus.next(),
        KeyCode::BackTab => state.focus = state.focus.prev(),
        KeyCode::Left if state.focus.is_selector() => state.cycle_selector(false),
        KeyCode::Right if state.focus.is_selector() => state.cycle_selector(true),
        KeyCode::Enter => match state.focus {
            Focus::PointsPath => {
                let path = state.points_path.trim();
                if path.is_empty() {
                    state.set_error("Enter a points file path first");
                } else {
                    return KeyAction::Send(UiCommand::LoadPoints(PathBuf::from(path)));
                }
            }
            Focus::Search => {
                return KeyAction::Send(UiCommand::Search(state.search.clone()));
            }
            _ => state.focus = state.focus.next(),
        },
        KeyCode::Backspace => {
            if let Some(text) = state.focused_text_mut() {
                text.pop();
            }
        }
        KeyCode::Char(c) if !ctrl => {
            if let Some(text) = state.focused_text_mut() {
                text.push(c);
            }
        }
        _ => {}
    }
    KeyAction::Nothing
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(46), Constraint::Min(20)].as_ref())
        .split(rows[0]);

    draw_inputs(cols[0], f, state);
    if state.show_help {
        help::draw_help(cols[1], f);
    } else {
        plot::draw_result(cols[1], f, state);
    }
    draw_status(rows[1], f, state);
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(Color::Gray))
}

fn selector_line(name: &str, value: Option<&'static str>, focused: bool) -> Line<'static> {
    let shown = value.unwrap_or("<select>");
    Line::from(vec![
        label(&format!("{name:<10}")),
        Span::styled(format!("‹ {shown:<11} ›"), field_style(focused)),
    ])
}

fn grid_line(name: &str, texts: &[String; 3], focused: [bool; 3]) -> Line<'static> {
    let mut spans = vec![label(&format!("{name:<5}"))];
    for (text, is_focused) in texts.iter().zip(focused) {
        spans.push(Span::styled(format!("[{text:<9}]"), field_style(is_focused)));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn draw_inputs(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4), // variogram + method
                Constraint::Length(5), // grid
                Constraint::Length(4), // points file
                Constraint::Length(3), // search
                Constraint::Min(0),    // hints
            ]
            .as_ref(),
        )
        .split(area);

    let params = Paragraph::new(vec![
        selector_line(
            "Variogram",
            state.variogram.map(|v| v.as_str()),
            state.focus == Focus::Variogram,
        ),
        selector_line(
            "Method",
            state.method.map(|m| m.as_str()),
            state.focus == Focus::Method,
        ),
    ])
    .block(Block::default().borders(Borders::ALL).title("Parameters"));
    f.render_widget(params, parts[0]);

    let fo = state.focus;
    let grid = Paragraph::new(vec![
        Line::from(label("     start      stop       step")),
        grid_line(
            "lat",
            &state.grid.lat,
            [
                fo == Focus::LatStart,
                fo == Focus::LatStop,
                fo == Focus::LatStep,
            ],
        ),
        grid_line(
            "lon",
            &state.grid.lon,
            [
                fo == Focus::LonStart,
                fo == Focus::LonStop,
                fo == Focus::LonStep,
            ],
        ),
    ])
    .block(Block::default().borders(Borders::ALL).title("Grid"));
    f.render_widget(grid, parts[1]);

    let loaded = match state.points_count {
        Some(n) => format!("{n} points loaded"),
        None => "no points loaded".into(),
    };
    let points = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{:<42}", state.points_path),
            field_style(fo == Focus::PointsPath),
        )),
        Line::from(label(&loaded)),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Points file (Enter to load)"),
    );
    f.render_widget(points, parts[2]);

    let search = Paragraph::new(Line::from(Span::styled(
        format!("{:<42}", state.search),
        field_style(fo == Focus::Search),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Job id (Enter / Ctrl-F to search)"),
    );
    f.render_widget(search, parts[3]);

    let submit_style = if state.submit_enabled() {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    };
    let hints = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Ctrl-S", submit_style),
            Span::styled(" submit", submit_style),
        ]),
        Line::from(vec![
            Span::styled("F1", Style::default().fg(Color::Magenta)),
            Span::raw(" help  "),
            Span::styled("Esc", Style::default().fg(Color::Magenta)),
            Span::raw(" quit"),
        ]),
    ]);
    f.render_widget(hints, parts[4]);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let p = Paragraph::new(state.status_line())
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}
