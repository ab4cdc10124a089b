use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, ApplyResult, ListResult, ProgressEvent, ProgressSink};
use crate::cdn::AssetFetcher;
use crate::domain::{ShortcutRecord, is_all_digits};
use crate::error::GridError;

const LOGS_MAX: usize = 200;
const SPINNER: &[char] = &['|', '/', '-', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Main,
    Logs,
    Help,
}

#[derive(Debug)]
struct AppState {
    status: String,
    status_color: Color,
    logs: VecDeque<String>,
    active: bool,
}

struct TuiProgress {
    state: Arc<Mutex<AppState>>,
}

impl ProgressSink for TuiProgress {
    fn event(&self, event: ProgressEvent) {
        if let Ok(mut state) = self.state.lock() {
            let message = event.message.trim().to_string();
            if let Some(payload) = strip_phase(&message) {
                state.status = payload.to_string();
            }
            let line = match event.elapsed {
                Some(elapsed) => format!("[{}] {message} ({} ms)", timestamp(), elapsed.as_millis()),
                None => format!("[{}] {message}", timestamp()),
            };
            push_log(&mut state.logs, line);
        }
    }
}

pub struct Tui<F: AssetFetcher + 'static> {
    app: Arc<App<F>>,
    state: Arc<Mutex<AppState>>,
    records: Vec<ShortcutRecord>,
    selected: ListState,
    input: String,
    view: View,
    log_scroll: u16,
    pending: Option<Receiver<Result<ApplyResult, GridError>>>,
}

impl<F: AssetFetcher + 'static> Tui<F> {
    pub fn new(app: App<F>, listing: ListResult) -> Self {
        let status = format!(
            "Loaded {} shortcuts from {}",
            listing.shortcuts.len(),
            listing.shortcuts_path
        );
        let mut selected = ListState::default();
        if !listing.shortcuts.is_empty() {
            selected.select(Some(0));
        }
        Self {
            app: Arc::new(app),
            state: Arc::new(Mutex::new(AppState {
                status,
                status_color: Color::Gray,
                logs: VecDeque::new(),
                active: false,
            })),
            records: listing.shortcuts,
            selected,
            input: String::new(),
            view: View::Main,
            log_scroll: 0,
            pending: None,
        }
    }

    pub fn run(&mut self) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        let mut tick = 0usize;
        loop {
            self.collect_finished();
            terminal
                .draw(|frame| self.draw(frame, tick))
                .into_diagnostic()?;

            if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
            tick = tick.wrapping_add(1);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match key.code {
            KeyCode::F(1) => self.view = View::Help,
            KeyCode::F(4) => self.view = View::Logs,
            KeyCode::F(5) => self.reload(),
            KeyCode::Esc => {
                if self.view != View::Main {
                    self.view = View::Main;
                } else if !self.is_active() {
                    return true;
                }
            }
            KeyCode::Char('q') if self.input.is_empty() && !self.is_active() => return true,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.scroll_logs(-5),
            KeyCode::PageDown => self.scroll_logs(5),
            KeyCode::Enter => self.start_apply(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => self.input.push(ch),
            _ => {}
        }
        false
    }

    fn start_apply(&mut self) {
        if self.is_active() {
            return;
        }
        let Some(record) = self
            .selected
            .selected()
            .and_then(|index| self.records.get(index))
        else {
            self.set_status("Please select a non-Steam shortcut from the list.", Color::Yellow);
            return;
        };
        let source = self.input.trim().to_string();
        if !is_all_digits(&source) {
            self.set_status(
                "Please enter a valid numeric Steam AppID to copy from.",
                Color::Yellow,
            );
            return;
        }

        let target = record.app_id;
        self.set_status(
            &format!("Downloading artwork for AppID {source} -> applying to non-Steam ID {target} ..."),
            Color::Cyan,
        );
        self.set_active(true);

        let (tx, rx) = mpsc::channel();
        let app = Arc::clone(&self.app);
        let sink = TuiProgress {
            state: Arc::clone(&self.state),
        };
        thread::spawn(move || {
            let _ = tx.send(app.apply(target, &source, &sink));
        });
        self.pending = Some(rx);
    }

    fn collect_finished(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                Err(GridError::Filesystem("apply worker stopped".to_string()))
            }
        };
        self.pending = None;
        self.set_active(false);
        match outcome {
            Ok(result) => {
                let color = if result.assets.failed() == 0 {
                    Color::Green
                } else {
                    Color::Yellow
                };
                self.set_status(&result.summary(), color);
            }
            Err(err) => self.set_status(&err.to_string(), Color::Red),
        }
    }

    fn reload(&mut self) {
        if self.is_active() {
            return;
        }
        let sink = TuiProgress {
            state: Arc::clone(&self.state),
        };
        match self.app.list(&sink) {
            Ok(listing) => {
                self.records = listing.shortcuts;
                let selected = match self.selected.selected() {
                    _ if self.records.is_empty() => None,
                    Some(index) => Some(index.min(self.records.len() - 1)),
                    None => Some(0),
                };
                self.selected.select(selected);
                self.set_status(
                    &format!(
                        "Loaded {} shortcuts from {}",
                        self.records.len(),
                        listing.shortcuts_path
                    ),
                    Color::Gray,
                );
            }
            Err(err) => self.set_status(&err.to_string(), Color::Red),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.records.is_empty() {
            return;
        }
        let last = self.records.len() - 1;
        let current = self.selected.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(last);
        self.selected.select(Some(next));
    }

    fn scroll_logs(&mut self, delta: i16) {
        let max = self.state.lock().map(|state| state.logs.len()).unwrap_or(0);
        let max_scroll = max.saturating_sub(1) as i16;
        let next = (self.log_scroll as i16 + delta).clamp(0, max_scroll);
        self.log_scroll = next as u16;
    }

    fn is_active(&self) -> bool {
        self.state.lock().map(|state| state.active).unwrap_or(false)
    }

    fn set_active(&self, active: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.active = active;
        }
    }

    fn set_status(&self, status: &str, color: Color) {
        if let Ok(mut state) = self.state.lock() {
            state.status = status.to_string();
            state.status_color = color;
            push_log(&mut state.logs, format!("[{}] {status}", timestamp()));
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame, tick: usize) {
        match self.view {
            View::Main => self.draw_main(frame, tick),
            View::Logs => self.draw_logs(frame),
            View::Help => draw_help(frame),
        }
    }

    fn draw_main(&mut self, frame: &mut ratatui::Frame, tick: usize) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(5),
            ])
            .split(frame.area());

        let account = self.app.account();
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "STEAM-GRID-RIPPER",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "   Steam userdata: {}   (SteamID: {})",
                account.root(),
                account.id
            )),
        ]))
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, chunks[0]);

        let items: Vec<ListItem> = self
            .records
            .iter()
            .map(|record| ListItem::new(record.to_string()))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Non-Steam shortcuts (select one)"),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[1], &mut self.selected);

        self.draw_input(frame, chunks[2], tick);

        let (status, color) = self
            .state
            .lock()
            .map(|state| (state.status.clone(), state.status_color))
            .unwrap_or_else(|_| (String::new(), Color::Gray));
        let status = Paragraph::new(status)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::TOP).title("Status"));
        frame.render_widget(status, chunks[3]);
    }

    fn draw_input(&self, frame: &mut ratatui::Frame, area: Rect, tick: usize) {
        let prefix = "Source AppID: ";
        let line = if self.is_active() {
            let spin = SPINNER[tick % SPINNER.len()];
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::Gray)),
                Span::raw(self.input.clone()),
                Span::styled(format!("   {spin} applying"), Style::default().fg(Color::Cyan)),
            ])
        } else if self.input.is_empty() {
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::Gray)),
                Span::styled(
                    "Enter source Steam AppID (e.g. 271590), then Enter to download and apply",
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::Gray)),
                Span::raw(self.input.clone()),
            ])
        };
        let input = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(input, area);
        let x = area.x + 1 + (prefix.len() + self.input.chars().count()) as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }

    fn draw_logs(&self, frame: &mut ratatui::Frame) {
        let lines: Vec<Line> = self
            .state
            .lock()
            .map(|state| state.logs.iter().map(|l| Line::from(l.clone())).collect())
            .unwrap_or_default();
        let logs = Paragraph::new(lines)
            .scroll((self.log_scroll, 0))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Logs (PgUp/PgDn scroll, Esc back)"),
            );
        frame.render_widget(logs, frame.area());
    }
}

fn draw_help(frame: &mut ratatui::Frame) {
    let lines = vec![
        Line::from(Span::styled(
            "KEYS",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("Up/Down   select a shortcut"),
        Line::from("0-9       type the source AppID"),
        Line::from("Enter     download artwork and apply it to the selection"),
        Line::from("F5        reload shortcuts.vdf"),
        Line::from("F4        logs"),
        Line::from("Esc / q   back or quit"),
        Line::from(""),
        Line::from("Steam only picks up new artwork after a restart."),
    ];
    let help = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(help, frame.area());
}

fn strip_phase(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("phase=")?;
    rest.split_once(';').map(|(_, payload)| payload.trim())
}

fn push_log(buffer: &mut VecDeque<String>, item: String) {
    buffer.push_back(item);
    while buffer.len() > LOGS_MAX {
        buffer.pop_front();
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_prefix_is_stripped() {
        assert_eq!(strip_phase("phase=Fetch; AppID 1 -> 2"), Some("AppID 1 -> 2"));
        assert_eq!(strip_phase("asset Cover: ok"), None);
    }

    #[test]
    fn log_buffer_is_bounded() {
        let mut logs = VecDeque::new();
        for i in 0..(LOGS_MAX + 10) {
            push_log(&mut logs, i.to_string());
        }
        assert_eq!(logs.len(), LOGS_MAX);
        assert_eq!(logs.front().map(String::as_str), Some("10"));
    }
}
