//! Ratatui-based inspector.
//!
//! Shows the cleaned table with flagged outliers highlighted, the missing-value
//! summary and a chart of one numeric column. Cells can be edited in place; edits
//! update the missing-value pane immediately and the outlier flags on `r`.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
};

use crate::domain::CanonicalTable;
use crate::error::{AppError, SessionError};
use crate::io::ingest::Upload;
use crate::session::Session;

mod plotters_chart;

use plotters_chart::ColumnChart;

const DATE_WIDTH: u16 = 10;
const CELL_WIDTH: u16 = 12;
const PAGE: usize = 10;

/// Start the inspector on a loaded session. Saves go to `out_dir`.
pub fn run(session: Session, out_dir: PathBuf) -> Result<(), AppError> {
    let upload = session
        .loaded()
        .map(|d| d.upload.clone())
        .ok_or(SessionError::NotLoaded)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(session, upload, out_dir);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    Editing(String),
}

struct App {
    session: Session,
    /// Kept so a failed type switch can be retried.
    upload: Upload,
    out_dir: PathBuf,
    table_state: TableState,
    /// Selected header index (0 is `date`).
    column: usize,
    /// First value column shown when the table is wider than the pane.
    column_offset: usize,
    chart_column: usize,
    mode: Mode,
    flags_stale: bool,
    status: String,
}

impl App {
    fn new(session: Session, upload: Upload, out_dir: PathBuf) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        let mut app = Self {
            session,
            upload,
            out_dir,
            table_state,
            column: 1,
            column_offset: 1,
            chart_column: 0,
            mode: Mode::Browse,
            flags_stale: false,
            status: "Loaded.".to_string(),
        };
        app.reset_selection();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    fn header(&self) -> Vec<String> {
        self.session.table().map(CanonicalTable::header).unwrap_or_default()
    }

    fn row_count(&self) -> usize {
        self.session.table().map_or(0, CanonicalTable::len)
    }

    fn numeric_columns(&self) -> Vec<String> {
        self.session
            .table()
            .map(|t| t.numeric_columns().map(|(name, _)| name.to_string()).collect())
            .unwrap_or_default()
    }

    fn selected_row(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn reset_selection(&mut self) {
        self.table_state.select(Some(0));
        self.column = if self.header().len() > 1 { 1 } else { 0 };
        self.column_offset = 1;
        let numeric = self.numeric_columns();
        self.chart_column = numeric.iter().position(|c| c == "close").unwrap_or(0);
        self.flags_stale = false;
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if let Mode::Editing(buffer) = &mut self.mode {
            match code {
                KeyCode::Esc => {
                    self.mode = Mode::Browse;
                    self.status = "Edit canceled.".to_string();
                }
                KeyCode::Enter => {
                    let value = std::mem::take(buffer);
                    self.mode = Mode::Browse;
                    self.commit_edit(value);
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return false;
        }

        let rows = self.row_count();
        let columns = self.header().len();
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => self.move_row(-1, rows),
            KeyCode::Down => self.move_row(1, rows),
            KeyCode::PageUp => self.move_row(-(PAGE as isize), rows),
            KeyCode::PageDown => self.move_row(PAGE as isize, rows),
            KeyCode::Home => self.table_state.select(Some(0)),
            KeyCode::End => self.table_state.select(Some(rows.saturating_sub(1))),
            KeyCode::Left => self.column = self.column.saturating_sub(1),
            KeyCode::Right => {
                if self.column + 1 < columns {
                    self.column += 1;
                }
            }
            KeyCode::Enter => self.start_edit(),
            KeyCode::Char('x') | KeyCode::Delete => self.clear_edit(),
            KeyCode::Char('r') => self.recompute(),
            KeyCode::Char('t') => self.toggle_type(),
            KeyCode::Char('c') => {
                let n = self.numeric_columns().len();
                if n > 0 {
                    self.chart_column = (self.chart_column + 1) % n;
                }
            }
            KeyCode::Char('s') => self.save(),
            _ => {}
        }
        false
    }

    fn move_row(&mut self, delta: isize, rows: usize) {
        if rows == 0 {
            return;
        }
        let next = (self.selected_row() as isize + delta).clamp(0, rows as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn start_edit(&mut self) {
        let header = self.header();
        let Some(name) = header.get(self.column) else {
            return;
        };
        if self.column == 0 {
            self.status = "The date column is the row key and cannot be edited.".to_string();
            return;
        }
        let current = match (self.session.table(), self.session.edits()) {
            (Some(table), Some(edits)) => table.effective_cell(edits, self.selected_row(), name).unwrap_or_default(),
            _ => String::new(),
        };
        self.mode = Mode::Editing(current);
        self.status = format!("Editing `{name}` (Enter to apply, Esc to cancel).");
    }

    fn commit_edit(&mut self, value: String) {
        let header = self.header();
        let Some(name) = header.get(self.column) else {
            return;
        };
        let row = self.selected_row();
        match self.session.apply_edit(row, name, value) {
            Ok(()) => {
                self.flags_stale = true;
                self.status = format!("Edited row {row} `{name}`. Press r to refresh outlier flags.");
            }
            Err(e) => self.status = format!("Edit rejected: {e}"),
        }
    }

    fn clear_edit(&mut self) {
        let header = self.header();
        let Some(name) = header.get(self.column) else {
            return;
        };
        let row = self.selected_row();
        match self.session.clear_edit(row, name) {
            Ok(true) => {
                self.flags_stale = true;
                self.status = format!("Cleared edit at row {row} `{name}`.");
            }
            Ok(false) => self.status = "No edit on this cell.".to_string(),
            Err(e) => self.status = e.to_string(),
        }
    }

    fn recompute(&mut self) {
        match self.session.recompute() {
            Ok(report) => {
                self.status = format!("Recomputed outlier flags: {} flagged.", report.total_flagged());
                self.flags_stale = false;
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn toggle_type(&mut self) {
        let next = self.session.data_type().toggled();
        let mut result = self.session.switch_type(next);
        // A previous failed switch leaves nothing to reload; start from the upload again.
        if result.is_ok() && self.session.loaded().is_none() {
            result = self.session.load(self.upload.clone());
        }
        self.reset_selection();
        self.status = match result {
            Ok(()) => format!("Switched to {next} data; edits cleared."),
            Err(e) => format!("Cannot load as {next}: {e} (press t to switch back)"),
        };
    }

    fn save(&mut self) {
        self.status = match self.session.export_to_dir(&self.out_dir) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => format!("Save failed: {e}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(chunks[1]);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Min(0)])
            .split(body[1]);

        self.draw_table(frame, body[0]);
        self.draw_missing(frame, side[0]);
        self.draw_chart(frame, side[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let gray = Style::default().fg(Color::Gray);
        let mut lines = vec![Line::from(vec![
            Span::styled("fitclean", Style::default().fg(Color::Cyan)),
            Span::raw(" | Data Cleaner & Inspector"),
        ])];

        match self.session.loaded() {
            Some(data) => {
                let s = &data.normalized.summary;
                lines.push(Line::from(Span::styled(
                    format!(
                        "file: {} | type: {} | rows kept {} of {} | rejected {} | duplicates {} | cell errors {}",
                        data.upload.file_name,
                        s.data_type,
                        s.rows_kept,
                        s.rows_read,
                        s.rejected_rows.len(),
                        s.duplicates_dropped,
                        s.cell_errors.len(),
                    ),
                    gray,
                )));
                let config = self.session.config();
                let mut spans = vec![Span::styled(
                    format!(
                        "outliers: {} flagged (k={}, {:?}) | edits: {}",
                        data.outliers.total_flagged(),
                        config.iqr_multiplier,
                        config.quartile_method,
                        data.edits.len(),
                    ),
                    gray,
                )];
                if self.flags_stale {
                    spans.push(Span::styled(
                        " | flags stale: press r",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ));
                }
                lines.push(Line::from(spans));
            }
            None => lines.push(Line::from(Span::styled(
                format!("type: {} | no data loaded", self.session.data_type()),
                Style::default().fg(Color::Yellow),
            ))),
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_table(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Cleaned table").borders(Borders::ALL);
        let (Some(data), header) = (self.session.loaded(), self.header()) else {
            frame.render_widget(Paragraph::new("No data loaded.").block(block), area);
            return;
        };
        let table = &data.normalized.table;

        // Window the value columns so the selected one stays visible.
        let inner_width = area.width.saturating_sub(2);
        let fit = (inner_width.saturating_sub(DATE_WIDTH + 1) / (CELL_WIDTH + 1)).max(1) as usize;
        let focus = self.column.max(1);
        if focus < self.column_offset {
            self.column_offset = focus;
        } else if focus >= self.column_offset + fit {
            self.column_offset = focus + 1 - fit;
        }
        let visible: Vec<usize> = std::iter::once(0)
            .chain((self.column_offset..header.len()).take(fit))
            .collect();

        let header_row = Row::new(visible.iter().map(|&c| {
            let style = if c == self.column {
                Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            Cell::from(header[c].clone()).style(style)
        }));

        let selected = self.selected_row();
        let rows = (0..table.len()).map(|row| {
            Row::new(visible.iter().map(|&c| {
                let name = &header[c];
                let text = table.effective_cell(&data.edits, row, name).unwrap_or_default();
                let mut style = if data.edits.contains_key(&(row, name.clone())) {
                    Style::default().fg(Color::Yellow)
                } else if data.outliers.is_flagged(row, name) {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                if row == selected && c == self.column {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                if text.is_empty() {
                    Cell::from("·").style(style.fg(Color::DarkGray))
                } else {
                    Cell::from(text).style(style)
                }
            }))
        });

        let widths = visible
            .iter()
            .map(|&c| Constraint::Length(if c == 0 { DATE_WIDTH } else { CELL_WIDTH }));
        let title = format!("Cleaned table (row {} of {})", selected + 1, table.len());
        let widget = Table::new(rows, widths)
            .header(header_row)
            .block(Block::default().title(title).borders(Borders::ALL))
            .row_highlight_style(Style::default().bg(Color::Rgb(40, 40, 40)));

        frame.render_stateful_widget(widget, area, &mut self.table_state);
    }

    fn draw_missing(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Missing values").borders(Borders::ALL);
        let Some(report) = self.session.missing_report() else {
            frame.render_widget(Paragraph::new("-").block(block), area);
            return;
        };

        let lines: Vec<Line> = report
            .columns
            .iter()
            .map(|c| {
                let style = if c.count > 0 {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::Gray)
                };
                let preview: Vec<String> = c.positions.iter().take(6).map(|p| p.to_string()).collect();
                let more = if c.positions.len() > 6 { ", ..." } else { "" };
                Line::from(Span::styled(
                    format!("{:<12} {:>5}  {}{more}", c.column, c.count, preview.join(", ")),
                    style,
                ))
            })
            .collect();

        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let numeric = self.numeric_columns();
        let name = numeric.get(self.chart_column).cloned();
        let title = match &name {
            Some(n) => format!("Chart: {n} (red = flagged, c to cycle)"),
            None => "Chart".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(name) = name else {
            frame.render_widget(Paragraph::new("No numeric column to chart."), inner);
            return;
        };
        let values = self.session.effective_values(&name).unwrap_or_default();
        let line: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(row, v)| v.map(|y| (row as f64, y)))
            .collect();
        let outliers: Vec<(f64, f64)> = match self.session.outliers().and_then(|o| o.column(&name)) {
            Some(col) => col
                .flagged
                .iter()
                .filter_map(|&row| values.get(row).copied().flatten().map(|y| (row as f64, y)))
                .collect(),
            None => Vec::new(),
        };

        let Some((x_bounds, y_bounds)) = ColumnChart::fit_bounds(&line) else {
            frame.render_widget(
                Paragraph::new("All values missing.").style(Style::default().fg(Color::Yellow)),
                inner,
            );
            return;
        };
        frame.render_widget(
            ColumnChart {
                line: &line,
                outliers: &outliers,
                x_bounds,
                y_bounds,
                y_label: &name,
            },
            inner,
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = match &self.mode {
            Mode::Editing(buffer) => Line::from(vec![
                Span::styled("edit> ", Style::default().fg(Color::Cyan)),
                Span::raw(format!("{buffer}_")),
                Span::raw(" | "),
                Span::styled(&self.status, Style::default().fg(Color::Yellow)),
            ]),
            Mode::Browse => Line::from(vec![
                Span::styled(
                    "arrows move  Enter edit  x clear  r recompute  t type  c chart  s save  q quit",
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(" | "),
                Span::styled(&self.status, Style::default().fg(Color::Yellow)),
            ]),
        };
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::domain::NormalizeConfig;

    const PRICES: &str = "Date,Price,Vol.\n\
                          01/01/2024,10,1K\n\
                          01/02/2024,12,\n\
                          01/03/2024,11,2K\n\
                          01/04/2024,13,2K\n\
                          01/05/2024,12,3K\n\
                          01/06/2024,11,1K\n\
                          01/07/2024,100,2K\n";

    fn app() -> App {
        let upload = Upload::new("prices.csv", PRICES);
        let mut session = Session::new(NormalizeConfig::default());
        session.load(upload.clone()).unwrap();
        App::new(session, upload, std::env::temp_dir())
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn editing_a_cell_marks_flags_stale_until_recompute() {
        let mut app = app();
        app.handle_key(KeyCode::End);
        for _ in 0..3 {
            app.handle_key(KeyCode::Right);
        }
        assert_eq!(app.header()[app.column], "close");

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.mode, Mode::Editing("100".to_string()));
        for _ in 0..3 {
            app.handle_key(KeyCode::Backspace);
        }
        type_text(&mut app, "12");
        app.handle_key(KeyCode::Enter);

        assert!(app.flags_stale);
        assert!(app.session.outliers().unwrap().is_flagged(6, "close"));
        app.handle_key(KeyCode::Char('r'));
        assert!(!app.flags_stale);
        assert!(!app.session.outliers().unwrap().is_flagged(6, "close"));
    }

    #[test]
    fn escape_cancels_an_edit() {
        let mut app = app();
        app.handle_key(KeyCode::Enter);
        type_text(&mut app, "999");
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.mode, Mode::Browse);
        assert!(app.session.edits().unwrap().is_empty());
    }

    #[test]
    fn date_column_is_not_editable() {
        let mut app = app();
        app.handle_key(KeyCode::Left);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.mode, Mode::Browse);
        assert!(app.status.contains("cannot be edited"));
    }

    #[test]
    fn type_toggle_clears_edits_and_changes_schema() {
        let mut app = app();
        app.handle_key(KeyCode::Enter);
        type_text(&mut app, "5");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.session.edits().unwrap().len(), 1);

        app.handle_key(KeyCode::Char('t'));
        assert_eq!(app.header(), vec!["date", "close", "volume"]);
        assert!(app.session.edits().unwrap().is_empty());
    }

    #[test]
    fn q_quits_only_outside_edit_mode() {
        let mut app = app();
        app.handle_key(KeyCode::Enter);
        assert!(!app.handle_key(KeyCode::Char('q')));
        app.handle_key(KeyCode::Esc);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn renders_without_panicking() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let mut small = Terminal::new(TestBackend::new(30, 12)).unwrap();
        small.draw(|f| app.draw(f)).unwrap();
    }
}
