//! Ratatui-based terminal UI.
//!
//! The TUI fetches on a worker thread, renders the merged actual and forecast
//! lines of the selected products, and lets the user toggle products in a side
//! panel. Filter changes rebuild the view from the last fetch without
//! re-fetching.

use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::{info, warn};

use crate::app::pipeline::{RunOutput, build_view};
use crate::data::{Completed, FetchedTimeline, RefreshCoordinator, RefreshTicket, TimelineSource, open_source};
use crate::domain::{MergedTimeline, ProductFilter, SeriesKind, TimelineConfig};
use crate::error::AppError;
use crate::report::{NO_DATA, fmt_cents, fmt_status};

mod plotters_chart;

use plotters_chart::{ChartSegment, TimelinePlottersChart};

type FetchResult = Result<FetchedTimeline, AppError>;

/// Start the TUI.
pub fn run(config: TimelineConfig) -> Result<(), AppError> {
    let source = open_source(&config.source)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, source);
    app.start_refresh();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
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

struct App {
    config: TimelineConfig,
    source: Arc<dyn TimelineSource>,
    coordinator: RefreshCoordinator,
    tx: Sender<Completed<FetchResult>>,
    rx: Receiver<Completed<FetchResult>>,
    pending: Option<RefreshTicket>,
    fetched: Option<FetchedTimeline>,
    run: Option<RunOutput>,
    error: Option<String>,
    cursor: usize,
    status: String,
}

impl App {
    fn new(config: TimelineConfig, source: Arc<dyn TimelineSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            config,
            source,
            coordinator: RefreshCoordinator::new(),
            tx,
            rx,
            pending: None,
            fetched: None,
            run: None,
            error: None,
            cursor: 0,
            status: String::new(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.poll_results() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Issue a new fetch; any fetch still in flight becomes stale.
    fn start_refresh(&mut self) {
        let source = Arc::clone(&self.source);
        let ticket = self.coordinator.spawn(self.tx.clone(), move || source.fetch());
        self.pending = Some(ticket);
        self.status = format!("Fetching from {}...", self.source.label());
        info!(generation = ticket.generation(), "refresh started");
    }

    /// Drain finished fetches. Returns true when the view changed.
    fn poll_results(&mut self) -> bool {
        let mut changed = false;
        while let Ok(done) = self.rx.try_recv() {
            let Some(result) = self.coordinator.accept(done) else {
                continue;
            };
            self.pending = None;
            changed = true;
            match result {
                Ok(fetched) => {
                    self.status = format!(
                        "Loaded {} product(s) from {}",
                        fetched.ingest.products.len(),
                        fetched.source
                    );
                    if !fetched.ingest.dropped.is_empty() {
                        self.status.push_str(&format!(" | dropped {}", fetched.ingest.dropped.len()));
                    }
                    self.error = None;
                    self.fetched = Some(fetched);
                    self.clamp_cursor();
                    self.rebuild();
                }
                Err(err) => {
                    warn!(error = %err, "refresh failed");
                    self.error = Some(err.to_string());
                    self.fetched = None;
                    self.run = None;
                    self.status = "Fetch failed. Press r to retry.".to_string();
                }
            }
        }
        changed
    }

    fn rebuild(&mut self) {
        self.run = self
            .fetched
            .as_ref()
            .map(|fetched| build_view(fetched.clone(), &self.config));
    }

    fn product_ids(&self) -> Vec<String> {
        self.fetched
            .as_ref()
            .map(|f| f.ingest.products.iter().map(|p| p.product_id.clone()).collect())
            .unwrap_or_default()
    }

    fn clamp_cursor(&mut self) {
        let n = self.product_ids().len();
        self.cursor = self.cursor.min(n.saturating_sub(1));
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.cursor + 1 < self.product_ids().len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_cursor_product(),
            KeyCode::Char('a') => {
                self.config.filter = ProductFilter::All;
                self.rebuild();
                self.status = "Showing all products.".to_string();
            }
            KeyCode::Char('n') => {
                self.config.filter = ProductFilter::Only(BTreeSet::new());
                self.rebuild();
                self.status = "Showing no products.".to_string();
            }
            KeyCode::Char('p') => {
                self.config.project = !self.config.project;
                self.rebuild();
                self.status = format!("projection: {}", if self.config.project { "on" } else { "off" });
            }
            KeyCode::Char('r') => self.start_refresh(),
            KeyCode::Char('d') => {
                self.status = match &self.run {
                    Some(run) => match crate::debug::write_debug_bundle(run, &self.config) {
                        Ok(path) => format!("Wrote debug bundle: {}", path.display()),
                        Err(err) => format!("Debug write failed: {err}"),
                    },
                    None => "No timeline loaded.".to_string(),
                };
            }
            _ => {}
        }
        false
    }

    fn toggle_cursor_product(&mut self) {
        let ids = self.product_ids();
        let Some(id) = ids.get(self.cursor).cloned() else {
            return;
        };

        let mut selected: BTreeSet<String> = match &self.config.filter {
            ProductFilter::All => ids.iter().cloned().collect(),
            ProductFilter::Only(set) => set.clone(),
        };
        let now_shown = if selected.remove(&id) {
            false
        } else {
            selected.insert(id.clone());
            true
        };

        self.config.filter = if ids.iter().all(|i| selected.contains(i)) {
            ProductFilter::All
        } else {
            ProductFilter::Only(selected)
        };
        self.rebuild();
        self.status = format!("{id}: {}", if now_shown { "shown" } else { "hidden" });
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("ptl", Style::default().fg(Color::Cyan)),
            Span::raw(" - purchase timeline"),
        ]));

        let info = match (&self.fetched, &self.run) {
            (Some(f), Some(run)) => format!(
                "source: {} | fetched: {} | filter: {} | rows: {} | total sales: {} ({})",
                f.source,
                f.fetched_at.format("%Y-%m-%d %H:%M UTC"),
                self.config.filter.label(),
                run.merged.rows.len(),
                run.summary.total_sales,
                fmt_cents(run.summary.total_revenue_cents),
            ),
            _ => format!("source: {} | filter: {}", self.source.label(), self.config.filter.label()),
        };
        lines.push(Line::from(Span::styled(info, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(42)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_side_panel(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Cumulative purchases").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let placeholder = |msg: String, color: Color| Paragraph::new(msg).style(Style::default().fg(color));

        if let Some(err) = &self.error {
            frame.render_widget(placeholder(format!("Fetch failed: {err}"), Color::Red), inner);
            return;
        }
        let Some(run) = &self.run else {
            frame.render_widget(placeholder("Waiting for data...".to_string(), Color::Yellow), inner);
            return;
        };
        if run.merged.is_empty() {
            frame.render_widget(placeholder(NO_DATA.to_string(), Color::Yellow), inner);
            return;
        }

        let (segments, x_bounds, y_bounds) = chart_series(&run.merged);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = TimelinePlottersChart {
            segments: &segments,
            x_bounds,
            y_bounds,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds);
        }
    }

    fn draw_side_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(9)])
            .split(area);

        let shown: Vec<String> = self
            .run
            .as_ref()
            .map(|r| r.merged.products.iter().map(|p| p.product_id.clone()).collect())
            .unwrap_or_default();

        let items: Vec<ListItem> = self
            .fetched
            .iter()
            .flat_map(|f| f.ingest.products.iter())
            .map(|p| {
                let on = self.config.filter.allows(&p.product_id);
                let color = shown
                    .iter()
                    .position(|id| id == &p.product_id)
                    .map(|i| to_tui_color(series_color(i, SeriesKind::Actual)))
                    .unwrap_or(Color::DarkGray);
                ListItem::new(Line::from(vec![
                    Span::raw(if on { "[x] " } else { "[ ] " }),
                    Span::styled(p.product_name.clone(), Style::default().fg(color)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Products").borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        if self.fetched.as_ref().is_some_and(|f| !f.ingest.products.is_empty()) {
            state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let details = self.cursor_details();
        let p = Paragraph::new(Text::from(details.into_iter().map(Line::from).collect::<Vec<_>>()))
            .block(Block::default().title("Details").borders(Borders::ALL));
        frame.render_widget(p, chunks[1]);
    }

    fn cursor_details(&self) -> Vec<String> {
        let Some(id) = self.product_ids().get(self.cursor).cloned() else {
            return vec!["-".to_string()];
        };
        let stats = self
            .run
            .as_ref()
            .and_then(|r| r.summary.products.iter().find(|s| s.product_id == id));
        let Some(s) = stats else {
            return vec![id, "(hidden)".to_string()];
        };

        let target = match (s.sales_target, s.target_pct) {
            (Some(t), Some(pct)) => format!("{t} ({pct:.0}%)"),
            (Some(t), None) => t.to_string(),
            _ => "-".to_string(),
        };
        vec![
            s.product_id.clone(),
            format!("sales: {} / target {target}", s.total_sales),
            format!("revenue: {}", fmt_cents(s.total_revenue_cents)),
            format!("avg price: {}", fmt_cents(s.avg_price_cents)),
            format!("pace: {}", s.rating.map(|r| r.display_name()).unwrap_or("-")),
            format!("status: {}", fmt_status(s)),
            format!(
                "forecast final: {}",
                s.forecast_final.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
            ),
        ]
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ move  space toggle  a all  n none  p projection  r refresh  d debug  q quit";
        let status_style = if self.error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let mut spans = vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
        ];
        if self.pending.is_some() {
            spans.push(Span::styled("loading ", Style::default().fg(Color::Cyan)));
        }
        spans.push(Span::styled(&self.status, status_style));
        let p = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

const PALETTE: [RGBColor; 6] = [
    RGBColor(0, 255, 255),
    RGBColor(255, 215, 0),
    RGBColor(0, 255, 0),
    RGBColor(255, 0, 255),
    RGBColor(255, 80, 80),
    RGBColor(100, 149, 237),
];

/// Actual lines use the palette color; forecasts a faded version of it.
fn series_color(index: usize, kind: SeriesKind) -> RGBColor {
    let RGBColor(r, g, b) = PALETTE[index % PALETTE.len()];
    match kind {
        SeriesKind::Actual => RGBColor(r, g, b),
        SeriesKind::Forecast => RGBColor(r / 2 + 64, g / 2 + 64, b / 2 + 64),
    }
}

fn to_tui_color(c: RGBColor) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

/// Build chart segments and bounds for Plotters.
///
/// Each product column is split wherever a row has no value, so a line never
/// bridges a gap. `x = -days_before` so the start date sits on the right.
fn chart_series(merged: &MergedTimeline) -> (Vec<ChartSegment>, [f64; 2], [f64; 2]) {
    let mut segments = Vec::new();
    for (i, p) in merged.products.iter().enumerate() {
        for kind in [SeriesKind::Actual, SeriesKind::Forecast] {
            let color = series_color(i, kind);
            let mut current: Vec<(f64, f64)> = Vec::new();
            for row in &merged.rows {
                let cell = row.cell(&p.product_id);
                let value = match kind {
                    SeriesKind::Actual => cell.actual,
                    SeriesKind::Forecast => cell.forecast,
                };
                match value {
                    Some(v) => current.push((-(row.days_before as f64), v as f64)),
                    None if !current.is_empty() => segments.push(ChartSegment {
                        points: std::mem::take(&mut current),
                        color,
                    }),
                    None => {}
                }
            }
            if !current.is_empty() {
                segments.push(ChartSegment { points: current, color });
            }
        }
    }

    let mut x_bounds = match (merged.axis.first(), merged.axis.last()) {
        (Some(&first), Some(&last)) => [-(first as f64), -(last as f64)],
        _ => [0.0, 1.0],
    };
    if x_bounds[1] <= x_bounds[0] {
        x_bounds = [x_bounds[0] - 1.0, x_bounds[0] + 1.0];
    }
    let y_max = merged.max_value().unwrap_or(0).max(1) as f64;
    let y_bounds = [0.0, y_max * 1.05];

    (segments, x_bounds, y_bounds)
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 7,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        // Labels show days before start, not the plotted (negated) value.
        let label = format!("{:.0}", -x_val + 0.0);
        let label_len = label.len() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{:.0}", y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("days before start")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("sales").style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
