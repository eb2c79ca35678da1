use crate::commands::format_days_remaining;
use crate::error::{BoardError, Result};
use crate::export;
use crate::filter::TaskFilter;
use crate::gantt::GanttLayout;
use crate::kanban_board::{group_by_status, Column, KanbanBoard};
use crate::stats::DashboardStats;
use crate::sweep::SweepTimer;
use crate::task::{parse_date, NewTask, Priority, Task, TaskStatus, TaskUpdate};
use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Frame, Terminal,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Board,
    Timeline,
}

impl View {
    const ALL: [View; 3] = [View::Dashboard, View::Board, View::Timeline];

    fn index(self) -> usize {
        match self {
            View::Dashboard => 0,
            View::Board => 1,
            View::Timeline => 2,
        }
    }

    fn title(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Board => "Board",
            View::Timeline => "Timeline",
        }
    }
}

/// One task field the add and edit prompts step through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Assignee,
    Priority,
    StartDate,
    EndDate,
    Progress,
    Tags,
}

impl Field {
    /// Prompts shown by `a`, in order.
    pub const ADD: [Field; 4] = [Field::Title, Field::EndDate, Field::Priority, Field::Assignee];

    /// Prompts shown by `e`, in order.
    pub const EDIT: [Field; 8] = [
        Field::Title,
        Field::Description,
        Field::Assignee,
        Field::Priority,
        Field::StartDate,
        Field::EndDate,
        Field::Progress,
        Field::Tags,
    ];

    fn prompt(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Assignee => "Assignee",
            Field::Priority => "Priority (low/medium/high/urgent)",
            Field::StartDate => "Start date (YYYY-MM-DD)",
            Field::EndDate => "End date (YYYY-MM-DD)",
            Field::Progress => "Progress (0-100)",
            Field::Tags => "Tags (comma separated)",
        }
    }

    /// The task's current value, used to prefill the edit prompt.
    fn current(self, task: &Task) -> String {
        match self {
            Field::Title => task.title.clone(),
            Field::Description => task.description.clone(),
            Field::Assignee => task.assignee.clone(),
            Field::Priority => task.priority.to_string(),
            Field::StartDate => task.start_date.format("%Y-%m-%d").to_string(),
            Field::EndDate => task.end_date.format("%Y-%m-%d").to_string(),
            Field::Progress => task.progress.to_string(),
            Field::Tags => task.tags.join(", "),
        }
    }

    /// Parse `input` into `update`. Empty input leaves priority, dates and
    /// progress unset; it clears description, assignee and tags.
    fn parse(self, input: &str, update: &mut TaskUpdate) -> std::result::Result<(), String> {
        let input = input.trim();
        match self {
            Field::Title if input.is_empty() => return Err("title cannot be empty".into()),
            Field::Title => update.title = Some(input.to_string()),
            Field::Description => update.description = Some(input.to_string()),
            Field::Assignee => update.assignee = Some(input.to_string()),
            Field::Tags => {
                update.tags = Some(
                    input
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from)
                        .collect(),
                )
            }
            _ if input.is_empty() => {}
            Field::Priority => update.priority = Some(input.parse()?),
            Field::StartDate => update.start_date = Some(parse_date(input)?),
            Field::EndDate => update.end_date = Some(parse_date(input)?),
            Field::Progress => match input.parse::<u8>() {
                Ok(p) if p <= 100 => update.progress = Some(p),
                _ => return Err(format!("invalid progress `{input}`, expected 0-100")),
            },
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    Search,
    /// New task prompts; `draft` collects the answers so far.
    Add { draft: TaskUpdate, step: usize },
    /// Field-by-field edit of an existing task; each answer is saved on Enter.
    Edit { id: String, step: usize },
    ConfirmDelete { id: String },
}

/// UI-only state; everything persistent lives in the board.
pub struct App {
    pub view: View,
    pub mode: Mode,
    pub filter: TaskFilter,
    pub selected_status: usize, // index into the board columns
    pub selected_task: usize,   // index within the selected column
    pub input: String,
    pub message: Option<String>,
    pub export_dir: PathBuf,
    pub sweep: SweepTimer,
}

impl App {
    pub fn new(export_dir: PathBuf, sweep_interval: Duration) -> Self {
        let mut sweep = SweepTimer::new(sweep_interval);
        // opening the board already ran the first sweep
        sweep.mark_run(Instant::now());
        Self {
            view: View::Board,
            mode: Mode::Normal,
            filter: TaskFilter::default(),
            selected_status: 0,
            selected_task: 0,
            input: String::new(),
            message: None,
            export_dir,
            sweep,
        }
    }

    fn columns<'a>(&self, board: &'a KanbanBoard) -> Vec<Column<'a>> {
        group_by_status(self.filter.apply(board.tasks()))
    }

    fn selected<'a>(&self, board: &'a KanbanBoard) -> Option<&'a Task> {
        self.columns(board)
            .get(self.selected_status)
            .and_then(|c| c.tasks.get(self.selected_task).copied())
    }

    fn clamp_selection(&mut self, board: &KanbanBoard) {
        let len = self.columns(board)[self.selected_status].tasks.len();
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    /// Handle one key press. Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent, board: &mut KanbanBoard, today: NaiveDate) -> bool {
        match self.mode.clone() {
            Mode::Normal => return self.handle_normal_key(key, board),
            Mode::Search => match key.code {
                KeyCode::Enter => self.mode = Mode::Normal,
                KeyCode::Esc => {
                    self.filter.search.clear();
                    self.mode = Mode::Normal;
                }
                KeyCode::Backspace => {
                    self.filter.search.pop();
                }
                KeyCode::Char(c) => self.filter.search.push(c),
                _ => {}
            },
            Mode::Add { draft, step } => match key.code {
                KeyCode::Enter => self.submit_add(draft, step, board, today),
                KeyCode::Esc => self.cancel_input(),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            },
            Mode::Edit { id, step } => match key.code {
                KeyCode::Enter => self.submit_edit(id, step, board),
                KeyCode::Esc => self.cancel_input(),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            },
            Mode::ConfirmDelete { id } => {
                if key.code == KeyCode::Char('y') {
                    self.report(board.delete_task(&id).map(|t| format!("deleted {}", t.title)));
                }
                self.mode = Mode::Normal;
            }
        }
        self.clamp_selection(board);
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent, board: &mut KanbanBoard) -> bool {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => {
                self.view = View::ALL[(self.view.index() + 1) % View::ALL.len()];
            }
            KeyCode::Char('1') => self.view = View::Dashboard,
            KeyCode::Char('2') => self.view = View::Board,
            KeyCode::Char('3') => self.view = View::Timeline,
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
            }
            KeyCode::Char('p') => {
                self.filter.cycle_priority();
                self.clamp_selection(board);
            }
            KeyCode::Char('a') => {
                self.input.clear();
                self.mode = Mode::Add {
                    draft: TaskUpdate::default(),
                    step: 0,
                };
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected(board) {
                    self.input = Field::EDIT[0].current(task);
                    self.mode = Mode::Edit {
                        id: task.id.clone(),
                        step: 0,
                    };
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.selected(board) {
                    self.mode = Mode::ConfirmDelete {
                        id: task.id.clone(),
                    };
                }
            }
            KeyCode::Char('x') => {
                let result = export::export_project(board.project(), &self.export_dir, export::export_date())
                    .map(|path| format!("exported to {}", path.display()));
                self.report(result);
            }
            KeyCode::Char('>') | KeyCode::Enter => self.move_selected(board, 1),
            KeyCode::Char('<') => self.move_selected(board, -1),
            KeyCode::Right if shift => self.move_selected(board, 1),
            KeyCode::Left if shift => self.move_selected(board, -1),
            KeyCode::Left => {
                if self.selected_status > 0 {
                    self.selected_status -= 1;
                    self.clamp_selection(board);
                }
            }
            KeyCode::Right => {
                if self.selected_status < TaskStatus::ALL.len() - 1 {
                    self.selected_status += 1;
                    self.clamp_selection(board);
                }
            }
            KeyCode::Up => {
                if self.selected_task > 0 {
                    self.selected_task -= 1;
                }
            }
            KeyCode::Down => {
                let max_tasks = self.columns(board)[self.selected_status].tasks.len();
                if self.selected_task + 1 < max_tasks {
                    self.selected_task += 1;
                }
            }
            _ => {}
        }
        false
    }

    /// Move the selected card one column over and keep it selected.
    fn move_selected(&mut self, board: &mut KanbanBoard, direction: isize) {
        let Some(task) = self.selected(board) else {
            return;
        };
        let id = task.id.clone();
        let target = task.status.shifted(direction);
        if target == task.status {
            return;
        }
        if let Err(e) = board.move_task(&id, target) {
            self.report::<String>(Err(e));
            return;
        }
        self.selected_status = target.index();
        self.selected_task = self.columns(board)[self.selected_status]
            .tasks
            .iter()
            .position(|t| t.id == id)
            .unwrap_or(0);
        self.message = None;
    }

    fn submit_add(&mut self, mut draft: TaskUpdate, step: usize, board: &mut KanbanBoard, today: NaiveDate) {
        if let Err(e) = Field::ADD[step].parse(&self.input, &mut draft) {
            self.message = Some(e);
            return;
        }
        self.input.clear();
        if step + 1 < Field::ADD.len() {
            self.mode = Mode::Add { draft, step: step + 1 };
            return;
        }

        let mut data = NewTask::new(
            draft.title.unwrap_or_default(),
            today,
            draft.end_date.unwrap_or(today),
        );
        data.status = TaskStatus::ALL[self.selected_status];
        data.priority = draft.priority.unwrap_or(data.priority);
        data.assignee = draft.assignee.unwrap_or_default();
        self.report(board.add_task(data).map(|t| format!("added {}", t.title)));
        self.mode = Mode::Normal;
    }

    fn submit_edit(&mut self, id: String, step: usize, board: &mut KanbanBoard) {
        let mut update = TaskUpdate::default();
        if let Err(e) = Field::EDIT[step].parse(&self.input, &mut update) {
            self.message = Some(e);
            return;
        }
        if !update.is_empty() {
            if let Err(e) = board.update_task(&id, update) {
                self.report::<String>(Err(e));
                self.cancel_input();
                return;
            }
        }

        let next = step + 1;
        match board.task(&id) {
            Some(task) if next < Field::EDIT.len() => {
                self.input = Field::EDIT[next].current(task);
                self.mode = Mode::Edit { id, step: next };
            }
            Some(task) => {
                self.message = Some(format!("updated {}", task.title));
                self.cancel_input();
            }
            None => self.cancel_input(),
        }
    }

    fn cancel_input(&mut self) {
        self.input.clear();
        self.mode = Mode::Normal;
    }

    fn report<T: Into<String>>(&mut self, result: Result<T>) {
        match result {
            Ok(msg) => self.message = Some(msg.into()),
            Err(e) => {
                warn!(error = %e, "board operation failed");
                self.message = Some(format!("error: {e}"));
            }
        }
    }
}

fn terminal_error(e: std::io::Error) -> BoardError {
    BoardError::io("terminal", e)
}

/// Main loop: draw, wait for a key or the next sweep, repeat.
pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, board: &mut KanbanBoard, app: &mut App) -> Result<()> {
    loop {
        let now = Instant::now();
        if app.sweep.is_due(now) {
            match board.sweep_overdue(Local::now().date_naive()) {
                Ok(0) => {}
                Ok(n) => {
                    app.message = Some(format!("{n} task(s) now overdue"));
                    app.clamp_selection(board);
                }
                Err(e) => app.report::<String>(Err(e)),
            }
            app.sweep.mark_run(now);
        }

        terminal
            .draw(|f| draw(f, app, board, Local::now().date_naive()))
            .map_err(terminal_error)?;

        let timeout = app.sweep.time_until_due(Instant::now());
        if event::poll(timeout).map_err(terminal_error)? {
            if let Event::Key(key) = event::read().map_err(terminal_error)? {
                if key.kind == KeyEventKind::Press && app.handle_key(key, board, Local::now().date_naive()) {
                    return Ok(());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => Color::Yellow,
        TaskStatus::Doing => Color::Blue,
        TaskStatus::Done => Color::Green,
        TaskStatus::Overdue => Color::Red,
    }
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::Urgent => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Priority::High => Style::default().fg(Color::LightRed),
        Priority::Medium => Style::default().fg(Color::White),
        Priority::Low => Style::default().fg(Color::DarkGray),
    }
}

pub fn draw(f: &mut Frame, app: &App, board: &KanbanBoard, today: NaiveDate) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, board, chunks[0]);
    match app.view {
        View::Dashboard => draw_dashboard(f, app, board, chunks[1]),
        View::Board => draw_board(f, app, board, today, chunks[1]),
        View::Timeline => draw_timeline(f, app, board, today, chunks[1]),
    }
    draw_status_line(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, app: &App, board: &KanbanBoard, area: Rect) {
    let project = board.project();
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.title())))
        .collect();
    let priority = app.filter.priority.map_or("all", Priority::as_str);
    let tabs = Tabs::new(titles)
        .select(app.view.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ({} tasks) ", project.name, board.len()))
                .title_bottom(format!(" search: {}  priority: {} ", app.filter.search, priority)),
        );
    f.render_widget(tabs, area);
}

fn draw_status_line(f: &mut Frame, app: &App, area: Rect) {
    let line = match &app.mode {
        Mode::Normal => match &app.message {
            Some(msg) => Line::from(msg.as_str()),
            None => Line::from(Span::styled(
                "a add  e edit  d delete  </> move  / search  p priority  x export  tab view  q quit",
                Style::default().fg(Color::DarkGray),
            )),
        },
        Mode::Search => Line::from(format!("/{}", app.filter.search)),
        Mode::Add { step, .. } => Line::from(format!(
            "New task {}/{} {}: {}",
            step + 1,
            Field::ADD.len(),
            Field::ADD[*step].prompt(),
            app.input
        )),
        Mode::Edit { id, step } => Line::from(format!(
            "Edit {id} {}/{} {}: {}",
            step + 1,
            Field::EDIT.len(),
            Field::EDIT[*step].prompt(),
            app.input
        )),
        Mode::ConfirmDelete { id } => Line::from(format!("Delete task {id}? (y/n)")),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_board(f: &mut Frame, app: &App, board: &KanbanBoard, today: NaiveDate, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(25); TaskStatus::ALL.len()])
        .split(area);

    for (i, column) in app.columns(board).iter().enumerate() {
        let items: Vec<ListItem> = column
            .tasks
            .iter()
            .map(|t| {
                let mut spans = vec![
                    Span::styled(&t.title, priority_style(t.priority)),
                    Span::raw(format!(" {}%", t.progress)),
                ];
                let remaining = format_days_remaining(t, today);
                if !remaining.is_empty() {
                    spans.push(Span::styled(
                        format!(" ({remaining})"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let title = if column.urgent() > 0 {
            format!(" {} {} ({} urgent) ", column.title(), column.total(), column.urgent())
        } else {
            format!(" {} {} ", column.title(), column.total())
        };

        let selected = app.selected_status == i;
        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(if selected {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default().fg(status_color(column.status))
                    }),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

        let mut state = ListState::default();
        if selected && !column.tasks.is_empty() {
            state.select(Some(app.selected_task));
        }
        f.render_stateful_widget(list, chunks[i], &mut state);
    }
}

fn bar(label: &str, count: usize, percent: f64, width: usize, color: Color) -> Line<'static> {
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    Line::from(vec![
        Span::raw(format!("  {label:<8} ")),
        Span::styled("█".repeat(filled), Style::default().fg(color)),
        Span::styled(
            "░".repeat(width.saturating_sub(filled)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(format!(" {count} ({percent:.1}%)")),
    ])
}

fn draw_dashboard(f: &mut Frame, app: &App, board: &KanbanBoard, area: Rect) {
    let stats = DashboardStats::from_tasks(app.filter.apply(board.tasks()));
    let bar_width = (area.width as usize).saturating_sub(30).min(40);

    let mut lines = vec![
        Line::from(format!(
            "Tasks {}   Completed {} ({:.1}%)   In progress {}   Overdue {}",
            stats.total, stats.completed, stats.completion_rate, stats.in_progress, stats.overdue
        )),
        Line::from(format!(
            "Urgent {}   Assignees {}   Average progress {:.1}%",
            stats.urgent, stats.assignees, stats.avg_progress
        )),
        Line::from(""),
        Line::from(Span::styled("By status", Style::default().add_modifier(Modifier::BOLD))),
    ];
    for status in TaskStatus::ALL {
        let count = stats.by_status.get(status);
        lines.push(bar(
            status.title(),
            count,
            stats.percent_of(count),
            bar_width,
            status_color(status),
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "By priority",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for priority in Priority::ALL {
        let count = stats.by_priority.get(priority);
        let color = priority_style(priority).fg.unwrap_or(Color::White);
        lines.push(bar(priority.as_str(), count, stats.percent_of(count), bar_width, color));
    }

    let block = Block::default().borders(Borders::ALL).title(" Dashboard ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

const TIMELINE_LABEL_WIDTH: usize = 20;

fn draw_timeline(f: &mut Frame, app: &App, board: &KanbanBoard, today: NaiveDate, area: Rect) {
    let layout = GanttLayout::from_tasks(app.filter.apply(board.tasks()), today);
    let block = Block::default().borders(Borders::ALL).title(format!(
        " Timeline {} .. {} ",
        layout.start.format("%d/%m/%Y"),
        layout.end.format("%d/%m/%Y")
    ));

    if layout.is_empty() {
        f.render_widget(Paragraph::new("No tasks to show").block(block), area);
        return;
    }

    let inner_width = (area.width as usize).saturating_sub(2);
    let bar_width = inner_width.saturating_sub(TIMELINE_LABEL_WIDTH + 1);

    // week header
    let mut header = vec![' '; bar_width];
    for date in layout.week_markers() {
        let offset = (date - layout.start).num_days() as f64 / layout.total_days as f64;
        let col = (offset * bar_width as f64) as usize;
        for (k, ch) in date.format("%d/%m").to_string().chars().enumerate() {
            if let Some(cell) = header.get_mut(col + k) {
                *cell = ch;
            }
        }
    }
    let mut lines = vec![Line::from(format!(
        "{:<w$} {}",
        "Task",
        header.into_iter().collect::<String>(),
        w = TIMELINE_LABEL_WIDTH
    ))];

    for row in &layout.rows {
        let (start, len) = row.cells(bar_width);
        let done = ((f64::from(row.progress.min(100)) / 100.0) * len as f64).round() as usize;
        let label: String = row.title.chars().take(TIMELINE_LABEL_WIDTH).collect();
        let color = status_color(row.status);
        lines.push(Line::from(vec![
            Span::raw(format!("{label:<w$} ", w = TIMELINE_LABEL_WIDTH)),
            Span::raw(" ".repeat(start)),
            Span::styled("█".repeat(done), Style::default().fg(color)),
            Span::styled("▒".repeat(len.saturating_sub(done)), Style::default().fg(color)),
            Span::styled(format!(" {}d", row.duration_days), Style::default().fg(Color::DarkGray)),
        ]));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}
