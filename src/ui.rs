use crate::app::{ActiveInput, App, InputMode};
use crate::models::{Priority, Task};
use crate::notify::NotificationKind;
use crate::storage::TaskStorage;
use chrono::NaiveDate;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

/// Due dates are free text; only ISO dates before `today` count as overdue.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    if task.completed {
        return false;
    }
    match NaiveDate::parse_from_str(task.due_date.trim(), "%Y-%m-%d") {
        Ok(due) => due < today,
        Err(_) => false,
    }
}

fn priority_color(priority: &str) -> Color {
    match Priority::parse(priority) {
        Some(Priority::High) => Color::Red,
        Some(Priority::Medium) => Color::Yellow,
        _ => Color::Green,
    }
}

fn task_line(task: &Task, today: NaiveDate) -> Line<'static> {
    let mut spans = Vec::new();

    let name_style = if task.completed {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    spans.push(Span::styled(task.name.clone(), name_style));

    if !task.due_date.is_empty() {
        let due_style = if is_overdue(task, today) {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" (Due: {})", task.due_date), due_style));
    }

    if !task.category.is_empty() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!(" {} ", task.category),
            Style::default().bg(Color::Cyan).fg(Color::Black),
        ));
    }

    if !task.priority.is_empty() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!(" {} ", task.priority),
            Style::default()
                .bg(priority_color(&task.priority))
                .fg(Color::Black),
        ));
    }

    Line::from(spans)
}

fn detail_lines(task: &Task) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let or_none = |value: &str, none: &str| {
        if value.is_empty() {
            none.to_string()
        } else {
            value.to_string()
        }
    };

    vec![
        Line::from(vec![Span::styled("Name: ", bold), Span::raw(task.name.clone())]),
        Line::from(vec![
            Span::styled("Status: ", bold),
            Span::raw(if task.completed { "Done" } else { "Open" }),
        ]),
        Line::from(vec![
            Span::styled("Due Date: ", bold),
            Span::raw(or_none(&task.due_date, "No due date")),
        ]),
        Line::from(vec![
            Span::styled("Category: ", bold),
            Span::raw(or_none(&task.category, "No category")),
        ]),
        Line::from(vec![
            Span::styled("Priority: ", bold),
            Span::raw(or_none(&task.priority, "No priority")),
        ]),
    ]
}

fn get_legend(input_mode: InputMode) -> Text<'static> {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Red));
    match input_mode {
        InputMode::Normal => Text::from(Line::from(vec![
            key(" q "),
            Span::raw(": Quit "),
            key(" j/k "),
            Span::raw(": Down/Up "),
            key(" Space "),
            Span::raw(": Toggle Done "),
            key(" a "),
            Span::raw(": Add Task "),
            key(" n "),
            Span::raw(": Quick Add "),
            key(" e "),
            Span::raw(": Edit "),
            key(" d "),
            Span::raw(": Delete "),
            key(" / "),
            Span::raw(": Search "),
            key(" c "),
            Span::raw(": Category "),
            key(" Esc "),
            Span::raw(": Clear Filters "),
        ])),
        InputMode::Editing => Text::from(Line::from(vec![
            key(" Tab "),
            Span::raw(": Next Field "),
            key(" Left/Right "),
            Span::raw(": Choose "),
            key(" Enter "),
            Span::raw(": Submit "),
            key(" Esc "),
            Span::raw(": Cancel "),
        ])),
        InputMode::Search | InputMode::QuickAdd => Text::from(Line::from(vec![
            key(" Enter "),
            Span::raw(": Accept "),
            key(" Esc "),
            Span::raw(": Cancel "),
        ])),
    }
}

fn draw_form<S: TaskStorage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let popup_width = (area.width * 60 / 100).saturating_sub(2).max(10);
    let name_lines = calculate_wrapped_lines(&app.draft.name, popup_width).max(1);
    let popup_height = std::cmp::min(name_lines as u16 + 5, area.height);
    let popup_area = centered_rect_absolute(popup_width + 2, popup_height, area);

    let field = |label: &'static str, value: &str, input: ActiveInput| {
        let style = if app.active_input == input {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(vec![Span::styled(label, style), Span::raw(value.to_string())])
    };

    let lines = vec![
        field("Name: ", &app.draft.name, ActiveInput::Name),
        field("Due Date: ", &app.draft.due_date, ActiveInput::DueDate),
        field("Category: ", &app.draft.category, ActiveInput::Category),
        field("Priority: ", &app.draft.priority, ActiveInput::Priority),
    ];

    let popup_block = Block::default()
        .title(format!("{} (Press Enter to Submit)", app.form_title()))
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    let input = Paragraph::new(lines)
        .block(popup_block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn draw_prompt(f: &mut Frame, title: &str, value: &str, area: Rect) {
    let popup_width = (area.width * 60 / 100).saturating_sub(2).max(10);
    let popup_area = centered_rect_absolute(popup_width + 2, 3, area);
    let input = Paragraph::new(value.to_string())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Green)),
        );
    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

pub fn draw<S: TaskStorage>(f: &mut Frame, app: &mut App<S>) {
    let size = f.area();
    let today = chrono::Local::now().date_naive();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    // Progress
    let progress = app.store.progress();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Blue))
        .ratio(progress / 100.0)
        .label(format!("{}%", progress.round() as u32));
    f.render_widget(gauge, chunks[0]);

    // Search and filter
    let category = if app.category_filter.is_empty() {
        "All"
    } else {
        app.category_filter.as_str()
    };
    let mut search_spans = vec![
        Span::styled(" Search: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(app.search.clone()),
    ];
    if app.input_mode == InputMode::Search {
        search_spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
    }
    search_spans.push(Span::styled(
        "  Category: ",
        Style::default().add_modifier(Modifier::BOLD),
    ));
    search_spans.push(Span::raw(category.to_string()));
    f.render_widget(Paragraph::new(Line::from(search_spans)), chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(chunks[2]);

    // Left panel: Task list
    let task_title = format!(
        "Tasks ({}/{})",
        app.store.completed_count(),
        app.store.len()
    );
    let visible = app.visible_tasks();
    let tasks_widget = if app.store.is_empty() {
        List::new(vec![ListItem::new("No tasks added yet!")])
            .block(Block::default().borders(Borders::ALL).title(task_title))
    } else if visible.is_empty() {
        List::new(vec![ListItem::new("No matching tasks")])
            .block(Block::default().borders(Borders::ALL).title(task_title))
    } else {
        let items: Vec<ListItem> = visible
            .iter()
            .map(|task| ListItem::new(task_line(task, today)))
            .collect();
        List::new(items)
            .block(Block::default().borders(Borders::ALL).title(task_title))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol(">> ")
    };
    f.render_stateful_widget(tasks_widget, body[0], &mut app.state);

    // Right panel: Task details
    let detail_block = Block::default().borders(Borders::ALL).title("Task Details");
    let details = match app.selected_task() {
        Some(task) => Paragraph::new(detail_lines(task)),
        None => Paragraph::new("Select a task to see its details"),
    };
    f.render_widget(details.block(detail_block).wrap(Wrap { trim: true }), body[1]);

    // Toast
    if let Some(toast) = app.toasts.visible(Instant::now()) {
        let color = match toast.kind {
            NotificationKind::Success => Color::Green,
            NotificationKind::Error => Color::Red,
        };
        let line = Paragraph::new(toast.message)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        f.render_widget(line, chunks[3]);
    }

    match app.input_mode {
        InputMode::Editing => draw_form(f, app, chunks[2]),
        InputMode::QuickAdd => draw_prompt(
            f,
            "Quick Add (#category !priority @date)",
            &app.quick_add,
            chunks[2],
        ),
        InputMode::Normal | InputMode::Search => {}
    }

    // Render the legend in the footer
    let legend = Paragraph::new(get_legend(app.input_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(legend, chunks[4]);
}

pub fn run_app<B: Backend, S: TaskStorage>(
    terminal: &mut Terminal<B>,
    mut app: App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_input(key) {
                    return Ok(());
                }
            }
        }
    }
}

fn calculate_wrapped_lines(text: &str, max_width: u16) -> usize {
    let max_width = max_width.max(1);
    let mut line_count = 0;
    for line in text.lines() {
        let line_width = line.chars().count() as u16;
        line_count += line_width.div_ceil(max_width) as usize;
    }
    line_count
}
