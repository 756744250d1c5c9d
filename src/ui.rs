use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, AppState, FormField, FormRow},
    operation::Operation,
    session::SessionEngine,
    settings::TimerMinutes,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Configuring => render_form(self, area, buf),
            AppState::Playing => {
                if let Some(engine) = self.engine() {
                    render_play(engine, area, buf);
                }
            }
            AppState::Results => render_results(self.final_score().unwrap_or(0), area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Split `area` into a vertically centered band of `height` rows
fn centered_band(area: Rect, height: u16) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    chunks[1]
}

fn render_form(app: &App, area: Rect, buf: &mut Buffer) {
    let settings = app.collector().settings();
    let focused = Style::default()
        .patch(bold())
        .add_modifier(Modifier::REVERSED);

    let cell_style = |row: FormRow, field: Option<FormField>| -> Style {
        let on_row = app.cursor.row() == row;
        let on_field = field.map_or(true, |f| f == app.cursor.field);
        if on_row && on_field {
            focused
        } else {
            Style::default()
        }
    };

    let mut lines = vec![
        Line::from(Span::styled("mathblitz", bold().fg(Color::Yellow))),
        Line::from(Span::styled(
            "solve as many math problems as possible within the time limit.",
            italic(),
        )),
        Line::from(""),
    ];

    for operation in Operation::ALL {
        let row = FormRow::Operation(operation);
        let config = settings.operation(operation);
        let editing = |field: FormField, value: u64| -> String {
            match app.range_edit() {
                Some(text) if app.cursor.row() == row && app.cursor.field == field => {
                    format!("{text:>6}")
                }
                _ => format!("{value:>6}"),
            }
        };

        lines.push(Line::from(vec![
            Span::styled(
                if config.enabled { "[x]" } else { "[ ]" },
                cell_style(row, Some(FormField::Enabled)),
            ),
            Span::raw(format!(" {:<15}", operation.to_string())),
            Span::styled(
                editing(FormField::Min, config.min),
                cell_style(row, Some(FormField::Min)),
            ),
            Span::raw("  to "),
            Span::styled(
                editing(FormField::Max, config.max),
                cell_style(row, Some(FormField::Max)),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("timer: "),
        Span::styled(
            format!("< {} min >", settings.timer().minutes()),
            cell_style(FormRow::Timer, None),
        ),
        Span::styled(
            format!("  ({}-{})", TimerMinutes::CHOICES[0], TimerMinutes::CHOICES[4]),
            dim(),
        ),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[ start ]",
        cell_style(FormRow::Start, None),
    )));

    if let Some(notice) = app.notice() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(notice, bold().fg(Color::Red))));
    }

    let height = lines.len() as u16;
    let form = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    form.render(centered_band(area, height), buf);

    render_legend(
        "↑/↓ row  ←/→ column  (space) toggle  0-9 edit  (enter) start  (esc)ape",
        area,
        buf,
    );
}

fn render_play(engine: &SessionEngine, area: Rect, buf: &mut Buffer) {
    let input = engine.current_input();
    let lines = vec![
        Line::from(Span::styled("solve the problem", bold())),
        Line::from(""),
        Line::from(Span::styled(
            engine.question_text(),
            bold().fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", dim()),
            Span::styled(input.to_string(), bold().fg(Color::Green)),
            Span::styled("_", dim().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(""),
        Line::from(format!("score: {}", engine.score())),
        Line::from(Span::styled(
            format!("time left: {}", engine.remaining_clock()),
            dim().patch(bold()),
        )),
    ];

    let height = lines.len() as u16 + 2;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(centered_band(area, height), buf);

    render_legend("(esc) end game", area, buf);
}

fn render_results(score: u32, area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled("game over", bold())),
        Line::from(""),
        Line::from(vec![
            Span::raw("your final score is: "),
            Span::styled(score.to_string(), bold().fg(Color::Magenta)),
        ]),
    ];

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(centered_band(area, height), buf);

    render_legend("(r)estart / (c)onfigure / (q)uit", area, buf);
}

fn render_legend(text: &str, area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    let legend_area = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
    Paragraph::new(Span::styled(text.to_string(), italic()))
        .alignment(Alignment::Center)
        .render(legend_area, buf);
}
