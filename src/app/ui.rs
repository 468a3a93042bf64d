use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::text::{sanitize_runtime_text, truncate_display_width};
use super::{App, ThemePalette};
use crate::capture::Line as LogLine;

const SENTINEL_ROW: &str = " EOT │ ";

pub(super) fn draw(f: &mut Frame, app: &App) {
    let theme = app.theme;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    let list_height = chunks[0].height as usize;
    let (rows, counter, errors, focused) = app.controller.transcript().read(|log, view| {
        let cursor = view.cursor();
        let mut rows: Vec<Line<'static>> = log
            .lines()
            .iter()
            .enumerate()
            .skip(app.list_offset)
            .take(list_height)
            .map(|(idx, line)| build_row(line, idx == cursor, theme))
            .collect();
        let sentinel = log.sentinel_index();
        if sentinel >= app.list_offset && rows.len() < list_height {
            rows.push(build_sentinel_row(cursor == sentinel, theme));
        }
        let focused = if view.is_following() {
            None
        } else {
            log.get(cursor).map(|line| line.text.clone())
        };
        (
            rows,
            view.counter_label(log.len()),
            log.error_count(),
            focused,
        )
    });
    f.render_widget(Paragraph::new(Text::from(rows)), chunks[0]);

    f.render_widget(
        Paragraph::new(build_info_line(app, &counter, errors, theme)),
        chunks[1],
    );

    if let Some(text) = focused {
        let width = chunks[2].width as usize;
        let status = truncate_display_width(&sanitize_runtime_text(&text), width);
        f.render_widget(
            Paragraph::new(Span::styled(status, theme.status_style())),
            chunks[2],
        );
    }
}

fn build_row(line: &LogLine, selected: bool, theme: ThemePalette) -> Line<'static> {
    let (marker, marker_style, text_style) = if line.is_error {
        (" ╪ ", theme.error_marker_style(), theme.error_style())
    } else {
        (" │ ", theme.muted_style(), theme.body_style())
    };
    let number = format!("{:4}", line.seq);
    let text = sanitize_runtime_text(&line.text);
    if selected {
        let style = theme.highlight_style();
        return Line::from(vec![Span::styled(format!("{number}{marker}{text}"), style)]);
    }
    Line::from(vec![
        Span::styled(number, theme.number_style()),
        Span::styled(marker, marker_style),
        Span::styled(text, text_style),
    ])
}

fn build_sentinel_row(selected: bool, theme: ThemePalette) -> Line<'static> {
    let style = if selected {
        theme.highlight_style()
    } else {
        theme.muted_style()
    };
    Line::from(Span::styled(SENTINEL_ROW, style))
}

fn build_info_line(
    app: &App,
    counter: &str,
    errors: usize,
    theme: ThemePalette,
) -> Line<'static> {
    let caption = app.caption();
    let mut spans = vec![
        Span::styled(caption, theme.caption_style(app.is_finished())),
        Span::raw(" "),
        Span::styled("(", theme.counter_bracket_style()),
        Span::styled(counter.to_string(), theme.counter_value_style()),
        Span::styled(")", theme.counter_bracket_style()),
    ];
    if errors > 0 {
        spans.push(Span::raw(" "));
        spans.push(Span::styled("(", theme.error_bracket_style()));
        spans.push(Span::styled(errors.to_string(), theme.error_value_style()));
        spans.push(Span::styled(")", theme.error_bracket_style()));
    }
    Line::from(spans)
}
