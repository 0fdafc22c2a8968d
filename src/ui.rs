use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use symptom_chat_core::{CardSection, CardView, ChatRole, MessageView};
use crate::app::{App, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut current_text), base));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(bold_text, base.add_modifier(Modifier::BOLD)));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, base));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::User => Style::default().fg(Color::Cyan),
        ChatRole::Assistant => Style::default(),
        ChatRole::System => Style::default().fg(Color::DarkGray),
    }
}

fn section_lines(section: &CardSection, lines: &mut Vec<Line<'static>>) {
    lines.push(Line::from(Span::styled(
        section.heading.clone(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));
    for item in &section.items {
        lines.push(Line::from(vec![
            Span::styled("- ", Style::default().fg(Color::Yellow)),
            Span::raw(item.clone()),
        ]));
    }
}

fn card_lines(card: &CardView, lines: &mut Vec<Line<'static>>) {
    section_lines(&card.conditions, lines);
    if let Some(recommendations) = &card.recommendations {
        section_lines(recommendations, lines);
    }
    if let Some(disclaimer) = &card.disclaimer {
        lines.push(Line::from(Span::styled(
            disclaimer.clone(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
}

/// Lines for one transcript entry, followed by a blank separator.
///
/// Must stay in step with the line estimate in `App::scroll_to_bottom`.
pub fn view_lines(view: &MessageView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match view {
        MessageView::Text { role, text } => {
            let style = role_style(*role);
            if text.is_empty() {
                lines.push(Line::default());
            }
            for line in text.lines() {
                lines.push(parse_markdown_line(line, style));
            }
        }
        MessageView::Card(card) => card_lines(card, &mut lines),
    }
    lines.push(Line::default());
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, composer, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_composer(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let name_indicator = match app.composer.display_name() {
        Some(name) => format!(" [{}]", name),
        None => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" Symptom Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("#{}", app.composer.chat_id()),
            Style::default().fg(Color::White),
        ),
        Span::styled(name_indicator, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.client.base_url()));

    let text = if app.composer.transcript().is_empty() && !app.composer.is_sending() {
        Text::from(Span::styled(
            "Describe your symptoms to get started...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = app.composer.views().iter().flat_map(view_lines).collect();

        if app.composer.is_sending() {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let transcript = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));

    frame.render_widget(transcript, area);
}

fn render_composer(app: &App, frame: &mut Frame, area: Rect) {
    // Typing indicator: highlighted border while the input has content
    let border_color = if app.composer.is_typing() {
        Color::Yellow
    } else if app.input_mode == InputMode::Editing {
        Color::White
    } else {
        Color::DarkGray
    };

    let title = if app.composer.is_sending() {
        " Sending... "
    } else {
        " Symptoms (Enter to send) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    // Get the visible slice of the input
    let visible_text: String = app
        .composer
        .input()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Green).fg(Color::Black)),
    };

    let hints = match app.input_mode {
        InputMode::Normal => " i: write  j/k: scroll  g/G: top/bottom  q: quit",
        InputMode::Editing => " Enter: send  Esc: stop editing  Ctrl-U: clear  Ctrl-C: quit",
    };

    let footer = Line::from(vec![
        Span::styled(mode, mode_style.bold()),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use symptom_chat_core::{AssistantReply, ChatClient, ChatId};
    use tokio::sync::mpsc;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_bold_markdown() {
        let line = parse_markdown_line("See a **doctor** soon", Style::default());
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "doctor");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let line = parse_markdown_line("a **b", Style::default());
        assert_eq!(line_text(&line), "a **b");
    }

    #[test]
    fn test_card_view_lines() {
        let reply = AssistantReply::from_json(
            r#"{"parsed":{"possible_conditions":[{"name":"Flu","reason":"fever"}],"recommendations":["Rest"],"disclaimer":"Not medical advice"}}"#,
        )
        .unwrap();
        let view = symptom_chat_core::view::render_reply(&reply, None);

        let lines: Vec<String> = view_lines(&view).iter().map(line_text).collect();
        assert_eq!(
            lines,
            vec![
                "Possible conditions",
                "- Flu: fever",
                "Recommendations",
                "- Rest",
                "Disclaimer: Not medical advice",
                "",
            ]
        );
    }

    #[test]
    fn test_render_shows_transcript_and_input() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let client = ChatClient::new("http://127.0.0.1:5000").unwrap();
        let mut app = App::new(ChatId::new("12"), None, client, tx);
        app.composer.set_input("hello");
        app.composer.begin_send();
        app.receive_reply(Ok(AssistantReply::from_json(r#"{"assistant":"Take rest"}"#).unwrap()));

        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("#12"));
        assert!(screen.contains("user: hello"));
        assert!(screen.contains("Assistant Take rest"));
        assert_eq!(app.chat_height, 5);
    }
}
