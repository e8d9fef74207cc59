use crate::common::utils::centered_rect;
use crate::settings::controller::{Alert, ConfirmationPrompt, PromptKind};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

fn popup_frame(title: &str, frame: &mut Frame, percent_x: u16, percent_y: u16) -> Vec<Rect> {
    let area = centered_rect(percent_x, percent_y, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(block.clone(), area);

    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(block.inner(area))
        .to_vec()
}

fn instructions(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::ITALIC))
}

pub fn render_confirm_popup(prompt: &ConfirmationPrompt, frame: &mut Frame) {
    let layout = popup_frame(&prompt.title, frame, 60, 40);

    let mut lines: Vec<Line> = Vec::new();
    if !prompt.message.is_empty() {
        lines.push(Line::from(prompt.message.as_str()));
    }
    if prompt.kind == PromptKind::DestructiveChange {
        for item in &prompt.items {
            lines.push(Line::from(format!("  - {}", item)));
        }
    }
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }),
        layout[0],
    );

    let help = format!("y/Enter: {} | n/Esc: Cancel", prompt.confirm_label);
    frame.render_widget(instructions(&help), layout[1]);
}

pub fn render_alert_popup(alert: &Alert, frame: &mut Frame) {
    let layout = popup_frame(&alert.title, frame, 50, 30);
    frame.render_widget(
        Paragraph::new(alert.message.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true }),
        layout[0],
    );
    frame.render_widget(instructions("Enter/Esc: Close"), layout[1]);
}

pub fn render_exit_guard_popup(warnings: &[String], frame: &mut Frame) {
    let layout = popup_frame("Unsaved changes", frame, 50, 30);
    let lines: Vec<Line> = warnings.iter().map(|w| Line::from(w.as_str())).collect();
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: true }),
        layout[0],
    );
    frame.render_widget(
        instructions("y: Leave anyway | n/Esc/Enter: Stay"),
        layout[1],
    );
}

pub fn render_redirect_popup(url: &str, frame: &mut Frame) {
    let layout = popup_frame("Connect account", frame, 60, 30);
    let text = vec![
        Line::from("Connecting an account happens in the browser. Open:"),
        Line::from(Span::styled(
            url.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), layout[0]);
    frame.render_widget(instructions("Enter/Esc: Close"), layout[1]);
}

pub fn render_edit_popup(label: &str, buffer: &str, frame: &mut Frame) {
    let layout = popup_frame(&format!("Edit {}", label), frame, 60, 25);
    let text = Line::from(vec![
        Span::raw(buffer.to_string()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]);
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), layout[0]);
    frame.render_widget(instructions("Enter: Apply | Esc: Cancel"), layout[1]);
}
