use crate::app::{App, Modal, Tab};
use crate::common::utils::format_loaded_at;
use crate::pages::{popups, settings_tab, trees};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Tabs},
};

pub fn render(app: &mut App, frame: &mut Frame) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let title = app.node_title.as_deref().unwrap_or("Loading...");
    let loaded = app
        .last_loaded
        .map(format_loaded_at)
        .unwrap_or_else(|| "never".to_string());
    let status_text = format!(
        "Project Settings | {} | Loaded: {} | 'q': quit, 'r': reload, 'Tab': next section",
        title, loaded
    );
    frame.render_widget(
        Paragraph::new(status_text).block(Block::default().borders(Borders::ALL).title("Status")),
        layout[0],
    );

    let titles: Vec<&str> = Tab::ALL.iter().map(|t| t.title()).collect();
    let selected = Tab::ALL
        .iter()
        .position(|t| *t == app.current_tab)
        .unwrap_or(0);
    frame.render_widget(
        Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL))
            .select(selected)
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        layout[1],
    );

    let main_block = Block::default()
        .borders(Borders::ALL)
        .title(app.current_tab.title());

    if let Some(err) = &app.page_error {
        frame.render_widget(
            Paragraph::new(format!("Error: {}", err))
                .style(Style::default().fg(Color::Red))
                .block(main_block),
            layout[2],
        );
    } else if app.is_loading {
        frame.render_widget(
            Paragraph::new("Loading settings...")
                .style(Style::default().fg(Color::Yellow))
                .block(main_block),
            layout[2],
        );
    } else {
        match app.current_tab {
            Tab::Notifications => trees::render_notifications(app, frame, layout[2], main_block),
            Tab::Wiki => {
                let halves = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(5), Constraint::Min(0)])
                    .split(layout[2]);
                settings_tab::render_settings_tab(app, frame, halves[0], main_block);
                trees::render_wiki_permissions(app, frame, halves[1]);
            }
            _ => settings_tab::render_settings_tab(app, frame, layout[2], main_block),
        }
    }

    settings_tab::render_footer(app, frame, layout[3]);

    match app.modals.front() {
        Some(Modal::Confirm(prompt)) => popups::render_confirm_popup(prompt, frame),
        Some(Modal::Alert(alert)) => popups::render_alert_popup(alert, frame),
        Some(Modal::ExitGuard { warnings, .. }) => popups::render_exit_guard_popup(warnings, frame),
        Some(Modal::Redirect(url)) => popups::render_redirect_popup(url, frame),
        Some(Modal::EditText { label, buffer, .. }) => {
            popups::render_edit_popup(label, buffer, frame)
        }
        None => {}
    }
}
