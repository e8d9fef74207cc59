use crate::app::{App, RowAction, Tab};
use crate::common::utils::{checkbox, radio};
use crate::settings::controller::ControllerState;
use crate::settings::groups::GroupId;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

pub fn render_settings_tab(app: &mut App, frame: &mut Frame, area: Rect, block: Block) {
    let rows = app.current_rows();

    if rows.is_empty() {
        let text = match app.current_tab {
            Tab::Institution => app
                .institution_message
                .clone()
                .unwrap_or_else(|| "No institutions available.".to_string()),
            Tab::Accounts => "No external accounts linked.".to_string(),
            _ => "Nothing to configure.".to_string(),
        };
        frame.render_widget(
            Paragraph::new(text)
                .block(block)
                .wrap(Wrap { trim: true }),
            area,
        );
        return;
    }

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let marker = match row.action {
                RowAction::Toggle => checkbox(row.checked),
                RowAction::Select(_) => radio(row.checked),
                RowAction::Edit => "",
            };
            let state = if row.busy {
                "Saving..."
            } else if row.dirty {
                "unsaved"
            } else {
                ""
            };
            let style = if row.busy {
                Style::default().fg(Color::DarkGray)
            } else if row.dirty {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(row.label.clone()),
                Cell::from(state),
            ])
            .style(style)
        })
        .collect();

    // The current affiliation goes on the bottom border of the institution tab.
    let block = match (app.current_tab, &app.institution_href) {
        (Tab::Institution, Some(href)) => block.title_bottom(format!(
            "Current: {} ({})",
            app.primary_institution_label(),
            href
        )),
        (Tab::Institution, None) => {
            block.title_bottom(format!("Current: {}", app.primary_institution_label()))
        }
        _ => block,
    };

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(4),
            Constraint::Percentage(70),
            Constraint::Min(10),
        ],
    )
    .block(block)
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol(">> ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn tab_group(app: &App) -> Option<GroupId> {
    match app.current_tab {
        Tab::Details => Some(GroupId::Details),
        Tab::Addons => Some(GroupId::Addons),
        Tab::Wiki => Some(GroupId::Wiki),
        Tab::Comments => Some(GroupId::Comments),
        Tab::Institution => Some(GroupId::Institution),
        Tab::Accounts | Tab::Notifications => None,
    }
}

/// Bottom line: the group's transient notice, the last input error, or key help.
pub fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let group = tab_group(app);
    let notice = group.as_ref().and_then(|id| app.notice_for(id));
    let controller = group.as_ref().and_then(|id| app.group(id));
    let saving = controller.is_some_and(|g| g.state() == ControllerState::Submitting);
    let unsaved = controller.map_or(0, |g| g.compute_dirty_set().len());

    let (text, style) = if let Some(notice) = notice {
        (notice.to_string(), Style::default().fg(Color::Green))
    } else if saving {
        ("Saving...".to_string(), Style::default().fg(Color::Yellow))
    } else if let Some(status) = &app.status {
        (status.clone(), Style::default().fg(Color::Red))
    } else {
        let help = match app.current_tab {
            Tab::Details => "'j/k': move | 'Enter': edit/select | 's': save",
            Tab::Addons | Tab::Comments | Tab::Institution => {
                "'j/k': move | 'Space': toggle | 's': save"
            }
            Tab::Wiki | Tab::Accounts => "'j/k': move | 'Space': toggle (saves immediately)",
            Tab::Notifications => "Read only",
        };
        let text = match unsaved {
            0 => help.to_string(),
            1 => format!("{} | 1 unsaved change", help),
            n => format!("{} | {} unsaved changes", help, n),
        };
        (text, Style::default().add_modifier(Modifier::ITALIC))
    };

    frame.render_widget(
        Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}
