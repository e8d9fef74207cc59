use crate::api::osf::types::{SubscriptionNode, WikiSettingsNode};
use crate::app::App;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

fn flatten_subscriptions(nodes: &[SubscriptionNode], depth: usize, out: &mut Vec<Line<'static>>) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        if let Some(target) = &node.node {
            out.push(Line::from(Span::styled(
                format!("{}{}", indent, target.title),
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }
        if let Some(event) = &node.event {
            let kind = event.notification_type.as_deref().unwrap_or("adopt parent");
            out.push(Line::from(format!("{}{}: {}", indent, event.title, kind)));
        }
        flatten_subscriptions(&node.children, depth + 1, out);
    }
}

fn flatten_wiki(nodes: &[WikiSettingsNode], depth: usize, out: &mut Vec<Line<'static>>) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        let title = node.node.as_ref().map(|t| t.title.as_str()).unwrap_or("");
        let permission = node
            .select
            .as_ref()
            .map(|s| s.permission.as_str())
            .unwrap_or("-");
        out.push(Line::from(format!("{}{}: {}", indent, title, permission)));
        flatten_wiki(&node.children, depth + 1, out);
    }
}

pub fn render_notifications(app: &App, frame: &mut Frame, area: Rect, block: Block) {
    if let Some(msg) = &app.notifications_message {
        frame.render_widget(
            Paragraph::new(msg.as_str())
                .style(Style::default().fg(Color::Red))
                .block(block),
            area,
        );
        return;
    }

    let mut lines = Vec::new();
    flatten_subscriptions(&app.notifications, 0, &mut lines);
    let items: Vec<ListItem> = lines.into_iter().map(ListItem::new).collect();
    frame.render_widget(List::new(items).block(block), area);
}

pub fn render_wiki_permissions(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Who can edit");

    if let Some(msg) = &app.wiki_message {
        frame.render_widget(
            Paragraph::new(msg.as_str())
                .style(Style::default().fg(Color::Red))
                .block(block),
            area,
        );
        return;
    }

    let mut lines = Vec::new();
    flatten_wiki(&app.wiki_settings, 0, &mut lines);
    let items: Vec<ListItem> = lines.into_iter().map(ListItem::new).collect();
    frame.render_widget(List::new(items).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::osf::types::{SubscriptionEvent, TreeTarget, WikiPermission};

    #[test]
    fn subscription_tree_indents_children() {
        let tree = vec![SubscriptionNode {
            node: Some(TreeTarget {
                title: "Demo".to_string(),
            }),
            event: None,
            children: vec![SubscriptionNode {
                node: None,
                event: Some(SubscriptionEvent {
                    title: "comments".to_string(),
                    notification_type: None,
                }),
                children: Vec::new(),
            }],
        }];
        let mut lines = Vec::new();
        flatten_subscriptions(&tree, 0, &mut lines);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].to_string(), "  comments: adopt parent");
    }

    #[test]
    fn wiki_rows_show_permission() {
        let tree = vec![WikiSettingsNode {
            node: Some(TreeTarget {
                title: "Demo".to_string(),
            }),
            select: Some(WikiPermission {
                permission: "public".to_string(),
            }),
            children: Vec::new(),
        }];
        let mut lines = Vec::new();
        flatten_wiki(&tree, 0, &mut lines);
        assert_eq!(lines[0].to_string(), "Demo: public");
    }
}
