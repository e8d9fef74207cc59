use chrono::{DateTime, Local};
use ratatui::prelude::*;

/// Formats the time the page state was last fetched, e.g. "03/14/2026 02:05pm".
pub fn format_loaded_at(at: DateTime<Local>) -> String {
    at.format("%m/%d/%Y %I:%M%P").to_string()
}

pub fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

pub fn radio(selected: bool) -> &'static str {
    if selected { "(*)" } else { "( )" }
}

/// Calculates a centered rectangle of a given percentage size within another Rect.
/// Useful for displaying popups/modals in the center of the screen.
///
/// # Arguments
/// * `percent_x` - Horizontal percentage of the screen the rect should occupy.
/// * `percent_y` - Vertical percentage of the screen the rect should occupy.
/// * `r` - The parent Rect (usually the full frame area).
///
/// # Returns
/// A new Rect centered within the parent Rect.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(r);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);

    center
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn centered_rect_stays_inside_parent() {
        let parent = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, parent);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 15);
    }

    #[test]
    fn loaded_at_uses_twelve_hour_clock() {
        let at = Local.with_ymd_and_hms(2026, 3, 14, 14, 5, 0).unwrap();
        assert_eq!(format_loaded_at(at), "03/14/2026 02:05pm");
    }

    #[test]
    fn markers() {
        assert_eq!(checkbox(true), "[x]");
        assert_eq!(radio(false), "( )");
    }
}
