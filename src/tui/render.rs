//! UI rendering functions for the TUI.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::feed::FeedState;
use crate::notify::ToastLevel;
use crate::types::RecommendationItem;

use super::state::App;
use super::types::FeedView;

/// Rows taken by one card including its border.
const CARD_HEIGHT: u16 = 5;

/// Placeholder cards drawn while a refresh is running.
const SKELETON_COUNT: usize = 24;

const ACCENT: Color = Color::Rgb(0xfb, 0x72, 0x99);

/// Draw the UI.
pub fn draw(frame: &mut Frame, app: &mut App, view: FeedView) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Grid
            Constraint::Length(3), // Footer
        ])
        .split(size);

    draw_header(frame, &view, chunks[0]);
    draw_grid(frame, app, &view, chunks[1]);
    draw_footer(frame, &view, chunks[2]);
    draw_toasts(frame, app, size);

    if app.show_help {
        draw_help_modal(frame, app);
    }
}

fn draw_header(frame: &mut Frame, view: &FeedView, area: Rect) {
    let state = match view.state {
        FeedState::Idle => Span::styled("idle", Style::default().fg(Color::Green)),
        FeedState::Refreshing => Span::styled("refreshing...", Style::default().fg(Color::Yellow)),
        FeedState::FetchingMore => Span::styled("loading more...", Style::default().fg(Color::Yellow)),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "rec-grid",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            if view.parallel { "[parallel]" } else { "[sequential]" },
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(format!("[page {}]", view.page), Style::default().fg(Color::Magenta)),
        Span::raw("  "),
        Span::styled(
            format!("[{} items]", view.items.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        state,
    ]))
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

/// Lay the grid out, report the geometry back to the app and draw the
/// visible rows.
fn draw_grid(frame: &mut Frame, app: &mut App, view: &FeedView, area: Rect) {
    let columns = (area.width / app.card_width).max(1) as usize;
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;

    let refreshing = view.state == FeedState::Refreshing;
    let count = if refreshing {
        SKELETON_COUNT
    } else {
        view.items.len()
    };
    app.set_layout(columns, visible_rows, count);

    if !refreshing && view.items.is_empty() {
        let empty = Paragraph::new("No recommendations yet. Press r to refresh.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Feed"));
        frame.render_widget(empty, area);
        return;
    }

    let card_width = area.width / columns as u16;
    let first = app.scroll_row * columns;
    let last = ((app.scroll_row + visible_rows) * columns).min(count);

    for index in first..last {
        let row = (index / columns - app.scroll_row) as u16;
        let col = (index % columns) as u16;
        let rect = Rect {
            x: area.x + col * card_width,
            y: area.y + row * CARD_HEIGHT,
            width: card_width,
            height: CARD_HEIGHT,
        };
        if rect.bottom() > area.bottom() {
            break;
        }

        if refreshing {
            draw_skeleton(frame, rect);
        } else {
            draw_card(frame, &view.items[index], view.active == Some(index), rect);
        }
    }
}

fn draw_card(frame: &mut Frame, item: &RecommendationItem, active: bool, area: Rect) {
    let border_style = if active {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let author = item.author.as_deref().unwrap_or("unknown");
    let lines = vec![
        Line::from(Span::styled(
            item.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(author.to_string(), Style::default().fg(Color::Cyan))),
        Line::from(vec![
            Span::styled(item.play_display(), Style::default().fg(Color::DarkGray)),
            Span::raw("  "),
            Span::styled(item.duration_display(), Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let card = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).border_style(border_style))
        .wrap(Wrap { trim: true });

    frame.render_widget(card, area);
}

fn draw_skeleton(frame: &mut Frame, area: Rect) {
    let bar = "░".repeat(area.width.saturating_sub(4) as usize);
    let short = "░".repeat((area.width.saturating_sub(4) / 2) as usize);
    let skeleton = Paragraph::new(vec![Line::from(bar), Line::from(short)])
        .style(Style::default().fg(Color::DarkGray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(skeleton, area);
}

fn draw_footer(frame: &mut Frame, view: &FeedView, area: Rect) {
    let help_text = match view.state {
        FeedState::Refreshing => "[?] help  [q] quit",
        _ if view.active.is_some() => {
            "[hjkl/arrows] move  [Enter] open  [Esc] clear  [r] refresh  [?] help  [q] quit"
        }
        _ => "[hjkl/arrows] move  [PgDn] scroll  [r] refresh  [?] help  [q] quit",
    };

    let footer = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

/// Stack toasts in the bottom-right corner, newest at the bottom.
fn draw_toasts(frame: &mut Frame, app: &App, area: Rect) {
    let toasts = app.toasts.visible();
    let width = (area.width / 2).clamp(20, 60).min(area.width);
    let mut bottom = area.bottom().saturating_sub(3);

    for toast in toasts.iter().rev() {
        let height = (toast.message.lines().count() as u16 + 2).min(10);
        if bottom < area.y + height {
            break;
        }
        let rect = Rect {
            x: area.right().saturating_sub(width + 1),
            y: bottom - height,
            width,
            height,
        };
        bottom = rect.y;

        let (title, color) = match toast.level {
            ToastLevel::Error => ("Error", Color::Red),
            ToastLevel::Info => ("Info", Color::Cyan),
        };

        frame.render_widget(Clear, rect);
        let popup = Paragraph::new(toast.message.as_str())
            .style(Style::default().fg(color))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(color)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(popup, rect);
    }
}

fn draw_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let help_text = Paragraph::new(help_content(app))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help_text, area);
}

fn help_content(app: &App) -> String {
    let kb = &app.keybindings;
    let keys = |bound: &[String]| bound.join(" / ");

    format!(
        "\
Grid
────
  {:<14}Move up
  {:<14}Move down
  {:<14}Move left
  {:<14}Move right
  {:<14}Open focused item
  {:<14}Clear focus
  PgUp / PgDn   Scroll a screen

Feed
────
  {:<14}Refresh
  (scroll)      Loads more near the end

Global
──────
  {:<14}Show/hide this help
  Ctrl+C        Force quit
  {:<14}Quit

Press ? to close",
        keys(&kb.up),
        keys(&kb.down),
        keys(&kb.left),
        keys(&kb.right),
        keys(&kb.open),
        keys(&kb.clear),
        keys(&kb.refresh),
        keys(&kb.help),
        keys(&kb.quit),
    )
}

/// Helper function to create a centered rect.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Keybindings;
    use crate::notify::{Notifier, ToastQueue};
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    fn item(key: &str) -> RecommendationItem {
        RecommendationItem {
            unique_key: key.to_string(),
            render_id: format!("{}-x", key),
            title: format!("Title {}", key),
            author: Some("up".to_string()),
            goto: Some("av".to_string()),
            uri: None,
            play_count: Some(12_345),
            duration_secs: Some(90),
        }
    }

    fn render(app: &mut App, view: FeedView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| draw(f, app, view)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_grid_reports_layout() {
        let toasts = Arc::new(ToastQueue::new());
        let mut app = App::new(Keybindings::default(), 30, toasts);
        let items: Vec<_> = (0..10).map(|i| item(&i.to_string())).collect();
        let view = FeedView {
            items: &items,
            active: Some(1),
            state: FeedState::Idle,
            page: 3,
            parallel: false,
        };

        let screen = render(&mut app, view);
        assert_eq!(app.columns, 4);
        // 30 rows - header - footer = 24 rows of grid
        assert_eq!(app.visible_rows, 4);
        assert!(screen.contains("Title 0"));
        assert!(screen.contains("page 3"));
    }

    #[test]
    fn test_refresh_draws_skeletons_and_toasts() {
        let toasts = Arc::new(ToastQueue::new());
        toasts.error("Request failed");
        let mut app = App::new(Keybindings::default(), 30, toasts);
        let view = FeedView {
            items: &[],
            active: None,
            state: FeedState::Refreshing,
            page: 1,
            parallel: true,
        };

        let screen = render(&mut app, view);
        assert!(screen.contains("refreshing"));
        assert!(screen.contains("░"));
        assert!(screen.contains("Request failed"));
    }

    #[test]
    fn test_help_lists_bound_keys() {
        let app = App::new(Keybindings::default(), 30, Arc::new(ToastQueue::new()));
        let help = help_content(&app);
        assert!(help.contains("k / Up"));
        assert!(help.contains("Refresh"));
    }
}
