//! Application state management and input handling.

use crate::config::Keybindings;
use crate::focus::{ActiveIndexController, Navigation, ScrollChange, ScrollDriver, Viewport};
use crate::notify::ToastQueue;
use crate::overlay::{OVERLAYS, OverlayLock};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;

use super::types::Action;

/// Application state for the TUI.
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,
    /// Whether help modal is shown
    pub show_help: bool,
    /// First grid row on screen
    pub scroll_row: usize,
    /// Columns in the last rendered layout
    pub columns: usize,
    /// Card rows that fit on screen in the last rendered layout
    pub visible_rows: usize,
    /// Width of one card in terminal cells
    pub card_width: u16,
    /// Set after a fetch that brought nothing new; cleared by user input
    pub auto_fetch_paused: bool,
    /// Custom keybindings
    pub keybindings: Keybindings,
    /// Transient notifications
    pub toasts: Arc<ToastQueue>,
    overlays: &'static OverlayLock,
}

impl App {
    /// Create a new App with default state.
    pub fn new(keybindings: Keybindings, card_width: u16, toasts: Arc<ToastQueue>) -> Self {
        Self {
            should_quit: false,
            show_help: false,
            scroll_row: 0,
            columns: 1,
            visible_rows: 1,
            card_width: card_width.max(8),
            auto_fetch_paused: false,
            keybindings,
            toasts,
            overlays: &OVERLAYS,
        }
    }

    /// Use a different overlay lock than the process-wide one.
    pub fn with_overlay_lock(mut self, overlays: &'static OverlayLock) -> Self {
        self.overlays = overlays;
        self
    }

    /// Geometry of the grid as last rendered.
    pub fn viewport(&self) -> Viewport {
        Viewport {
            columns: self.columns,
            first_row: self.scroll_row,
            visible_rows: self.visible_rows,
        }
    }

    /// Whether the last visible row is within one screen of the end.
    pub fn wants_more(&self, len: usize) -> bool {
        let total_rows = len.div_ceil(self.columns.max(1));
        self.scroll_row + self.visible_rows * 2 >= total_rows
    }

    /// Update layout numbers from the renderer, keeping the scroll offset
    /// inside the content.
    pub fn set_layout(&mut self, columns: usize, visible_rows: usize, len: usize) {
        self.columns = columns.max(1);
        self.visible_rows = visible_rows.max(1);
        let total_rows = len.div_ceil(self.columns);
        let max_scroll = total_rows.saturating_sub(self.visible_rows);
        self.scroll_row = self.scroll_row.min(max_scroll);
    }

    fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.overlays.acquire();
        } else {
            self.overlays.release();
        }
    }

    /// Ctrl+C or Ctrl+Q.
    fn is_force_quit(key: &KeyEvent) -> bool {
        key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    }

    /// Whether a key pressed while a fetch is in flight should end the app.
    ///
    /// Only quit keys count; everything else waits for the fetch.
    pub fn quits_during_fetch(&self, key: &KeyEvent) -> bool {
        Self::is_force_quit(key)
            || (!self.show_help && self.keybindings.matches(&self.keybindings.quit, key))
    }

    /// Handle keyboard input and return an action.
    pub fn handle_input(&mut self, key: KeyEvent, focus: &mut ActiveIndexController) -> Action {
        if Self::is_force_quit(&key) {
            self.should_quit = true;
            return Action::Quit;
        }

        // Handle help modal
        if self.show_help {
            if key.code == KeyCode::Esc
                || self.keybindings.matches(&self.keybindings.help, &key)
                || self.keybindings.matches(&self.keybindings.quit, &key)
            {
                self.toggle_help();
            }
            focus.set_enabled(!self.overlays.is_held());
            return Action::None;
        }

        if self.keybindings.matches(&self.keybindings.help, &key) {
            self.toggle_help();
            focus.set_enabled(!self.overlays.is_held());
            return Action::None;
        }

        focus.set_enabled(!self.overlays.is_held());

        let kb = &self.keybindings;
        let nav = if kb.matches(&kb.up, &key) {
            Some(Navigation::Up)
        } else if kb.matches(&kb.down, &key) {
            Some(Navigation::Down)
        } else if kb.matches(&kb.left, &key) {
            Some(Navigation::Left)
        } else if kb.matches(&kb.right, &key) {
            Some(Navigation::Right)
        } else {
            None
        };

        if let Some(nav) = nav {
            let viewport = self.viewport();
            focus.navigate(nav, viewport, self);
            self.auto_fetch_paused = false;
            return Action::None;
        }

        if kb.matches(&kb.clear, &key) {
            focus.clear_active_index();
            Action::None
        } else if kb.matches(&kb.open, &key) {
            focus.active_index().map(Action::Open).unwrap_or(Action::None)
        } else if kb.matches(&kb.refresh, &key) {
            self.scroll_row = 0;
            self.auto_fetch_paused = false;
            Action::Refresh
        } else if kb.matches(&kb.quit, &key) {
            self.should_quit = true;
            Action::Quit
        } else {
            match key.code {
                KeyCode::PageDown => {
                    self.change_scroll_y(ScrollChange::Offset(self.visible_rows as isize));
                    self.auto_fetch_paused = false;
                }
                KeyCode::PageUp => {
                    self.change_scroll_y(ScrollChange::Offset(-(self.visible_rows as isize)));
                }
                KeyCode::Home => self.change_scroll_y(ScrollChange::Absolute(0)),
                _ => {}
            }
            Action::None
        }
    }
}

impl ScrollDriver for App {
    fn change_scroll_y(&mut self, change: ScrollChange) {
        self.scroll_row = match change {
            ScrollChange::Offset(rows) => self.scroll_row.saturating_add_signed(rows),
            ScrollChange::Absolute(row) => row,
        };
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if self.show_help {
            self.overlays.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        // Each test gets its own lock so parallel tests don't see each other's overlays
        let lock: &'static OverlayLock = Box::leak(Box::new(OverlayLock::new()));
        let mut app = App::new(Keybindings::default(), 30, Arc::new(ToastQueue::new()))
            .with_overlay_lock(lock);
        app.set_layout(4, 2, 40);
        app
    }

    fn focus(len: usize) -> ActiveIndexController {
        let mut f = ActiveIndexController::new(1);
        f.set_len(len);
        f
    }

    #[test]
    fn test_navigation_moves_focus_and_scrolls() {
        let mut app = app();
        let mut focus = focus(40);

        assert_eq!(app.handle_input(key(KeyCode::Down), &mut focus), Action::None);
        assert_eq!(focus.active_index(), Some(0));
        for _ in 0..2 {
            app.handle_input(key(KeyCode::Char('j')), &mut focus);
        }
        assert_eq!(focus.active_index(), Some(8));
        assert_eq!(app.scroll_row, 1);
    }

    #[test]
    fn test_escape_clears_focus() {
        let mut app = app();
        let mut focus = focus(10);
        app.handle_input(key(KeyCode::Right), &mut focus);
        app.handle_input(key(KeyCode::Esc), &mut focus);
        assert_eq!(focus.active_index(), None);
    }

    #[test]
    fn test_open_and_refresh_actions() {
        let mut app = app();
        let mut focus = focus(10);
        assert_eq!(app.handle_input(key(KeyCode::Enter), &mut focus), Action::None);
        app.handle_input(key(KeyCode::Right), &mut focus);
        app.handle_input(key(KeyCode::Right), &mut focus);
        assert_eq!(app.handle_input(key(KeyCode::Enter), &mut focus), Action::Open(1));

        app.scroll_row = 3;
        assert_eq!(app.handle_input(key(KeyCode::Char('r')), &mut focus), Action::Refresh);
        assert_eq!(app.scroll_row, 0);
    }

    #[test]
    fn test_help_overlay_disables_focus() {
        let mut app = app();
        let mut focus = focus(10);

        app.handle_input(key(KeyCode::Char('?')), &mut focus);
        assert!(app.show_help);
        assert!(!focus.is_enabled());
        assert_eq!(app.handle_input(key(KeyCode::Down), &mut focus), Action::None);
        assert_eq!(focus.active_index(), None);

        app.handle_input(key(KeyCode::Esc), &mut focus);
        assert!(!app.show_help);
        app.handle_input(key(KeyCode::Down), &mut focus);
        assert_eq!(focus.active_index(), Some(0));
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        let mut focus = focus(0);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_input(ctrl_c, &mut focus), Action::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_quit_keys_interrupt_a_fetch() {
        let mut app = app();
        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.quits_during_fetch(&key(KeyCode::Char('q'))));
        assert!(app.quits_during_fetch(&ctrl_q));
        assert!(!app.quits_during_fetch(&key(KeyCode::Down)));
        assert!(!app.quits_during_fetch(&key(KeyCode::Char('r'))));

        // q closes help instead, Ctrl+C still quits
        let mut focus = focus(0);
        app.handle_input(key(KeyCode::Char('?')), &mut focus);
        assert!(!app.quits_during_fetch(&key(KeyCode::Char('q'))));
        assert!(app.quits_during_fetch(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
    }

    #[test]
    fn test_wants_more_near_the_end() {
        let mut app = app();
        // 40 items / 4 columns = 10 rows, 2 visible
        assert!(!app.wants_more(40));
        app.scroll_row = 6;
        assert!(app.wants_more(40));
        assert!(app.wants_more(0));
    }

    #[test]
    fn test_set_layout_clamps_scroll() {
        let mut app = app();
        app.scroll_row = 50;
        app.set_layout(4, 2, 40);
        assert_eq!(app.scroll_row, 8);
    }
}
