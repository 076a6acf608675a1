//! Keyboard-driven focus over the rendered grid.

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Left,
    Right,
    Up,
    Down,
}

/// Grid geometry as currently laid out by the host view, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub columns: usize,
    /// First row that is (at least partly) visible.
    pub first_row: usize,
    pub visible_rows: usize,
}

impl Viewport {
    fn last_row(&self) -> usize {
        self.first_row + self.visible_rows.max(1) - 1
    }
}

/// Scroll request issued so the focused item stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollChange {
    /// Scroll by a number of rows, negative is up.
    Offset(isize),
    /// Scroll to an absolute row.
    Absolute(usize),
}

pub trait ScrollDriver {
    fn change_scroll_y(&mut self, change: ScrollChange);
}

/// Tracks which item, if any, has keyboard focus.
///
/// When set, the index is always below the observed item count.
#[derive(Debug, Clone)]
pub struct ActiveIndexController {
    active: Option<usize>,
    len: usize,
    enabled: bool,
    step: usize,
}

impl ActiveIndexController {
    /// `step` is how many items a left/right press moves.
    pub fn new(step: usize) -> Self {
        Self {
            active: None,
            len: 0,
            enabled: true,
            step: step.max(1),
        }
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn max_index(&self) -> Option<usize> {
        self.len.checked_sub(1)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled while another overlay owns the keyboard.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Observe the length of the rendered collection.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if let Some(active) = self.active {
            self.active = self.max_index().map(|max| active.min(max));
        }
    }

    pub fn clear_active_index(&mut self) {
        self.active = None;
    }

    /// Move focus and keep it inside the viewport.
    ///
    /// Returns whether the active index changed. With nothing focused any
    /// move lands on the first item.
    pub fn navigate(
        &mut self,
        nav: Navigation,
        viewport: Viewport,
        scroll: &mut dyn ScrollDriver,
    ) -> bool {
        let Some(max) = self.max_index() else {
            return false;
        };
        if !self.enabled {
            return false;
        }

        let columns = viewport.columns.max(1);
        let next = match self.active {
            None => 0,
            Some(current) => match nav {
                Navigation::Left => current.saturating_sub(self.step),
                Navigation::Right => (current + self.step).min(max),
                Navigation::Up => current.saturating_sub(columns),
                Navigation::Down => (current + columns).min(max),
            },
        };

        let changed = self.active != Some(next);
        self.active = Some(next);
        debug!("Active index -> {} ({:?})", next, nav);

        self.scroll_into_view(next, viewport, columns, scroll);
        changed
    }

    fn scroll_into_view(
        &self,
        index: usize,
        viewport: Viewport,
        columns: usize,
        scroll: &mut dyn ScrollDriver,
    ) {
        let row = index / columns;
        if row == 0 && viewport.first_row > 0 {
            scroll.change_scroll_y(ScrollChange::Absolute(0));
        } else if row < viewport.first_row {
            scroll.change_scroll_y(ScrollChange::Offset(-((viewport.first_row - row) as isize)));
        } else if row > viewport.last_row() {
            scroll.change_scroll_y(ScrollChange::Offset((row - viewport.last_row()) as isize));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        changes: Vec<ScrollChange>,
    }

    impl ScrollDriver for Recorder {
        fn change_scroll_y(&mut self, change: ScrollChange) {
            self.changes.push(change);
        }
    }

    fn viewport(first_row: usize) -> Viewport {
        Viewport {
            columns: 4,
            first_row,
            visible_rows: 2,
        }
    }

    fn controller(len: usize) -> ActiveIndexController {
        let mut c = ActiveIndexController::new(1);
        c.set_len(len);
        c
    }

    #[test]
    fn test_first_move_from_none_focuses_first_item() {
        for nav in [Navigation::Left, Navigation::Right, Navigation::Up, Navigation::Down] {
            let mut c = controller(10);
            c.clear_active_index();
            assert!(c.navigate(nav, viewport(0), &mut Recorder::default()));
            assert_eq!(c.active_index(), Some(0));
        }
    }

    #[test]
    fn test_moves_are_clamped() {
        let mut c = controller(10);
        let mut rec = Recorder::default();
        c.navigate(Navigation::Right, viewport(0), &mut rec);
        c.navigate(Navigation::Left, viewport(0), &mut rec);
        assert_eq!(c.active_index(), Some(0));
        assert!(!c.navigate(Navigation::Up, viewport(0), &mut rec));

        for _ in 0..20 {
            c.navigate(Navigation::Right, viewport(0), &mut rec);
        }
        assert_eq!(c.active_index(), Some(9));
        c.navigate(Navigation::Down, viewport(0), &mut rec);
        assert_eq!(c.active_index(), Some(9));
    }

    #[test]
    fn test_vertical_moves_by_row() {
        let mut c = controller(10);
        let mut rec = Recorder::default();
        c.navigate(Navigation::Down, viewport(0), &mut rec);
        c.navigate(Navigation::Right, viewport(0), &mut rec);
        c.navigate(Navigation::Down, viewport(0), &mut rec);
        assert_eq!(c.active_index(), Some(5));
        c.navigate(Navigation::Down, viewport(0), &mut rec);
        assert_eq!(c.active_index(), Some(9));
        c.navigate(Navigation::Up, viewport(0), &mut rec);
        assert_eq!(c.active_index(), Some(5));
    }

    #[test]
    fn test_scrolls_down_when_leaving_viewport() {
        let mut c = controller(20);
        let mut rec = Recorder::default();
        c.navigate(Navigation::Down, viewport(0), &mut rec); // 0
        c.navigate(Navigation::Down, viewport(0), &mut rec); // 4, row 1
        assert!(rec.changes.is_empty());
        c.navigate(Navigation::Down, viewport(0), &mut rec); // 8, row 2
        assert_eq!(rec.changes, vec![ScrollChange::Offset(1)]);
    }

    #[test]
    fn test_scrolls_up_and_back_to_top() {
        let mut c = controller(20);
        let mut rec = Recorder::default();
        for _ in 0..3 {
            c.navigate(Navigation::Down, viewport(2), &mut rec);
        }
        // index 8 sits on row 2, already visible
        assert_eq!(c.active_index(), Some(8));
        rec.changes.clear();

        c.navigate(Navigation::Up, viewport(2), &mut rec);
        assert_eq!(rec.changes, vec![ScrollChange::Offset(-1)]);
        c.navigate(Navigation::Up, viewport(1), &mut rec);
        assert_eq!(rec.changes[1], ScrollChange::Absolute(0));
    }

    #[test]
    fn test_disabled_controller_ignores_input() {
        let mut c = controller(5);
        c.set_enabled(false);
        assert!(!c.navigate(Navigation::Right, viewport(0), &mut Recorder::default()));
        assert_eq!(c.active_index(), None);
    }

    #[test]
    fn test_empty_collection_never_focuses() {
        let mut c = controller(0);
        assert!(!c.navigate(Navigation::Down, viewport(0), &mut Recorder::default()));
        assert_eq!(c.max_index(), None);
    }

    #[test]
    fn test_shrinking_len_keeps_index_in_range() {
        let mut c = controller(10);
        let mut rec = Recorder::default();
        for _ in 0..8 {
            c.navigate(Navigation::Right, viewport(0), &mut rec);
        }
        c.set_len(3);
        assert_eq!(c.active_index(), Some(2));
        c.set_len(0);
        assert_eq!(c.active_index(), None);
    }
}
