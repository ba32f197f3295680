//! FocusRing — manages keyboard focus cycling between components.

use crate::action::ComponentId;

pub struct FocusRing {
    items: Vec<ComponentId>,
    current: usize,
}

impl FocusRing {
    pub fn new(items: Vec<ComponentId>) -> Self {
        Self { items, current: 0 }
    }

    pub fn current(&self) -> Option<ComponentId> {
        self.items.get(self.current).copied()
    }

    pub fn next(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.items.len();
        self.current()
    }

    pub fn prev(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = if self.current == 0 {
            self.items.len() - 1
        } else {
            self.current - 1
        };
        self.current()
    }

    pub fn set(&mut self, id: ComponentId) {
        if let Some(pos) = self.items.iter().position(|&x| x == id) {
            self.current = pos;
        }
    }

    pub fn is_focused(&self, id: ComponentId) -> bool {
        self.current() == Some(id)
    }

    /// Replace the ring contents, keeping the focused id when it survives.
    pub fn set_items(&mut self, items: Vec<ComponentId>) {
        let old = self.current();
        self.items = items;
        self.current = old
            .and_then(|id| self.items.iter().position(|&x| x == id))
            .unwrap_or(0);
    }
}

impl Default for FocusRing {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_both_ways() {
        let mut ring = FocusRing::new(vec![ComponentId::SongList, ComponentId::LogPanel]);
        assert_eq!(ring.next(), Some(ComponentId::LogPanel));
        assert_eq!(ring.next(), Some(ComponentId::SongList));
        assert_eq!(ring.prev(), Some(ComponentId::LogPanel));
    }

    #[test]
    fn set_items_keeps_surviving_focus() {
        let mut ring = FocusRing::new(vec![ComponentId::SongList, ComponentId::LogPanel]);
        ring.set(ComponentId::LogPanel);
        ring.set_items(vec![ComponentId::SongList]);
        assert!(ring.is_focused(ComponentId::SongList));
        ring.set_items(vec![ComponentId::LogPanel, ComponentId::SongList]);
        assert!(ring.is_focused(ComponentId::SongList));
    }
}
