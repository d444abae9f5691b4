/// Ring buffer of recently visited screen ids, most recent first.
///
/// Pushed only when the character leaves a screen through an edge or a
/// door, never on respawn. Entries are ids, never copies of screens.

use circular_buffer::CircularBuffer;

use crate::consts::HISTORY_CAPACITY;

use super::geometry::ScreenId;

#[derive(Clone, Debug)]
pub struct ScreenHistory {
    entries: CircularBuffer<HISTORY_CAPACITY, ScreenId>,
}

impl Default for ScreenHistory {
    fn default() -> Self {
        ScreenHistory::new()
    }
}

impl ScreenHistory {
    pub fn new() -> Self {
        ScreenHistory { entries: CircularBuffer::new() }
    }

    /// Record a screen the character just left. When full, the oldest
    /// entry is evicted.
    pub fn push(&mut self, id: ScreenId) {
        self.entries.push_front(id);
    }

    /// Most recent first.
    pub fn iter(&self) -> impl Iterator<Item = ScreenId> + '_ {
        self.entries.iter().copied()
    }

    pub fn most_recent(&self) -> Option<ScreenId> {
        self.entries.front().copied()
    }

    pub fn oldest(&self) -> Option<ScreenId> {
        self.entries.back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries from the recent end up to and including `id`. Used when
    /// a respawn makes a remembered screen active again, so the active
    /// screen never sits at the head of its own history.
    pub fn rewind_to(&mut self, id: ScreenId) {
        if !self.entries.iter().any(|&e| e == id) {
            return;
        }
        while let Some(e) = self.entries.pop_front() {
            if e == id {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_recent_first() {
        let mut h = ScreenHistory::new();
        h.push(ScreenId(0));
        h.push(ScreenId(1));
        h.push(ScreenId(2));
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![ScreenId(2), ScreenId(1), ScreenId(0)]);
        assert_eq!(h.most_recent(), Some(ScreenId(2)));
        assert_eq!(h.oldest(), Some(ScreenId(0)));
    }

    #[test]
    fn full_history_evicts_oldest() {
        let mut h = ScreenHistory::new();
        for i in 0..(HISTORY_CAPACITY as i32 + 3) {
            h.push(ScreenId(i));
        }
        assert_eq!(h.len(), HISTORY_CAPACITY);
        assert_eq!(h.oldest(), Some(ScreenId(3)));
        assert_eq!(h.most_recent(), Some(ScreenId(HISTORY_CAPACITY as i32 + 2)));
    }

    #[test]
    fn rewind_drops_through_target() {
        let mut h = ScreenHistory::new();
        for i in 0..4 {
            h.push(ScreenId(i));
        }
        h.rewind_to(ScreenId(2));
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![ScreenId(1), ScreenId(0)]);
        h.rewind_to(ScreenId(42));
        assert_eq!(h.len(), 2);
    }
}
