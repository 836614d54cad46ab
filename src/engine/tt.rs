use crate::engine::Move;

const INDEX_BITS: u32 = 20;
const TABLE_SIZE: usize = 1 << INDEX_BITS;
const INDEX_MASK: u32 = (TABLE_SIZE as u32) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtFlag {
    Exact,
    /// Fail-high: the true score is at least `score`.
    Lower,
    /// Fail-low: the true score is at most `score`.
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    pub hash: u32,
    pub depth: u8,
    pub score: i32,
    pub flag: TtFlag,
    pub best_move: Option<Move>,
    pub age: u8,
}

/// Direct-mapped table of 2^20 slots indexed by the low hash bits. It
/// persists across searches; `new_search` advances the age so stale
/// entries become replaceable.
pub struct TranspositionTable {
    entries: Vec<Option<TtEntry>>,
    age: u8,
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TranspositionTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: vec![None; TABLE_SIZE],
            age: 0,
        }
    }

    const fn index(hash: u32) -> usize {
        (hash & INDEX_MASK) as usize
    }

    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    #[must_use]
    pub fn probe(&self, hash: u32) -> Option<TtEntry> {
        match self.entries.get(Self::index(hash)) {
            Some(Some(entry)) if entry.hash == hash => Some(*entry),
            _ => None,
        }
    }

    #[must_use]
    pub fn best_move(&self, hash: u32) -> Option<Move> {
        self.probe(hash).and_then(|e| e.best_move)
    }

    /// Replace on: empty slot, same hash, stale age, or an occupant no
    /// deeper than the newcomer.
    pub fn store(
        &mut self,
        hash: u32,
        depth: u8,
        score: i32,
        flag: TtFlag,
        best_move: Option<Move>,
    ) {
        let age = self.age;
        let Some(slot) = self.entries.get_mut(Self::index(hash)) else {
            return;
        };
        let replace = match slot {
            None => true,
            Some(existing) => {
                existing.hash == hash || existing.age != age || existing.depth <= depth
            }
        };
        if replace {
            *slot = Some(TtEntry {
                hash,
                depth,
                score,
                flag,
                best_move,
                age,
            });
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.entries {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_probe_roundtrips() {
        let mut tt = TranspositionTable::new();
        let mv = Move::new(9, 0, 8, 0);
        tt.store(42, 5, 120, TtFlag::Exact, Some(mv));

        let entry = tt.probe(42).unwrap();
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.score, 120);
        assert_eq!(entry.flag, TtFlag::Exact);
        assert!(entry.best_move.unwrap().same_squares(&mv));
        assert!(tt.probe(43).is_none());
    }

    #[test]
    fn deeper_same_age_occupant_survives_a_collision() {
        let mut tt = TranspositionTable::new();
        // Two hashes sharing the low 20 bits collide on the same slot.
        let a = 7;
        let b = 7 + (1 << INDEX_BITS);
        tt.store(a, 9, 50, TtFlag::Exact, None);
        tt.store(b, 3, -10, TtFlag::Upper, None);

        assert!(tt.probe(a).is_some());
        assert!(tt.probe(b).is_none());

        // An equally deep newcomer does replace.
        tt.store(b, 9, -10, TtFlag::Upper, None);
        assert!(tt.probe(b).is_some());
        assert!(tt.probe(a).is_none());
    }

    #[test]
    fn stale_entries_are_replaceable() {
        let mut tt = TranspositionTable::new();
        let a = 11;
        let b = 11 + (1 << INDEX_BITS);
        tt.store(a, 9, 50, TtFlag::Exact, None);

        tt.new_search();
        tt.store(b, 1, 5, TtFlag::Lower, None);
        assert!(tt.probe(b).is_some(), "stale deep entry should give way");
    }

    #[test]
    fn same_hash_always_updates() {
        let mut tt = TranspositionTable::new();
        tt.store(99, 9, 1, TtFlag::Exact, None);
        tt.store(99, 2, 7, TtFlag::Lower, None);
        let entry = tt.probe(99).unwrap();
        assert_eq!(entry.depth, 2);
        assert_eq!(entry.score, 7);
    }
}
