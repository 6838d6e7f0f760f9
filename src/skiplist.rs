//! Rank-augmented skiplist over `(score, member)` keys.
//!
//! Nodes live in an arena (`Vec<Node>`) and link to each other by index, so
//! the forward/backward links never form an ownership cycle. Slot `0` is the
//! header: it sits on every level and carries no entry.
//!
//! Every forward link also records a `span`, the number of level 0 steps it
//! jumps over. Summing spans on the way down turns rank queries into a single
//! O(log n) descent:
//!
//! ```text
//! L2: HEAD ---------------3---------------> c ----1----> NULL
//! L1: HEAD ----1----> a ---------2--------> c ----1----> NULL
//! L0: HEAD ----1----> a ----1----> b ----1----> c ----1----> d
//! ```
//!
//! A link whose forward is `NULL` keeps a span equal to the number of nodes
//! after its owner, so new levels can be spliced in without a rescan.
use crate::comparator::Comparator;
use crate::config::MAX_LEVEL_LIMIT;
use crate::iter::{Iter, IterRangeWith, RangeHint};
use crate::level::LevelGenerator;
use rand::Rng;
use std::cmp::Ordering;
use std::fmt;
use tracing::trace;

pub(crate) type NodeId = usize;

pub(crate) const HEADER: NodeId = 0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Level {
    pub(crate) forward: Option<NodeId>,
    pub(crate) span: usize,
}

pub(crate) struct Node {
    pub(crate) member: String,
    pub(crate) score: f64,
    pub(crate) backward: Option<NodeId>,
    pub(crate) levels: Vec<Level>,
}

impl Node {
    fn new(member: String, score: f64, level: usize) -> Self {
        Node {
            member,
            score,
            backward: None,
            levels: vec![Level::default(); level],
        }
    }

    /// Placeholder left in a freed slot. Does not allocate.
    fn vacant() -> Self {
        Node {
            member: String::new(),
            score: 0.0,
            backward: None,
            levels: Vec::new(),
        }
    }
}

pub(crate) struct SkipList<C, R> {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    tail: Option<NodeId>,
    length: usize,
    level: usize,
    levels: LevelGenerator<R>,
    comparator: C,
}

impl<C: Comparator, R: Rng> SkipList<C, R> {
    pub(crate) fn new(comparator: C, levels: LevelGenerator<R>) -> Self {
        let header = Node::new(String::new(), 0.0, levels.max_level());
        SkipList {
            nodes: vec![header],
            free: Vec::new(),
            tail: None,
            length: 0,
            level: 1,
            levels,
            comparator,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.length
    }

    /// Compares the node at `id` against the key `(score, member)`.
    #[inline]
    fn cmp_key(&self, id: NodeId, score: f64, member: &str) -> Ordering {
        let node = &self.nodes[id];
        match node.score.partial_cmp(&score) {
            // Byte order settles members the comparator treats as equal.
            Some(Ordering::Equal) | None => self
                .comparator
                .compare(&node.member, member)
                .then_with(|| node.member.as_str().cmp(member)),
            Some(ord) => ord,
        }
    }

    #[inline]
    fn is_exact(&self, id: NodeId, score: f64, member: &str) -> bool {
        let node = &self.nodes[id];
        node.score == score && node.member == member
    }

    #[inline]
    fn forward(&self, id: NodeId, level: usize) -> Option<NodeId> {
        self.nodes[id].levels[level].forward
    }

    #[inline]
    fn span(&self, id: NodeId, level: usize) -> usize {
        self.nodes[id].levels[level].span
    }

    fn alloc(&mut self, member: String, score: f64, level: usize) -> NodeId {
        let node = Node::new(member, score, level);
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Inserts `(score, member)`, which must not already be present.
    pub(crate) fn insert(&mut self, score: f64, member: String) -> NodeId {
        let mut update = [HEADER; MAX_LEVEL_LIMIT];
        let mut rank = [0usize; MAX_LEVEL_LIMIT];

        let mut x = HEADER;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.forward(x, i) {
                if self.cmp_key(next, score, &member) != Ordering::Less {
                    break;
                }
                rank[i] += self.span(x, i);
                x = next;
            }
            update[i] = x;
        }

        let level = self.levels.random_level();
        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = HEADER;
                self.nodes[HEADER].levels[i].span = self.length;
            }
            trace!(from = self.level, to = level, "raising skiplist level");
            self.level = level;
        }

        let id = self.alloc(member, score, level);
        for i in 0..level {
            let pred = self.nodes[update[i]].levels[i];
            let skipped = rank[0] - rank[i];
            self.nodes[id].levels[i] = Level {
                forward: pred.forward,
                span: pred.span - skipped,
            };
            self.nodes[update[i]].levels[i] = Level {
                forward: Some(id),
                span: skipped + 1,
            };
        }
        // Untouched higher links now jump over one more node.
        for i in level..self.level {
            self.nodes[update[i]].levels[i].span += 1;
        }

        self.nodes[id].backward = if update[0] == HEADER {
            None
        } else {
            Some(update[0])
        };
        match self.forward(id, 0) {
            Some(next) => self.nodes[next].backward = Some(id),
            None => self.tail = Some(id),
        }
        self.length += 1;

        #[cfg(debug_assertions)]
        {
            self.ensure_invariants()
        }
        id
    }

    /// Last node strictly before `(score, member)` on every level in use.
    fn predecessors(&self, score: f64, member: &str) -> [NodeId; MAX_LEVEL_LIMIT] {
        let mut update = [HEADER; MAX_LEVEL_LIMIT];
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                if self.cmp_key(next, score, member) != Ordering::Less {
                    break;
                }
                x = next;
            }
            update[i] = x;
        }
        update
    }

    /// Removes the node matching `(score, member)` exactly.
    pub(crate) fn delete(&mut self, score: f64, member: &str) -> bool {
        let update = self.predecessors(score, member);
        match self.forward(update[0], 0) {
            Some(id) if self.is_exact(id, score, member) => {
                self.unlink(id, &update);
                true
            }
            _ => {
                trace!(score, member, "delete found no matching node");
                false
            }
        }
    }

    pub(crate) fn pop_first(&mut self) -> Option<(String, f64)> {
        let id = self.forward(HEADER, 0)?;
        // The header precedes the first node on every level.
        Some(self.unlink(id, &[HEADER; MAX_LEVEL_LIMIT]))
    }

    pub(crate) fn pop_last(&mut self) -> Option<(String, f64)> {
        let id = self.tail?;
        let update = {
            let node = &self.nodes[id];
            self.predecessors(node.score, &node.member)
        };
        Some(self.unlink(id, &update))
    }

    fn unlink(&mut self, id: NodeId, update: &[NodeId; MAX_LEVEL_LIMIT]) -> (String, f64) {
        for i in 0..self.level {
            let pred = update[i];
            if self.forward(pred, i) == Some(id) {
                let removed = self.nodes[id].levels[i];
                let link = &mut self.nodes[pred].levels[i];
                link.span = link.span + removed.span - 1;
                link.forward = removed.forward;
            } else {
                self.nodes[pred].levels[i].span -= 1;
            }
        }

        let backward = self.nodes[id].backward;
        match self.forward(id, 0) {
            Some(next) => self.nodes[next].backward = backward,
            None => self.tail = backward,
        }

        let before = self.level;
        while self.level > 1 && self.forward(HEADER, self.level - 1).is_none() {
            self.level -= 1;
        }
        if self.level != before {
            trace!(from = before, to = self.level, "shrinking skiplist level");
        }
        self.length -= 1;

        let node = std::mem::replace(&mut self.nodes[id], Node::vacant());
        self.free.push(id);

        #[cfg(debug_assertions)]
        {
            self.ensure_invariants()
        }
        (node.member, node.score)
    }

    /// 1-based rank of `(score, member)`, or 0 when absent.
    pub(crate) fn rank(&self, score: f64, member: &str) -> usize {
        let mut rank = 0;
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                if self.cmp_key(next, score, member) == Ordering::Greater {
                    break;
                }
                rank += self.span(x, i);
                x = next;
            }
            if x != HEADER && self.is_exact(x, score, member) {
                return rank;
            }
        }
        0
    }

    /// Node at the 1-based `rank`.
    pub(crate) fn element_by_rank(&self, rank: usize) -> Option<&Node> {
        if rank == 0 || rank > self.length {
            return None;
        }
        let mut traversed = 0;
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                let span = self.span(x, i);
                if traversed + span > rank {
                    break;
                }
                traversed += span;
                x = next;
            }
            if traversed == rank {
                return Some(&self.nodes[x]);
            }
        }
        None
    }

    pub(crate) fn first(&self) -> Option<&Node> {
        self.forward(HEADER, 0).map(|id| &self.nodes[id])
    }

    pub(crate) fn last(&self) -> Option<&Node> {
        self.tail.map(|id| &self.nodes[id])
    }

    /// First node for which `before` returns false. `before` must be
    /// monotone over the level 0 order (true, then false).
    fn seek<P: FnMut(&Node) -> bool>(&self, mut before: P) -> Option<NodeId> {
        let mut x = HEADER;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                if !before(&self.nodes[next]) {
                    break;
                }
                x = next;
            }
        }
        self.forward(x, 0)
    }

    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter::new(&self.nodes, self.forward(HEADER, 0), self.tail, self.length)
    }

    pub(crate) fn range_with<F>(&self, hint: F) -> IterRangeWith<'_, F>
    where
        F: Fn(&str, f64) -> RangeHint,
    {
        let start = self.seek(|node| {
            matches!(
                hint(node.member.as_str(), node.score),
                RangeHint::SmallerThanRange
            )
        });
        IterRangeWith::new(&self.nodes, start, hint)
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn ensure_invariants(&self) {
        let header = &self.nodes[HEADER];
        let mut position = vec![0usize; self.nodes.len()];
        let mut count = 0;
        let mut prev: Option<NodeId> = None;
        let mut cursor = header.levels[0].forward;
        while let Some(id) = cursor {
            count += 1;
            position[id] = count;
            let node = &self.nodes[id];
            assert_eq!(node.backward, prev, "backward link of {:?}", node.member);
            if let Some(prev) = prev {
                assert_eq!(
                    self.cmp_key(prev, node.score, &node.member),
                    Ordering::Less,
                    "level 0 out of order at {:?}",
                    node.member
                );
            }
            prev = Some(id);
            cursor = node.levels[0].forward;
        }
        assert_eq!(count, self.length, "length out of sync");
        assert_eq!(self.tail, prev, "tail out of sync");

        for i in 0..self.level {
            let mut rank = 0;
            let mut x = HEADER;
            while let Some(next) = self.forward(x, i) {
                rank += self.span(x, i);
                assert_eq!(rank, position[next], "span mismatch on level {}", i);
                x = next;
            }
            // Trailing span counts the nodes left after `x`.
            assert_eq!(rank + self.span(x, i), self.length, "tail span on level {}", i);
        }

        assert!(self.level >= 1 && self.level <= self.levels.max_level());
        for i in self.level..self.levels.max_level() {
            assert!(header.levels[i].forward.is_none(), "stale link on level {}", i);
        }
        if self.length > 0 {
            assert!(header.levels[self.level - 1].forward.is_some());
        } else {
            assert_eq!(self.level, 1);
        }
    }
}

impl<C, R> fmt::Debug for SkipList<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "SkipList(level: {}, length: {}), and table:",
            self.level, self.length
        )?;
        for i in (0..self.level).rev() {
            write!(f, "L{}: HEAD", i)?;
            let mut cursor = self.nodes[HEADER].levels[i].forward;
            while let Some(id) = cursor {
                let node = &self.nodes[id];
                write!(f, " -> ({:?}, {:?})", node.member, node.score)?;
                cursor = node.levels[i].forward;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Lexicographic;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn skiplist(seed: u64) -> SkipList<Lexicographic, StdRng> {
        SkipList::new(
            Lexicographic,
            LevelGenerator::new(StdRng::seed_from_u64(seed), 0.25, 32),
        )
    }

    fn members(sl: &SkipList<Lexicographic, StdRng>) -> Vec<&str> {
        sl.iter().map(|(m, _)| m).collect()
    }

    #[test]
    fn insert_no_panic() {
        let mut sl = skiplist(0);
        let entries = &[
            (10.0, "j"),
            (30.0, "c"),
            (50.0, "e"),
            (5.0, "f"),
            (0.0, "z"),
            (3.0, "a"),
        ];
        for (score, member) in entries {
            sl.insert(*score, member.to_string());
        }
        sl.ensure_invariants();
        assert_eq!(sl.len(), 6);
        assert_eq!(members(&sl), vec!["z", "a", "f", "j", "c", "e"]);
    }

    #[test]
    fn ties_break_on_member() {
        let mut sl = skiplist(1);
        sl.insert(1.0, "c".to_string());
        sl.insert(1.0, "a".to_string());
        sl.insert(1.0, "b".to_string());
        assert_eq!(members(&sl), vec!["a", "b", "c"]);
        assert_eq!(sl.rank(1.0, "b"), 2);
    }

    #[test]
    fn rank_and_element_by_rank_agree() {
        let mut sl = skiplist(2);
        for i in 0..500u32 {
            // Scatter insertion order.
            let k = (i * 7919) % 500;
            sl.insert(f64::from(k), format!("m{:04}", k));
        }
        for k in 0..500u32 {
            let member = format!("m{:04}", k);
            let rank = sl.rank(f64::from(k), &member);
            assert_eq!(rank, k as usize + 1);
            let node = sl.element_by_rank(rank).unwrap();
            assert_eq!(node.member, member);
            assert_eq!(node.score, f64::from(k));
        }
    }

    #[test]
    fn rank_misses_return_zero() {
        let mut sl = skiplist(3);
        assert_eq!(sl.rank(1.0, "a"), 0);
        sl.insert(1.0, "a".to_string());
        assert_eq!(sl.rank(1.0, "b"), 0);
        assert_eq!(sl.rank(2.0, "a"), 0);
        assert_eq!(sl.rank(0.5, "a"), 0);
    }

    #[test]
    fn element_by_rank_bounds() {
        let mut sl = skiplist(4);
        assert!(sl.element_by_rank(0).is_none());
        assert!(sl.element_by_rank(1).is_none());
        sl.insert(1.0, "a".to_string());
        assert!(sl.element_by_rank(0).is_none());
        assert_eq!(sl.element_by_rank(1).unwrap().member, "a");
        assert!(sl.element_by_rank(2).is_none());
    }

    #[test]
    fn delete_requires_exact_match() {
        let mut sl = skiplist(5);
        sl.insert(1.0, "a".to_string());
        sl.insert(2.0, "b".to_string());
        assert!(!sl.delete(1.0, "b"));
        assert!(!sl.delete(2.0, "a"));
        assert!(!sl.delete(3.0, "c"));
        assert_eq!(sl.len(), 2);
        assert!(sl.delete(1.0, "a"));
        assert!(!sl.delete(1.0, "a"));
        assert_eq!(members(&sl), vec!["b"]);
        assert_eq!(sl.first().unwrap().member, "b");
        assert_eq!(sl.last().unwrap().member, "b");
    }

    #[test]
    fn delete_everything_resets_level() {
        let mut sl = skiplist(6);
        for i in 0..200 {
            sl.insert(f64::from(i), i.to_string());
        }
        assert!(sl.level > 1);
        for i in (0..200).rev() {
            assert!(sl.delete(f64::from(i), &i.to_string()));
        }
        assert_eq!(sl.len(), 0);
        assert_eq!(sl.level, 1);
        assert!(sl.tail.is_none());
        assert!(sl.first().is_none());
        sl.ensure_invariants();
    }

    #[test]
    fn slots_are_recycled() {
        let mut sl = skiplist(7);
        for i in 0..10 {
            sl.insert(f64::from(i), i.to_string());
        }
        let slots = sl.nodes.len();
        for i in 0..10 {
            assert!(sl.delete(f64::from(i), &i.to_string()));
            sl.insert(f64::from(i) + 0.5, i.to_string());
        }
        assert_eq!(sl.nodes.len(), slots);
        assert_eq!(sl.len(), 10);
    }

    #[test]
    fn pops_from_both_ends() {
        let mut sl = skiplist(8);
        for (score, member) in &[(2.0, "b"), (1.0, "a"), (3.0, "c")] {
            sl.insert(*score, member.to_string());
        }
        assert_eq!(sl.pop_first(), Some(("a".to_string(), 1.0)));
        assert_eq!(sl.pop_last(), Some(("c".to_string(), 3.0)));
        assert_eq!(sl.pop_last(), Some(("b".to_string(), 2.0)));
        assert_eq!(sl.pop_first(), None);
        assert_eq!(sl.pop_last(), None);
    }

    #[test]
    fn single_level_degenerates_to_list() {
        let mut sl = SkipList::new(
            Lexicographic,
            LevelGenerator::new(StdRng::seed_from_u64(9), 0.25, 1),
        );
        for i in (0..50).rev() {
            sl.insert(f64::from(i), i.to_string());
        }
        assert_eq!(sl.level, 1);
        assert_eq!(sl.rank(25.0, "25"), 26);
        assert_eq!(sl.element_by_rank(50).unwrap().member, "49");
    }

    #[test]
    fn comparator_ties_fall_back_to_bytes() {
        let mut sl = SkipList::new(
            |a: &str, b: &str| a.to_lowercase().cmp(&b.to_lowercase()),
            LevelGenerator::new(StdRng::seed_from_u64(11), 0.25, 32),
        );
        for member in &["b", "a", "B", "A"] {
            sl.insert(1.0, member.to_string());
        }
        let order: Vec<_> = sl.iter().map(|(m, _)| m).collect();
        assert_eq!(order, vec!["A", "a", "B", "b"]);
        assert_eq!(sl.rank(1.0, "a"), 2);
        assert_eq!(sl.rank(1.0, "B"), 3);
        assert!(sl.delete(1.0, "a"));
        assert!(!sl.delete(1.0, "a"));
        assert_eq!(sl.rank(1.0, "A"), 1);
        sl.ensure_invariants();
    }

    #[test]
    fn debug_prints_table() {
        let mut sl = skiplist(10);
        sl.insert(1.0, "a".to_string());
        let out = format!("{:?}", sl);
        assert!(out.starts_with("SkipList(level: "));
        assert!(out.contains("L0: HEAD -> (\"a\", 1.0)"));
    }
}
