use crate::skiplist::{Node, NodeId};
use std::iter::FusedIterator;

/// Walks the level 0 chain in ascending `(score, member)` order.
///
/// Reversing it follows the `backward` links from the tail.
pub struct Iter<'a> {
    nodes: &'a [Node],
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(
        nodes: &'a [Node],
        front: Option<NodeId>,
        back: Option<NodeId>,
        remaining: usize,
    ) -> Self {
        Self {
            nodes,
            front,
            back,
            remaining,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = &nodes[self.front?];
        self.front = node.levels[0].forward;
        self.remaining -= 1;
        Some((node.member.as_str(), node.score))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let node = &nodes[self.back?];
        self.back = node.backward;
        self.remaining -= 1;
        Some((node.member.as_str(), node.score))
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {}

impl<'a> FusedIterator for Iter<'a> {}

/// Hint that the current entry is:
/// - Smaller (outside) than the desired range
/// - Inside the desired range
/// - Larger (outside) than the desired range
///
/// Used with `IterRangeWith`, or `SortedSet::range_with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeHint {
    SmallerThanRange,
    InRange,
    LargerThanRange,
}

/// Yields entries from the first one not `SmallerThanRange` until the first
/// `LargerThanRange`.
pub struct IterRangeWith<'a, F>
where
    F: Fn(&str, f64) -> RangeHint,
{
    nodes: &'a [Node],
    curr_node: Option<NodeId>,
    inclusive_fn: F,
}

impl<'a, F> IterRangeWith<'a, F>
where
    F: Fn(&str, f64) -> RangeHint,
{
    pub(crate) fn new(nodes: &'a [Node], curr_node: Option<NodeId>, inclusive_fn: F) -> Self {
        Self {
            nodes,
            curr_node,
            inclusive_fn,
        }
    }
}

impl<'a, F> Iterator for IterRangeWith<'a, F>
where
    F: Fn(&str, f64) -> RangeHint,
{
    type Item = (&'a str, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        let node = &nodes[self.curr_node?];
        let hint = (self.inclusive_fn)(node.member.as_str(), node.score);
        if let RangeHint::LargerThanRange = hint {
            self.curr_node = None;
            return None;
        }
        self.curr_node = node.levels[0].forward;
        Some((node.member.as_str(), node.score))
    }
}

impl<'a, F> FusedIterator for IterRangeWith<'a, F> where F: Fn(&str, f64) -> RangeHint {}
