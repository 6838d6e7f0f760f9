use std::cmp::Ordering;

/// Orders members that share a score.
///
/// Members this reports as `Equal` (say, `"a"` and `"A"` under a
/// case-insensitive order) are still kept apart: the skiplist falls back to
/// byte-wise order between them.
pub trait Comparator {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Byte-wise string order. The default tie-break.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Lexicographic;

impl Comparator for Lexicographic {
    #[inline]
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
}

impl<F> Comparator for F
where
    F: Fn(&str, &str) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &str, b: &str) -> Ordering {
        self(a, b)
    }
}
