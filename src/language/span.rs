#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Containment with intersection semantics: an offset equal to the
    /// span's end still counts as inside, so the cursor sitting just after
    /// the last token of a construct is attributed to that construct.
    pub fn intersects(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }

    pub fn merge(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}
