pub mod span {
    use serde::Serialize;

    /// Half-open `[start, end)` byte range into the source.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
    pub struct Span {
        pub start: u32,
        pub end: u32,
    }

    impl Span {
        pub const fn new(start: u32, end: u32) -> Self {
            Self { start, end }
        }

        /// An empty span positioned at `at`.
        pub const fn empty(at: u32) -> Self {
            Self { start: at, end: at }
        }

        pub const fn len(&self) -> u32 {
            self.end - self.start
        }

        pub const fn is_empty(&self) -> bool {
            self.start == self.end
        }

        /// Smallest span covering both `self` and `other`.
        pub fn to(self, other: Span) -> Span {
            Span {
                start: self.start.min(other.start),
                end: self.end.max(other.end),
            }
        }

        pub fn contains(&self, other: Span) -> bool {
            self.start <= other.start && other.end <= self.end
        }

        pub fn range(&self) -> std::ops::Range<usize> {
            self.start as usize..self.end as usize
        }
    }
}

pub mod ast;
pub mod cst;
pub mod token;
