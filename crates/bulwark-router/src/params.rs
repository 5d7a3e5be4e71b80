//! Captured path variables.
//!
//! Bindings live inline for the usual handful of `{name}` segments and
//! spill to the heap beyond that.

use smallvec::SmallVec;

const INLINE_PARAMS: usize = 4;

type Pair = (String, String);

/// Path variables captured by a match, in the order they were bound.
///
/// Names are not deduplicated; [`get`](Self::get) returns the first
/// binding.
///
/// ```rust
/// use bulwark_router::Params;
///
/// let mut params = Params::new();
/// params.push("accountId", "acc-7");
/// params.push("orderId", "42");
///
/// assert_eq!(params.get("orderId"), Some("42"));
/// assert_eq!(params.get("tenant"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[Pair; INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value of the first binding of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter()
            .find_map(|(bound, value)| (bound == name).then_some(value))
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.into_iter()
    }

    /// Keeps the first `len` bindings.
    ///
    /// The matcher uses this to drop bindings from a branch it backtracked
    /// out of.
    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<std::slice::Iter<'a, Pair>, fn(&'a Pair) -> (&'a str, &'a str)>;

    fn into_iter(self) -> Self::IntoIter {
        let borrow: fn(&'a Pair) -> (&'a str, &'a str) = |(name, value)| (name.as_str(), value.as_str());
        self.inner.iter().map(borrow)
    }
}

impl FromIterator<Pair> for Params {
    fn from_iter<I: IntoIterator<Item = Pair>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
