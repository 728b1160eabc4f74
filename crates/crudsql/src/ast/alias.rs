use std::collections::{HashMap, HashSet};

/// Allocates table aliases for subqueries.
///
/// One scope is shared by a whole statement tree. Names are `sq<depth>_<n>`,
/// where `n` counts per nesting depth, and never collide with a name that was
/// reserved (table names, join aliases) or handed out earlier.
#[derive(Debug, Default)]
pub struct AliasScope {
    next: HashMap<usize, usize>,
    taken: HashSet<String>,
}

impl AliasScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a name as used so [`allocate`](Self::allocate) skips it.
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Hand out a fresh alias for a subquery at `depth`.
    pub fn allocate(&mut self, depth: usize) -> String {
        let counter = self.next.entry(depth).or_insert(0);
        loop {
            let candidate = format!("sq{depth}_{counter}");
            *counter += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
