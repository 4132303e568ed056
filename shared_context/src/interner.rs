use bumpalo::Bump;
use std::collections::HashMap;

/// Handle to an interned identifier string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(pub(crate) usize);

/// Deduplicates identifier strings. Every distinct string is stored once in
/// the bump arena and addressed by its NameId, so name comparison anywhere
/// in the compiler is an integer comparison.
pub struct Interner<'a> {
    arena: &'a Bump,
    map: HashMap<&'a str, NameId>,
    vec: Vec<&'a str>,
}

impl<'a> Interner<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        // reserve slot zero for the empty name, used by error placeholders
        let mut interner = Self {
            arena,
            map: HashMap::new(),
            vec: Vec::new(),
        };
        interner.intern("");
        interner
    }

    pub fn intern(&mut self, s: &str) -> NameId {
        if let Some(&id) = self.map.get(s) {
            return id;
        }

        let id = NameId(self.vec.len());

        // Allocate the string in the bump arena
        let stored: &'a str = self.arena.alloc_str(s);

        self.vec.push(stored);
        self.map.insert(stored, id);

        id
    }

    pub fn lookup(&self, id: NameId) -> &'a str {
        self.vec[id.0]
    }

    /// The id of an already-interned string, without interning it.
    pub fn get(&self, s: &str) -> Option<NameId> {
        self.map.get(s).copied()
    }

    /// The reserved empty name. Error symbols carry it so their diagnostics
    /// never mention a made-up identifier.
    pub fn empty(&self) -> NameId {
        NameId(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_twice_returns_the_same_id() {
        let arena = Bump::new();
        let mut interner = Interner::new(&arena);
        let a = interner.intern("value");
        let b = interner.intern("value");
        assert_eq!(a, b);
        assert_eq!(interner.lookup(a), "value");
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let arena = Bump::new();
        let mut interner = Interner::new(&arena);
        assert_ne!(interner.intern("a"), interner.intern("b"));
    }
}
