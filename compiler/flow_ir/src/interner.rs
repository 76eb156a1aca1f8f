//! String interner for identifier-like strings.
//!
//! Parameter names, member names, method names, and type names are interned
//! once and referenced by [`Name`] everywhere else, giving O(1) equality and
//! hashing. The interner is thread-safe so a frontend may build several
//! expression arenas against one shared table.

// Arc is the implementation of SharedInterner; the interner must be shared
// between the frontend and the lowering pass.
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

#[derive(Default)]
struct Inner {
    /// Content → index. Keys borrow from the leaked storage below.
    map: FxHashMap<&'static str, u32>,
    /// Interned contents; index is the `Name` value.
    strings: Vec<&'static str>,
}

/// Panic helper for interner overflow (cold path, never inlined).
#[cold]
#[inline(never)]
fn panic_interner_full(count: usize) -> ! {
    panic!("string interner exceeded capacity: {count} strings, max is {}", u32::MAX)
}

/// Thread-safe string interner.
///
/// Interned strings are leaked and live for the process lifetime, which is
/// what lets [`lookup`](StringInterner::lookup) hand out `'static` slices.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

impl StringInterner {
    /// Create an interner with the empty string pre-interned as [`Name::EMPTY`].
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.map.insert("", 0);
        inner.strings.push("");
        Self { inner: RwLock::new(inner) }
    }

    /// Intern a string, returning its [`Name`].
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` strings are interned.
    pub fn intern(&self, s: &str) -> Name {
        // Fast path: already interned.
        {
            let guard = self.inner.read();
            if let Some(&index) = guard.map.get(s) {
                return Name::new(index);
            }
        }

        let mut guard = self.inner.write();
        // Double-check after acquiring the write lock.
        if let Some(&index) = guard.map.get(s) {
            return Name::new(index);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let Ok(index) = u32::try_from(guard.strings.len()) else {
            panic_interner_full(guard.strings.len());
        };
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Name::new(index)
    }

    /// Resolve a [`Name`] back to its string.
    ///
    /// The returned slice is `'static` because interned strings are never
    /// deallocated.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.inner.read();
        guard.strings[name.index()]
    }

    /// Number of interned strings (including the empty string).
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Returns `true` if only the empty string is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for resolving interned names.
///
/// Display and rendering code accepts any `StringLookup` implementor so it
/// does not couple to the concrete interner.
pub trait StringLookup {
    /// Look up the string for an interned name.
    fn lookup(&self, name: Name) -> &str;
}

impl StringLookup for StringInterner {
    fn lookup(&self, name: Name) -> &str {
        StringInterner::lookup(self, name)
    }
}

/// Cloneable handle to a shared [`StringInterner`].
#[derive(Clone, Default)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a fresh shared interner.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
