//! Global shader property interner.
//!
//! Shader-visible names (`_DirectionalShadowAtlas`, `_BloomPyramid3`, ...) are
//! interned once and compared as integer symbols afterwards. The same name
//! always yields the same symbol for the lifetime of the process, so ids can be
//! cached in statics and reused across frames.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact integer identifier of an interned string.
pub type Symbol = Spur;

/// Interns a string, returning its symbol.
///
/// Returns the existing symbol when the string was interned before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Resolves a symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let a = intern("_ShadowAtlasSize");
        let b = intern("_ShadowAtlasSize");
        assert_eq!(a, b);
        assert_eq!(resolve(a), "_ShadowAtlasSize");
    }
}
