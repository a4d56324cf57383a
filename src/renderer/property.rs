//! Shader Property Identifiers
//!
//! Global shader properties and temporary render targets are addressed by
//! name on the host side. Names are interned once through the global
//! [`interner`](crate::utils::interner) so every later lookup compares a
//! 32-bit key instead of a string.

use std::fmt;

use crate::utils::interner::{self, Symbol};

/// Interned name of a global shader property or temporary render target.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(Symbol);

impl PropertyId {
    #[inline]
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(interner::intern(name))
    }

    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        interner::resolve(self.0)
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyId({})", self.name())
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a draw writes to, or what a global texture binding points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTargetId {
    /// A temporary target acquired by name.
    Property(PropertyId),
    /// The camera's own backbuffer.
    CameraTarget,
}

impl From<PropertyId> for RenderTargetId {
    #[inline]
    fn from(id: PropertyId) -> Self {
        Self::Property(id)
    }
}

impl RenderTargetId {
    #[must_use]
    pub fn property(self) -> Option<PropertyId> {
        match self {
            Self::Property(id) => Some(id),
            Self::CameraTarget => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_id() {
        let a = PropertyId::new("_PostFXSource");
        let b = PropertyId::new("_PostFXSource");
        assert_eq!(a, b);
        assert_eq!(a.name(), "_PostFXSource");
    }

    #[test]
    fn test_target_conversion() {
        let id = PropertyId::new("_BloomResult");
        let target: RenderTargetId = id.into();
        assert_eq!(target.property(), Some(id));
        assert_eq!(RenderTargetId::CameraTarget.property(), None);
    }
}
