use crate::constants::{MODULE_READ, MODULE_WRITE};
use bitflags::bitflags;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Permissions carried by an access token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct ScopeSet: u32 {
        const MODULE_READ = 1 << 0;
        const MODULE_WRITE = 1 << 1;

        const ALL = Self::MODULE_READ.bits() | Self::MODULE_WRITE.bits();
    }
}

const NAMED: [(&str, ScopeSet); 2] =
    [(MODULE_READ, ScopeSet::MODULE_READ), (MODULE_WRITE, ScopeSet::MODULE_WRITE)];

impl ScopeSet {
    /// Parses an OAuth 2 style, space separated scope string.
    ///
    /// Unknown names are ignored.
    ///
    /// ```rust
    /// use modhub_domain::scopes::ScopeSet;
    ///
    /// let scopes = ScopeSet::parse("module_read openid");
    /// assert_eq!(scopes, ScopeSet::MODULE_READ);
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split_whitespace().map(Self::from).fold(Self::empty(), |acc, s| acc | s)
    }

    /// Scope names in canonical order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        NAMED.into_iter().filter(move |(_, flag)| self.contains(*flag)).map(|(name, _)| name)
    }

    /// Space separated scope string, the inverse of [`ScopeSet::parse`].
    #[must_use]
    pub fn to_scope_string(self) -> String {
        self.names().collect::<Vec<_>>().join(" ")
    }
}

impl From<&str> for ScopeSet {
    fn from(name: &str) -> Self {
        match name {
            MODULE_READ => Self::MODULE_READ,
            MODULE_WRITE => Self::MODULE_WRITE,
            _ => Self::empty(),
        }
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_scope_string())
    }
}

impl Serialize for ScopeSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_scope_string())
    }
}

/// Accepts either `"module_read module_write"` or `["module_read", "module_write"]`.
impl<'de> Deserialize<'de> for ScopeSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScopeVisitor;

        impl<'de> Visitor<'de> for ScopeVisitor {
            type Value = ScopeSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a space separated scope string or a list of scope names")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ScopeSet, E> {
                Ok(ScopeSet::parse(value))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ScopeSet, A::Error> {
                let mut scopes = ScopeSet::empty();
                while let Some(name) = seq.next_element::<String>()? {
                    scopes |= ScopeSet::parse(&name);
                }
                Ok(scopes)
            }
        }

        deserializer.deserialize_any(ScopeVisitor)
    }
}
