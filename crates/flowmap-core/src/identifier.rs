//! Identifier management using string interning.
//!
//! Node ids, flow ids, diagram ids and category tags are compared and hashed
//! constantly during layout, so they are interned once into the copyable
//! [`Id`] type.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for identifier storage.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock")
}

/// Interned identifier.
///
/// # Examples
///
/// ```
/// use flowmap_core::identifier::Id;
///
/// let boiler = Id::new("boiler");
/// assert_eq!(boiler, Id::new("boiler"));
/// assert_eq!(boiler, "boiler");
/// assert_eq!(boiler.to_string(), "boiler");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from a string slice, interning it on first use.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Runs `f` with the interned string of this id without allocating.
    pub fn with_str<R>(self, f: impl FnOnce(&str) -> R) -> R {
        let interner = interner();
        let value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        f(value)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Copy out before writing so the lock is not held across the formatter.
        let value = self.with_str(str::to_owned);
        f.write_str(&value)
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|value| value == other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_str(|value| serializer.serialize_str(value))
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(&value))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_new_interns_equal_strings() {
        let id1 = Id::new("boiler");
        let id2 = Id::new("boiler");
        let id3 = Id::new("turbine");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "boiler");
    }

    #[test]
    fn test_display_trait() {
        let id = Id::new("heat-exchanger");
        assert_eq!(format!("{id}"), "heat-exchanger");
    }

    #[test]
    fn test_partial_eq_str() {
        let id = Id::new("steam");
        assert!(id == "steam");
        assert!(id != "water");

        let owned = String::from("steam");
        assert!(id == owned.as_str());
    }

    #[test]
    fn test_hash_and_eq() {
        let mut map = HashMap::new();
        map.insert(Id::new("key1"), "value1");
        map.insert(Id::new("key2"), "value2");

        assert_eq!(map.get(&Id::new("key1")), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_serde_roundtrip_through_string() {
        let id: Id = serde_json::from_str("\"pump-1\"").expect("valid json string");
        assert_eq!(id, "pump-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"pump-1\"");
    }
}
