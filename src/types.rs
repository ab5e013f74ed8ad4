//! Shared request-shape types.

use serde::{Deserialize, Deserializer, Serialize};

/// A field in a partial-update payload.
///
/// JSON distinguishes a missing key from an explicit `null`, and so does this
/// type: `Unset` keeps the stored value, `Null` clears it, `Set` overwrites it.
/// Struct fields using it need `#[serde(default)]` so that a missing key
/// deserializes to `Unset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Unset,
    Null,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    /// Resolve against the stored value: `Unset` yields `current`.
    pub fn resolve(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Unset => current,
            Patch::Null => None,
            Patch::Set(value) => Some(value),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unset
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Null,
        })
    }
}

/// Reference list input that accepts either a single id or an array of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdList {
    One(String),
    Many(Vec<String>),
}

impl IdList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            IdList::One(id) => vec![id],
            IdList::Many(ids) => ids,
        }
    }
}

impl Default for IdList {
    fn default() -> Self {
        IdList::Many(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default)]
        value: Patch<String>,
        #[serde(default)]
        ids: Patch<IdList>,
    }

    #[test]
    fn distinguishes_absent_null_and_set() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.value, Patch::Unset);

        let null: Probe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(null.value, Patch::Null);

        let set: Probe = serde_json::from_str(r#"{"value": "x"}"#).unwrap();
        assert_eq!(set.value, Patch::Set("x".to_string()));
    }

    #[test]
    fn single_id_normalizes_to_one_element_list() {
        let one: Probe = serde_json::from_str(r#"{"ids": "abc"}"#).unwrap();
        let Patch::Set(ids) = one.ids else {
            panic!("expected ids to be set");
        };
        assert_eq!(ids.into_vec(), vec!["abc".to_string()]);

        let many: Probe = serde_json::from_str(r#"{"ids": ["a", "b"]}"#).unwrap();
        let Patch::Set(ids) = many.ids else {
            panic!("expected ids to be set");
        };
        assert_eq!(ids.into_vec().len(), 2);
    }

    #[test]
    fn resolve_keeps_current_when_unset() {
        assert_eq!(Patch::<i32>::Unset.resolve(Some(3)), Some(3));
        assert_eq!(Patch::<i32>::Null.resolve(Some(3)), None);
        assert_eq!(Patch::Set(4).resolve(Some(3)), Some(4));
    }
}
