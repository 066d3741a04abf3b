use serde::{Deserialize, Deserializer};

/// One field of a partial update.
///
/// When deserialized with `#[serde(default)]`, a missing key is `Unset`, an explicit `null` is
/// `Clear` and any other value is `Set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Unset,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    /// `None` for `Unset`, otherwise the new value (`None` when clearing).
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            Patch::Unset => None,
            Patch::Clear => Some(None),
            Patch::Set(v) => Some(Some(v)),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value { Some(v) => Patch::Set(v), None => Patch::Clear }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}
