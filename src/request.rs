use serde::{Deserialize, Deserializer};

/// Deserializes a present field into `Some`, so that `Option<Option<T>>` can tell
/// an absent field (`None`) apart from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
pub fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Trims the value and maps blank strings to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}
