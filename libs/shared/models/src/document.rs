use serde::{Deserialize, Deserializer};

/// Read a field whose stored value may be `null`, falling back to the type's
/// default. Pair with `#[serde(default)]` so a missing key reads the same way.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
