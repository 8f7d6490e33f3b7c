//! JSON projection of wire messages, for debugging and inspection

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{DscvrError, Result};
use super::Message;

/// Human-facing JSON view of a message.
///
/// Default-valued fields are left out, mirroring what the encoder omits.
pub trait JsonProjection: Message + Serialize + DeserializeOwned {
    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }

    fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(invalid::<Self>)
    }

    fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(invalid::<Self>)
    }
}

impl<T> JsonProjection for T where T: Message + Serialize + DeserializeOwned {}

fn invalid<M: Message>(err: serde_json::Error) -> DscvrError {
    DscvrError::InvalidRequest(format!("{}: {}", M::NAME, err))
}

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn is_zero(value: &u64) -> bool {
    *value == 0
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
