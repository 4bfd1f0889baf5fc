use crate::types::FormatKey;
use serde::{Deserialize, Serialize};

/// A read-only snapshot of one object inside an open shotfile header.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
    pub object_type: u16,
    pub num_dims: u32,
    pub num_steps: u32,
    pub format: u16,
}

impl ObjectInfo {
    /// The friendly key for `format`, when it is one of the tabled codes.
    pub fn format_key(&self) -> Option<FormatKey> {
        FormatKey::from_code(self.format)
    }
}
