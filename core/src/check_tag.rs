//! Check tags: labels with a display colour attached to monitoring checks.
//!
//! API docs: <https://uptime.com/api/v1/docs/#/check-tags>

use serde::{Deserialize, Serialize};

use crate::client::UptimeClient;
use crate::http::Transport;
use crate::resource::{null_as_default, Resource, Resources};

/// A check tag as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTag {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub pk: u64,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(rename = "tag", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color_hex: String,
}

/// Writable subset of `CheckTag` sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTagFields {
    #[serde(rename = "tag")]
    pub name: String,
    pub color_hex: String,
}

impl CheckTag {
    pub fn new(name: impl Into<String>, color_hex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color_hex: color_hex.into(),
            ..Self::default()
        }
    }
}

impl Resource for CheckTag {
    const COLLECTION: &'static str = "check-tags/";

    type Fields = CheckTagFields;

    fn pk(&self) -> u64 {
        self.pk
    }

    fn fields(&self) -> CheckTagFields {
        CheckTagFields {
            name: self.name.clone(),
            color_hex: self.color_hex.clone(),
        }
    }
}

impl<T: Transport> UptimeClient<T> {
    pub fn check_tags(&self) -> Resources<'_, CheckTag, T> {
        self.resources()
    }
}

fn is_zero(pk: &u64) -> bool {
    *pk == 0
}
