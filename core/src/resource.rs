//! Generic CRUD over any resource type the API exposes.
//!
//! # Design
//! A resource type describes itself through `Resource`: its collection path,
//! its primary key, and the projection of fields a client may write. The
//! `Resources` handle turns that description into create/get/list/update/
//! delete calls on top of the `UptimeClient` primitives, so each new resource
//! type is a struct and a trait impl rather than another copy of the CRUD code.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::client::{decode, UptimeClient};
use crate::error::{ApiError, Result};
use crate::http::Transport;

/// A remote entity with its own collection and item endpoints.
pub trait Resource: DeserializeOwned {
    /// Collection path relative to the API base, with a trailing slash.
    const COLLECTION: &'static str;

    /// Client-writable fields; never includes server-assigned ones.
    type Fields: Serialize;

    /// Server-assigned primary key; zero before creation.
    fn pk(&self) -> u64;

    fn fields(&self) -> Self::Fields;

    fn item_path(pk: u64) -> String {
        format!("{}{pk}", Self::COLLECTION)
    }
}

/// Paginated list envelope. Missing or null fields decode to empty values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
pub struct ListResult<R> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default)]
    pub next: Option<u64>,
    #[serde(default)]
    pub previous: Option<u64>,
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    pub results: Vec<R>,
}

/// Envelope returned by create calls: the list envelope's shape carrying a
/// single record instead of an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResult<R> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default)]
    pub next: Option<u64>,
    #[serde(default)]
    pub previous: Option<u64>,
    pub results: R,
}

/// Decode `null` as the type's default, the way the API's zero values read.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// CRUD handle for resource type `R`, borrowed from a client.
pub struct Resources<'c, R, T> {
    client: &'c UptimeClient<T>,
    _resource: PhantomData<fn() -> R>,
}

impl<T: Transport> UptimeClient<T> {
    /// CRUD handle for any `Resource` type.
    pub fn resources<R: Resource>(&self) -> Resources<'_, R, T> {
        Resources {
            client: self,
            _resource: PhantomData,
        }
    }
}

impl<'c, R: Resource, T: Transport> Resources<'c, R, T> {
    /// Create `record` and return the server-assigned primary key.
    pub fn create(&self, record: &R) -> Result<u64> {
        let body = self.client.post(R::COLLECTION, &record.fields())?;
        if body.is_empty() {
            return Err(ApiError::EmptyResponse);
        }
        let created: CreateResult<R> = decode(&body)?;
        let pk = created.results.pk();
        debug!(collection = R::COLLECTION, pk, "created");
        Ok(pk)
    }

    pub fn get(&self, pk: u64) -> Result<R> {
        self.client.get(&R::item_path(pk), &[])
    }

    /// First page of the collection; pagination metadata is dropped.
    pub fn list(&self) -> Result<Vec<R>> {
        let page: ListResult<R> = self.client.get(R::COLLECTION, &[])?;
        Ok(page.results)
    }

    /// One page of the collection with its pagination metadata. Following
    /// `next` / `previous` is left to the caller.
    pub fn list_page(&self, page: u64) -> Result<ListResult<R>> {
        let page = page.to_string();
        self.client.get(R::COLLECTION, &[("page", page.as_str())])
    }

    /// Replace the writable fields of the record addressed by `record.pk()`.
    pub fn update(&self, record: &R) -> Result<()> {
        self.client.put(&R::item_path(record.pk()), &record.fields())
    }

    pub fn delete(&self, pk: u64) -> Result<()> {
        self.client.delete(&R::item_path(pk))
    }
}
