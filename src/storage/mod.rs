//! Arkalia sync - Client storage
//!
//! Opaque string key/value persistence for small client-side state: the
//! tutorial flag, the theme preference and cached player interactions.
//! Keys are listed in [`constants`](crate::core::constants).

mod file;
mod memory;

pub use file::*;
pub use memory::*;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::StorageError;

/// Key/value store for client-side state.
pub trait ClientStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: ClientStore + ?Sized> ClientStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Typed helpers over any [`ClientStore`].
pub trait ClientStoreExt: ClientStore {
    /// Read and deserialize a JSON value.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and write a JSON value.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.set(key, &serde_json::to_string(value)?)
    }
}

impl<S: ClientStore + ?Sized> ClientStoreExt for S {}
