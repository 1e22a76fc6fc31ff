use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::KeyError;

pub const KEY_SEPARATOR: char = '/';

/// Canonical identifier of an object in the store's flat namespace.
///
/// Keys are `folder/filename` paths. They never start with a separator and
/// never contain empty segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Build a key from a folder and a file name.
    ///
    /// A trailing separator on the folder is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains a separator, or if
    /// the folder is not a valid key prefix.
    pub fn new(folder: &str, name: &str) -> Result<Self, KeyError> {
        if name.is_empty() {
            return Err(KeyError::Empty);
        }
        if name.contains(KEY_SEPARATOR) {
            return Err(KeyError::NameContainsSeparator(name.to_string()));
        }
        let folder = folder.strip_suffix(KEY_SEPARATOR).unwrap_or(folder);
        Self::parse(&format!("{folder}{KEY_SEPARATOR}{name}"))
    }

    /// Validate a complete key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, starts with a separator, or has
    /// an empty segment.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        if raw.is_empty() {
            return Err(KeyError::Empty);
        }
        if raw.starts_with(KEY_SEPARATOR) {
            return Err(KeyError::LeadingSlash(raw.to_string()));
        }
        if raw.split(KEY_SEPARATOR).any(str::is_empty) {
            return Err(KeyError::EmptySegment(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last segment of the key.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit(KEY_SEPARATOR)
            .next()
            .unwrap_or(self.0.as_str())
    }

    /// Everything before the last segment, if the key has a folder.
    #[must_use]
    pub fn folder(&self) -> Option<&str> {
        self.0
            .rsplit_once(KEY_SEPARATOR)
            .map(|(folder, _)| folder)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectKey> for String {
    fn from(key: ObjectKey) -> Self {
        key.0
    }
}

/// Kind of storage mutation recorded in a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Upload,
    Update,
    Delete,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether the mutation can be undone by deleting the key.
    ///
    /// Deletes have no compensation: nothing restores the removed bytes.
    #[must_use]
    pub const fn is_compensable(self) -> bool {
        matches!(self, Self::Upload | Self::Update)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed storage mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub key: ObjectKey,
}

impl Action {
    #[must_use]
    pub fn upload(key: ObjectKey) -> Self {
        Self {
            kind: ActionKind::Upload,
            key,
        }
    }

    #[must_use]
    pub fn update(key: ObjectKey) -> Self {
        Self {
            kind: ActionKind::Update,
            key,
        }
    }

    #[must_use]
    pub fn delete(key: ObjectKey) -> Self {
        Self {
            kind: ActionKind::Delete,
            key,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.key)
    }
}

/// An object as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    /// Content type reported by the store, if any.
    pub content_type: Option<String>,
}
