/*
* Copyright (C) 2024 Swift Navigation Inc.
* Contact: Swift Navigation <dev@swiftnav.com>
*
* This source is subject to the license found in the file 'LICENSE' which must
* be be distributed together with this source. All other rights reserved.
*
* THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
* EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
* WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
*/

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};
use crate::uri;

/// Which storage an address points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Domain {
    Local,
    Remote,
}

/// One end of a copy, as accepted at the public boundary.
///
/// Strings are kept as given and only classified when a copy needs them, so a
/// `gs://` string and a pre-built [RemoteRef] are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// A structured filesystem path, always local.
    Path(PathBuf),
    /// A `gs://` URI, a `file:` URI or a bare path string.
    Uri(String),
    /// A resolved remote object, always remote.
    Object(RemoteRef),
}

impl Address {
    pub fn domain(&self) -> Result<Domain> {
        uri::classify(self)
    }

    pub fn resolve(&self) -> Result<Location> {
        uri::resolve(self)
    }

    pub fn to_uri_string(&self) -> Result<String> {
        uri::to_uri_string(self)
    }

    pub fn flatten(&self) -> Result<String> {
        uri::flatten(self)
    }

    /// The address of `name` inside the directory (or prefix) this address names.
    pub fn join(&self, name: &str) -> Address {
        match self {
            Address::Path(path) => Address::Path(path.join(name)),
            Address::Uri(s) => Address::Uri(uri::join_str(s, name)),
            Address::Object(object) => Address::Object(object.join(name)),
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Path(path) => write!(f, "{}", path.display()),
            Address::Uri(s) => f.write_str(s),
            Address::Object(object) => write!(f, "{}", object),
        }
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address::Uri(s.to_owned())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address::Uri(s)
    }
}

impl From<&String> for Address {
    fn from(s: &String) -> Self {
        Address::Uri(s.clone())
    }
}

impl From<&Path> for Address {
    fn from(path: &Path) -> Self {
        Address::Path(path.to_owned())
    }
}

impl From<PathBuf> for Address {
    fn from(path: PathBuf) -> Self {
        Address::Path(path)
    }
}

impl From<&PathBuf> for Address {
    fn from(path: &PathBuf) -> Self {
        Address::Path(path.clone())
    }
}

impl From<RemoteRef> for Address {
    fn from(object: RemoteRef) -> Self {
        Address::Object(object)
    }
}

impl From<&RemoteRef> for Address {
    fn from(object: &RemoteRef) -> Self {
        Address::Object(object.clone())
    }
}

impl From<&Address> for Address {
    fn from(address: &Address) -> Self {
        address.clone()
    }
}

/// An object (or, with a trailing `/`, a prefix) inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRef {
    pub bucket: String,
    pub name: String,
    /// When set, writes to this object only succeed if the stored generation matches.
    pub generation: Option<i64>,
}

impl RemoteRef {
    pub fn new<S1: AsRef<str>, S2: AsRef<str>>(bucket: S1, name: S2) -> RemoteRef {
        RemoteRef {
            bucket: bucket.as_ref().into(),
            name: name.as_ref().into(),
            generation: None,
        }
    }

    pub fn with_generation(mut self, generation: i64) -> RemoteRef {
        self.generation = Some(generation);
        self
    }

    pub fn uri(&self) -> String {
        format!("{}://{}/{}", uri::REMOTE_SCHEME, self.bucket, self.name)
    }

    /// Object names ending in `/` stand for directories, as does the bucket root.
    pub fn is_dir_marker(&self) -> bool {
        self.name.is_empty() || self.name.ends_with('/')
    }

    pub fn basename(&self) -> Result<&str> {
        match uri::basename(&self.name) {
            "" => Err(Error::CouldNotParseFilename(self.uri())),
            name => Ok(name),
        }
    }

    pub fn join(&self, name: &str) -> RemoteRef {
        RemoteRef::new(&self.bucket, uri::join_str(&self.name, name))
    }

    /// The listing prefix for everything under this object when treated as a directory.
    pub fn dir_prefix(&self) -> String {
        if self.is_dir_marker() {
            self.name.clone()
        } else {
            format!("{}/", self.name)
        }
    }
}

impl Display for RemoteRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri())
    }
}

/// An address after classification: a concrete local path or a remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local { path: PathBuf },
    Remote(RemoteRef),
}

impl Location {
    pub fn domain(&self) -> Domain {
        match self {
            Location::Local { .. } => Domain::Local,
            Location::Remote(_) => Domain::Remote,
        }
    }
}

/// An entry produced by listing a bucket under a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub bucket: String,
    pub name: String,
    pub size: Option<u64>,
    pub generation: Option<i64>,
}

impl ObjectDescriptor {
    pub fn object_ref(&self) -> RemoteRef {
        RemoteRef::new(&self.bucket, &self.name)
    }
}

/// One source to destination copy owned by a worker of the fan-out engine.
///
/// Tasks always run quiet: the engine logs each completion with its `[n/N]` position.
#[derive(Debug, Clone)]
pub struct TransferTask {
    pub source: Address,
    pub destination: Address,
}

impl TransferTask {
    pub fn new(source: impl Into<Address>, destination: impl Into<Address>) -> TransferTask {
        TransferTask {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// The outcome of a [TransferTask], reported in completion order.
#[derive(Debug)]
pub struct TransferResult {
    pub source: Address,
    pub outcome: Result<()>,
}
