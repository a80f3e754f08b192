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

//! Classification and normalization of addresses.
//!
//! An address is local when it is a structured path, a string without a scheme or a
//! `file:` URI, and remote when it is a [RemoteRef] or a `gs://` URI.  Any other scheme is
//! rejected.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::errors::{Error, Result};
use crate::types::{Address, Domain, Location, RemoteRef};

pub const REMOTE_SCHEME: &str = "gs";
pub const LOCAL_SCHEME: &str = "file";

static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*):").expect("valid regex"));

static NON_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-zA-Z_.\-]+").expect("valid regex"));

/// The lowercased scheme of `s`, if it has one.
pub fn scheme(s: &str) -> Option<String> {
    SCHEME
        .captures(s)
        .and_then(|caps| caps.name("scheme"))
        .map(|m| m.as_str().to_ascii_lowercase())
}

pub fn classify(address: &Address) -> Result<Domain> {
    match address {
        Address::Path(_) => Ok(Domain::Local),
        Address::Object(_) => Ok(Domain::Remote),
        Address::Uri(s) => match scheme(s).as_deref() {
            None | Some(LOCAL_SCHEME) => Ok(Domain::Local),
            Some(REMOTE_SCHEME) => Ok(Domain::Remote),
            Some(_) => Err(Error::InvalidAddress(s.clone())),
        },
    }
}

/// Classifies `address` and parses it into a concrete path or object reference.
pub fn resolve(address: &Address) -> Result<Location> {
    match address {
        Address::Path(path) => Ok(Location::Local { path: path.clone() }),
        Address::Object(object) => Ok(Location::Remote(object.clone())),
        Address::Uri(s) => match classify(address)? {
            Domain::Remote => parse_remote(s).map(Location::Remote),
            Domain::Local => Ok(Location::Local {
                path: local_path_from_str(s),
            }),
        },
    }
}

/// Parses `gs://bucket/name`.  The name is everything after the first `/` following the
/// bucket, and may be empty.
pub fn parse_remote(s: &str) -> Result<RemoteRef> {
    let rest = match (scheme(s).as_deref(), s.split_once("://")) {
        (Some(REMOTE_SCHEME), Some((_, rest))) => rest,
        _ => return Err(Error::InvalidAddress(s.to_owned())),
    };
    let (bucket, name) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() {
        return Err(Error::InvalidAddress(s.to_owned()));
    }
    Ok(RemoteRef::new(bucket, name))
}

fn local_path_from_str(s: &str) -> PathBuf {
    match scheme(s).as_deref() {
        Some(LOCAL_SCHEME) => PathBuf::from(file_uri_path(s)),
        _ => PathBuf::from(s),
    }
}

/// The decoded path component of a `file:` URI.  Any authority, query or fragment is
/// dropped, `+` decodes to a space and `%XX` sequences are decoded.
fn file_uri_path(s: &str) -> String {
    let rest = &s[LOCAL_SCHEME.len() + 1..];
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let path = match rest.strip_prefix("//") {
        Some(authority_and_path) => authority_and_path
            .find('/')
            .map(|idx| &authority_and_path[idx..])
            .unwrap_or_default(),
        None => rest,
    };
    percent_decode_str(&path.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Renders a local path as a `file:` URI with the path text left untouched.
fn local_uri(path: &str) -> String {
    if path.starts_with('/') {
        format!("{}://{}", LOCAL_SCHEME, path)
    } else {
        format!("{}:{}", LOCAL_SCHEME, path)
    }
}

/// The `file:` URI of a filesystem path.
pub fn path_uri(path: &Path) -> String {
    local_uri(&path.to_string_lossy())
}

/// Canonical string form of an address: `gs://bucket/name` for remote addresses and a
/// `file:` URI for local ones.
pub fn to_uri_string(address: &Address) -> Result<String> {
    match address {
        Address::Path(path) => Ok(path_uri(path)),
        Address::Object(object) => Ok(object.uri()),
        Address::Uri(s) => match scheme(s).as_deref() {
            None => Ok(local_uri(s)),
            Some(LOCAL_SCHEME) => Ok(s.clone()),
            Some(REMOTE_SCHEME) => Ok(parse_remote(s)?.uri()),
            Some(_) => Err(Error::InvalidAddress(s.clone())),
        },
    }
}

/// The filesystem path of a local address.
///
/// Only `file:` URIs are percent and plus decoded.  Bare strings and structured paths are
/// returned exactly as given.
pub fn to_local_path(address: &Address) -> Result<PathBuf> {
    match resolve(address)? {
        Location::Local { path } => Ok(path),
        Location::Remote(_) => Err(Error::InvalidAddress(address.to_string())),
    }
}

/// Collapses an address to a single filesystem and object-name safe component, used to
/// name files when a batch copies into one directory.
///
/// Every run of characters outside `[0-9a-zA-Z_.-]` becomes `-`, then leading and trailing
/// `-` are stripped.  `gs://bkt/a/b.txt` flattens to `gs-bkt-a-b.txt`.
pub fn flatten(address: &Address) -> Result<String> {
    let text = match address {
        Address::Path(path) => path.to_string_lossy().into_owned(),
        Address::Uri(s) => s.clone(),
        Address::Object(object) => object.uri(),
    };
    let flat = NON_NAME_CHARS.replace_all(&text, "-");
    let flat = flat.trim_matches('-');
    if flat.is_empty() {
        return Err(Error::EmptyFlattenedName(text));
    }
    Ok(flat.to_owned())
}

/// The final `/` separated component of `s`, empty when `s` ends with `/`.
pub fn basename(s: &str) -> &str {
    s.rsplit('/').next().unwrap_or(s)
}

pub(crate) fn join_str(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_owned()
    } else if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}
