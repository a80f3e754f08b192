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

use crate::types::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Item,
    Tree,
}

/// How a copy is carried out, chosen from the shape of the copy and the domains of its
/// two ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    LocalCopy,
    Download,
    Upload,
    RemoteCopy,
    LocalTree,
    DownloadTree,
    UploadTree,
    RemoteTree,
}

impl Strategy {
    pub const fn select(shape: Shape, source: Domain, destination: Domain) -> Strategy {
        match (shape, source, destination) {
            (Shape::Item, Domain::Local, Domain::Local) => Strategy::LocalCopy,
            (Shape::Item, Domain::Remote, Domain::Local) => Strategy::Download,
            (Shape::Item, Domain::Local, Domain::Remote) => Strategy::Upload,
            (Shape::Item, Domain::Remote, Domain::Remote) => Strategy::RemoteCopy,
            (Shape::Tree, Domain::Local, Domain::Local) => Strategy::LocalTree,
            (Shape::Tree, Domain::Remote, Domain::Local) => Strategy::DownloadTree,
            (Shape::Tree, Domain::Local, Domain::Remote) => Strategy::UploadTree,
            (Shape::Tree, Domain::Remote, Domain::Remote) => Strategy::RemoteTree,
        }
    }

    /// Whether carrying out the strategy talks to the object store.
    pub const fn requires_client(self) -> bool {
        !matches!(self, Strategy::LocalCopy | Strategy::LocalTree)
    }
}
