// Copyright 2021 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Reads topology and policy documents off disk. Parsing the document
//! *shape* is delegated to `topology::document` / `policy::document`; this
//! module only resolves a path to bytes and picks a serde format by
//! extension. Launch-script discovery of *which* path to read is out of
//! this crate's scope — reading the path the launcher already resolved
//! is not.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Reads and parses a document from `path`. `.json` files are parsed as
/// JSON; anything else (`.yaml`, `.yml`, or no extension) is parsed as
/// YAML, since that's this format's more common on-disk shape.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::DocumentIo {
        path: path.display().to_string(),
        source: e.to_string(),
    })?;

    let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
    if is_json {
        serde_json::from_str(&contents).map_err(|e| Error::DocumentIo {
            path: path.display().to_string(),
            source: e.to_string(),
        })
    } else {
        serde_yaml::from_str(&contents).map_err(|e| Error::DocumentIo {
            path: path.display().to_string(),
            source: e.to_string(),
        })
    }
}
