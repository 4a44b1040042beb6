/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Graph visualization.
//!
//! - `text`: adjacency listing for the terminal, with the last path marked
//! - `raster`: PNG export with the path drawn in red

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::graph::NodeId;
use crate::util::is_valid_name;

pub mod raster;
pub mod text;

/// Errors from drawing or writing images
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("node {0} has no layout position")]
    MissingPosition(NodeId),

    #[error("invalid image name {0:?}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// File an image called `name` is written to inside `dir`
pub fn image_path(dir: &Path, name: &str) -> Result<PathBuf, RenderError> {
    let name = name.trim();
    if !is_valid_name(name) {
        return Err(RenderError::InvalidName(name.to_string()));
    }
    Ok(dir.join(format!("{name}.png")))
}
