/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Configuration for the path workbench.

pub mod settings;

pub use settings::Settings;

use std::path::PathBuf;

/// Per-user directory holding `settings.toml`, saved graphs and images.
///
/// Falls back to `./.pathgraph` when the platform reports no config directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("pathgraph"))
        .unwrap_or_else(|| PathBuf::from(".pathgraph"))
}
