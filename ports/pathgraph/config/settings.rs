/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! User settings, stored as `settings.toml` in the config directory.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::layout::{Layout, LayoutKind};
use crate::pathfinding::{HeuristicKind, PathFinder};
use crate::persistence::{DEFAULT_SNAPSHOT_INTERVAL_SECS, GraphStore};
use crate::render::raster::ImageSettings;

/// Workbench settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where saved graphs and the session journal live (default: `<config>/graphs`)
    pub data_dir: Option<PathBuf>,

    /// Where exported images go (default: `<config>/imgs`)
    pub image_dir: Option<PathBuf>,

    /// Layout used for drawing and for the distance estimate
    pub layout: LayoutKind,

    /// Estimate guiding the search (default: euclidean)
    pub heuristic: HeuristicKind,

    /// Abort a search after this many expansions
    pub max_expansions: Option<usize>,

    /// Seconds between automatic session snapshots
    pub snapshot_interval_secs: u64,

    pub image: ImageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            image_dir: None,
            layout: LayoutKind::default(),
            heuristic: HeuristicKind::default(),
            max_expansions: None,
            snapshot_interval_secs: DEFAULT_SNAPSHOT_INTERVAL_SECS,
            image: ImageSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults if it is missing or malformed
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };

        match toml::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed settings in {}: {e}", path.display());
                Self::default()
            },
        }
    }

    /// Load settings from `path`, writing the defaults there first if the file does not exist.
    ///
    /// A malformed file is left untouched.
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            return Self::load_from(path);
        }

        let settings = Self::default();
        match settings.save_to(path) {
            Ok(()) => info!("Wrote default settings to {}", path.display()),
            Err(e) => warn!("Could not write default settings to {}: {e}", path.display()),
        }
        settings
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(std::io::Error::other)?;

        std::fs::write(path, toml_string)
    }

    /// Get the path to the settings file
    pub fn config_path() -> PathBuf {
        super::config_dir().join("settings.toml")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(GraphStore::default_data_dir)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.image_dir
            .clone()
            .unwrap_or_else(|| super::config_dir().join("imgs"))
    }

    /// A path finder configured from these settings
    pub fn path_finder<'a>(&self, layout: &'a dyn Layout) -> PathFinder<'a> {
        let finder = PathFinder::new(layout).with_heuristic(self.heuristic);
        match self.max_expansions {
            Some(limit) => finder.with_max_expansions(limit),
            None => finder,
        }
    }
}
