//! Dataset loading.
//!
//! A [`Dataset`] holds the monitored collection (S sites × I instances,
//! row `site * I + instance`) and the unmonitored collection (O sites, one
//! sample each). Global index `i` addresses the monitored collection for
//! `i < S·I` and the unmonitored collection beyond.
//!
//! File layout under a work-unit directory:
//!
//! - monitored: `{site}-{instance}.feat` for `site` in `offset+1 ..= offset+S`
//! - unmonitored: `{site}.feat` or `{site}-{instance}.feat` for any other site

use crate::config::{ExperimentConfig, FEATURE_SUFFIX};
use crate::error::{Result, WfError};
use crate::vector::FeatureVector;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Class label: `0..S` is a monitored site, `S` is the unmonitored class.
pub type ClassLabel = usize;

/// Immutable feature matrices for one work unit.
#[derive(Clone, Debug)]
pub struct Dataset {
    sites: usize,
    instances: usize,
    monitored: Vec<FeatureVector>,
    unmonitored: Vec<FeatureVector>,
}

impl Dataset {
    /// Assemble a dataset from already-parsed vectors.
    ///
    /// `monitored` must hold `sites * instances` rows in site-major order.
    pub fn from_parts(
        sites: usize,
        instances: usize,
        monitored: Vec<FeatureVector>,
        unmonitored: Vec<FeatureVector>,
    ) -> Result<Self> {
        if monitored.len() != sites * instances {
            return Err(WfError::InvalidConfig(format!(
                "expected {} monitored vectors, got {}",
                sites * instances,
                monitored.len()
            )));
        }
        let dims = monitored.first().map(|v| v.dimensions());
        if let Some(dims) = dims {
            if let Some(bad) = monitored
                .iter()
                .chain(unmonitored.iter())
                .find(|v| v.dimensions() != dims)
            {
                return Err(WfError::InvalidConfig(format!(
                    "inconsistent feature count: {} vs {}",
                    dims,
                    bad.dimensions()
                )));
            }
        }

        Ok(Self {
            sites,
            instances,
            monitored,
            unmonitored,
        })
    }

    /// Read the monitored and unmonitored collections from `root`.
    pub fn load(root: &Path, config: &ExperimentConfig) -> Result<Self> {
        let mut taken = BTreeSet::new();
        let mut monitored = Vec::with_capacity(config.monitored_len());

        for s in 0..config.sites {
            let site = config.offset + s + 1;
            for instance in 0..config.instances {
                let path = root.join(format!("{}-{}{}", site, instance, FEATURE_SUFFIX));
                monitored.push(FeatureVector::read(&path, config.feature_count)?);
            }
            taken.insert(site);
        }

        let candidates = unmonitored_candidates(root)?;
        let mut unmonitored = Vec::with_capacity(config.open);
        for (site, path) in candidates {
            if unmonitored.len() >= config.open {
                break;
            }
            if taken.insert(site) {
                debug!("unmonitored site {} from {}", site, path.display());
                unmonitored.push(FeatureVector::read(&path, config.feature_count)?);
            }
        }

        if unmonitored.len() < config.open {
            return Err(WfError::InsufficientUnmonitored {
                wanted: config.open,
                found: unmonitored.len(),
            });
        }

        info!(
            "read {} sites with {} instances (in total {}), {} unmonitored sites",
            config.sites,
            config.instances,
            monitored.len(),
            unmonitored.len()
        );

        Self::from_parts(config.sites, config.instances, monitored, unmonitored)
    }

    pub fn sites(&self) -> usize {
        self.sites
    }

    pub fn instances(&self) -> usize {
        self.instances
    }

    pub fn monitored(&self) -> &[FeatureVector] {
        &self.monitored
    }

    pub fn unmonitored(&self) -> &[FeatureVector] {
        &self.unmonitored
    }

    /// Size of the monitored collection.
    pub fn monitored_len(&self) -> usize {
        self.monitored.len()
    }

    /// Size of the global index space.
    pub fn len(&self) -> usize {
        self.monitored.len() + self.unmonitored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Feature count shared by every vector.
    pub fn dimensions(&self) -> usize {
        self.monitored.first().map(|v| v.dimensions()).unwrap_or(0)
    }

    /// Vector at global index `i`.
    pub fn get(&self, i: usize) -> &FeatureVector {
        if i < self.monitored.len() {
            &self.monitored[i]
        } else {
            &self.unmonitored[i - self.monitored.len()]
        }
    }

    /// Class label of global index `i`.
    pub fn label(&self, i: usize) -> ClassLabel {
        if i < self.monitored.len() {
            i / self.instances
        } else {
            self.sites
        }
    }

    /// The label used for every unmonitored instance.
    pub fn unmonitored_label(&self) -> ClassLabel {
        self.sites
    }
}

/// Feature files with a numeric site prefix, sorted by file name.
fn unmonitored_candidates(root: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let entries = std::fs::read_dir(root).map_err(|e| WfError::io(root, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| WfError::io(root, e))?;
        let file_type = entry.file_type().map_err(|e| WfError::io(entry.path(), e))?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        match site_of(&name) {
            Some(site) => files.push((name, site, entry.path())),
            None if name.ends_with(FEATURE_SUFFIX) => {
                warn!("skipping {}: no numeric site prefix", entry.path().display())
            }
            None => {}
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(files
        .into_iter()
        .map(|(_, site, path)| (site, path))
        .collect())
}

/// Site number encoded in a feature file name.
fn site_of(name: &str) -> Option<usize> {
    let stem = name.strip_suffix(FEATURE_SUFFIX)?;
    let site = stem.split_once('-').map(|(s, _)| s).unwrap_or(stem);
    site.parse().ok()
}

/// Work units under `data_dir`: each sub-directory by sorted name, or the
/// directory itself when it has none. Returns `(name, path)` pairs.
pub fn discover_work_units(data_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(data_dir).map_err(|e| WfError::io(data_dir, e))?;

    let mut units = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| WfError::io(data_dir, e))?;
        let file_type = entry.file_type().map_err(|e| WfError::io(entry.path(), e))?;
        if file_type.is_dir() {
            units.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }

    if units.is_empty() {
        units.push((data_dir.display().to_string(), data_dir.to_path_buf()));
    }
    units.sort_by(|a, b| a.0.cmp(&b.0));

    info!("found {} folder(s) with work", units.len());
    Ok(units)
}
