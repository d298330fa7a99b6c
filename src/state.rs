use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use declarative::{Address, State};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Format version written by this build
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Everything tursoform knows about the instances it manages
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StateFile {
    pub version: u32,

    /// Incremented on every save
    pub serial: u64,

    /// Last time the state was saved
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub resources: BTreeMap<Address, ResourceEntry>,
}

/// One managed instance
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: State,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            serial: 0,
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Load state from disk, or start empty if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            bail!(
                "State file {} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!(
            "Loaded state from {} (serial {}, {} resources)",
            path.display(),
            state.serial,
            state.resources.len()
        );
        Ok(state)
    }

    /// Save state to disk
    ///
    /// Writes a sibling temp file and renames it over the target, so readers
    /// never observe a half-written file.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.serial += 1;
        self.last_updated = Utc::now();
        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content + "\n")
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        log::debug!("Saved state to {} (serial {})", path.display(), self.serial);
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&State> {
        self.resources.get(address).map(|e| &e.attributes)
    }

    /// Record the state of an instance
    pub fn insert(&mut self, address: Address, attributes: State) {
        let resource_type = address.resource_type.clone();
        self.resources.insert(
            address,
            ResourceEntry {
                resource_type,
                attributes,
            },
        );
    }

    /// Forget an instance
    pub fn remove(&mut self, address: &Address) -> Option<ResourceEntry> {
        self.resources.remove(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.resources.contains_key(address)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.resources.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
