use crate::paths;
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type ConfigRef = Arc<OverlayConfig>;

/// What happens when a manager asks to be registered under an identifier that
/// another live manager already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Append the lowest free `-N` suffix.
    Suffix,
    /// Fail with `OverlayError::IdentifierInUse`.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// The path the config file was loaded from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Identifier used when a manager registers without suggesting one
    pub default_manager_id: String,
    /// How identifier collisions in the directory are resolved
    pub id_collision: CollisionPolicy,
    /// Drop association entries of renderers that have been released by their owner
    pub prune_dead_renderers: bool,
    /// Also run layouters that have no overlay bound to them
    pub invoke_idle_layouters: bool,
    /// Placement settings for the built-in layouters
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// The number of pixels between the viewport edge and the overlays
    pub margin: u32,
    /// The number of pixels between neighbouring overlays
    pub spacing: u32,
    /// Columns used by the grid layouter
    pub grid_columns: u32,
    /// Width of a single glyph used to size text overlays
    pub glyph_width: u32,
    /// Height of a line of text used to size text overlays
    pub glyph_height: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 8,
            spacing: 4,
            grid_columns: 3,
            glyph_width: 8,
            glyph_height: 16,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            default_manager_id: "0".to_owned(),
            id_collision: CollisionPolicy::Suffix,
            prune_dead_renderers: true,
            invoke_idle_layouters: false,
            layout: LayoutConfig::default(),
        }
    }
}

impl OverlayConfig {
    pub fn load(config_path: Option<&Path>, save: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => paths::default_config_path()
                .ok_or("Could not determine default config directory")?,
        };

        if !path.exists() {
            Self::create_default_config_file(&path)?;
            trace!("Created default config file at: {}", path.display());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let mut config = Self::from_yaml(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        config.config_path = Some(path.clone());

        // Write back so fields missing from the file show up with their defaults
        if save {
            if let Err(e) = config.save_to_file(&path) {
                warn!("Failed to update config file with missing fields: {e}");
            }
        }

        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to an empty map
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    fn create_default_config_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        Self::default().save_to_file(path)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let header = "# OverlayWM Configuration File\n# Overlay registry and layouter settings.\n\n";
        let serialized_config = serde_yaml::to_string(self)?;
        fs::write(path, format!("{}{}", header, serialized_config))?;
        Ok(())
    }

    pub fn into_ref(self) -> ConfigRef {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OverlayConfig::default();
        assert_eq!(config.default_manager_id, "0");
        assert_eq!(config.id_collision, CollisionPolicy::Suffix);
        assert!(config.prune_dead_renderers);
        assert!(!config.invoke_idle_layouters);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = OverlayConfig::from_yaml("id_collision: reject\nlayout:\n  margin: 2\n")
            .expect("valid yaml");
        assert_eq!(config.id_collision, CollisionPolicy::Reject);
        assert_eq!(config.layout.margin, 2);
        assert_eq!(config.layout.spacing, LayoutConfig::default().spacing);
        assert_eq!(config.default_manager_id, "0");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = OverlayConfig::from_yaml("  \n").expect("empty yaml");
        assert_eq!(config.layout.grid_columns, 3);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = std::env::temp_dir().join(format!("overlay-config-test-{}", std::process::id()));
        let path = dir.join("config.yaml");
        let _ = fs::remove_dir_all(&dir);

        let config = OverlayConfig::load(Some(&path), false).expect("load");
        assert!(path.exists());
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_rejects_invalid_yaml() {
        let dir =
            std::env::temp_dir().join(format!("overlay-config-invalid-{}", std::process::id()));
        let path = dir.join("config.yaml");
        fs::create_dir_all(&dir).unwrap();
        fs::write(&path, "layout: [not, a, map]\n").unwrap();

        assert!(OverlayConfig::load(Some(&path), false).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
