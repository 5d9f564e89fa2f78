//! Loading pipeline: finds data files, deserializes them and resolves
//! structure names into a colony configuration and catalogue.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers used by [`load_colony_data`].

use crate::schema::{ColonyConfigData, StructureData};
use outpost_core::catalogue::{Catalogue, CatalogueError, builtin_spec};
use outpost_core::config::ColonyConfig;
use outpost_core::structure::StructureTypeId;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Base name of the colony settings file.
pub const COLONY_FILE: &str = "colony";
/// Base name of the structure override file.
pub const STRUCTURES_FILE: &str = "structures";

// ===========================================================================
// Errors
// ===========================================================================

/// Why a data directory could not be turned into colony data.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The data directory does not exist.
    #[error("data directory {dir} not found")]
    MissingDirectory { dir: PathBuf },

    /// Not a `.ron`, `.toml` or `.json` file.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// The same data file exists in more than one format.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// The file could not be deserialized.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A structure type name that does not exist.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// The same structure is overridden twice.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// An override produced a blueprint the catalogue refuses.
    #[error("invalid blueprint in {file}: {source}")]
    Blueprint {
        file: PathBuf,
        #[source]
        source: CatalogueError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// File format, chosen by extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Find `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// At most one of them may exist; a second is a `ConflictingFormats` error.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read and deserialize one data file.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Read a list of entries. RON and JSON files hold the list itself; TOML
/// files hold it as an array of tables under `toml_key`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Name resolution
// ===========================================================================

/// Resolve a structure type name, returning an `UnresolvedRef` error if unknown.
pub fn resolve_structure(name: &str, file: &Path) -> Result<StructureTypeId, DataLoadError> {
    StructureTypeId::from_name(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind: "structure type",
    })
}

/// Fail with `DuplicateName` if `name` was already seen.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Everything a colony needs from its data directory.
#[derive(Debug, Clone, Default)]
pub struct ColonyData {
    pub config: ColonyConfig,
    pub catalogue: Catalogue,
}

/// Load `colony.*` and `structures.*` from `dir`.
///
/// Both files are optional. Without them the defaults and the built-in
/// catalogue are returned unchanged.
pub fn load_colony_data(dir: &Path) -> Result<ColonyData, DataLoadError> {
    if !dir.is_dir() {
        return Err(DataLoadError::MissingDirectory {
            dir: dir.to_path_buf(),
        });
    }

    let mut data = ColonyData::default();

    if let Some(path) = find_data_file(dir, COLONY_FILE)? {
        let settings: ColonyConfigData = deserialize_file(&path)?;
        settings.apply(&mut data.config);
        info!(file = %path.display(), "Loaded colony settings");
    }

    if let Some(path) = find_data_file(dir, STRUCTURES_FILE)? {
        let overrides: Vec<StructureData> = deserialize_list(&path, "structures")?;
        data.catalogue = build_catalogue(&overrides, &path)?;
        info!(
            file = %path.display(),
            overrides = overrides.len(),
            "Loaded structure overrides"
        );
    }

    Ok(data)
}

/// Apply every override over the built-in blueprints.
pub fn build_catalogue(
    overrides: &[StructureData],
    file: &Path,
) -> Result<Catalogue, DataLoadError> {
    let mut catalogue = Catalogue::new();
    let mut seen: HashMap<String, StructureTypeId> = HashMap::new();

    for data in overrides {
        check_duplicate(&seen, &data.name, file)?;
        let type_id = resolve_structure(&data.name, file)?;
        let spec = data.apply(builtin_spec(type_id));
        catalogue
            .set_spec(type_id, spec)
            .map_err(|source| DataLoadError::Blueprint {
                file: file.to_path_buf(),
                source,
            })?;
        debug!(structure = %type_id, "Blueprint overridden");
        seen.insert(data.name.clone(), type_id);
    }

    Ok(catalogue)
}

// ===========================================================================
// Tests
// ===========================================================================
