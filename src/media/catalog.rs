//! Media catalog module
//!
//! Indexes the media directory and an optional TOML manifest into an immutable
//! id -> entry map. Reloads build a new catalog; readers keep the old one until
//! they drop it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::{MediaError, Result};
use crate::http::mime::{self, MediaKind};
use crate::logger;

/// One addressable media object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaEntry {
    pub id: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub original_name: String,
    pub content_type: String,
    pub media_kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Preview image inside the media directory
    #[serde(rename = "has_thumbnail", serialize_with = "serialize_present")]
    pub thumbnail: Option<PathBuf>,
}

fn serialize_present<S: serde::Serializer>(
    value: &Option<PathBuf>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_bool(value.is_some())
}

impl MediaEntry {
    /// The entry's thumbnail, addressed like a media object of its own
    pub fn thumbnail_entry(&self) -> Result<Self> {
        let path = self
            .thumbnail
            .clone()
            .ok_or_else(|| MediaError::ThumbnailNotFound(self.id.clone()))?;
        let content_type =
            mime::get_content_type(path.extension().and_then(|e| e.to_str())).to_string();

        Ok(Self {
            id: self.id.clone(),
            original_name: path
                .file_name()
                .map_or_else(|| self.id.clone(), |n| n.to_string_lossy().into_owned()),
            media_kind: MediaKind::from_content_type(&content_type),
            content_type,
            category: None,
            thumbnail: None,
            path,
        })
    }
}

/// Auto-indexed thumbnails live at `<media_dir>/thumbnails/thumb_<file name>`
const THUMBNAIL_DIR: &str = "thumbnails";
const THUMBNAIL_PREFIX: &str = "thumb_";

/// Manifest file layout (`[[media]]` tables)
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    media: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    id: String,
    file: String,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    original_name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

/// Immutable snapshot of the media library
#[derive(Debug, Default)]
pub struct Catalog {
    root: PathBuf,
    entries: BTreeMap<String, MediaEntry>,
}

impl Catalog {
    /// Build the catalog from the storage configuration
    ///
    /// Creates the media directory when it does not exist yet. Manifest entries
    /// override auto-indexed files with the same id.
    pub fn load(storage: &StorageConfig) -> Result<Self> {
        let root = Path::new(&storage.media_dir);
        fs::create_dir_all(root)?;
        let root = root.canonicalize()?;

        let mut catalog = Self {
            root,
            entries: BTreeMap::new(),
        };

        if storage.auto_index {
            catalog.index_directory()?;
        }

        if let Some(manifest) = storage.manifest_file.as_deref() {
            catalog.apply_manifest(Path::new(manifest))?;
        }

        Ok(catalog)
    }

    /// Catalog over prebuilt entries
    #[cfg(test)]
    pub fn from_entries(entries: Vec<MediaEntry>) -> Self {
        Self {
            root: PathBuf::new(),
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    /// Media directory all entries live under
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by id
    pub fn get(&self, id: &str) -> Result<&MediaEntry> {
        validate_id(id)?;
        self.entries
            .get(id)
            .ok_or_else(|| MediaError::NotFound(id.to_string()))
    }

    /// Entries ordered by id
    pub fn entries(&self) -> impl Iterator<Item = &MediaEntry> {
        self.entries.values()
    }

    /// Index every allowed media file directly inside the media directory
    fn index_directory(&mut self) -> Result<()> {
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let path = dir_entry.path();
            let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !mime::is_media_extension(extension) {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                logger::log_warning(&format!(
                    "Skipping non UTF-8 media file name: {}",
                    path.display()
                ));
                continue;
            };

            if let Err(e) = validate_id(file_name) {
                logger::log_warning(&format!("Skipping media file: {e}"));
                continue;
            }

            let thumbnail = self
                .root
                .join(THUMBNAIL_DIR)
                .join(format!("{THUMBNAIL_PREFIX}{file_name}"));
            let content_type = mime::get_content_type(Some(extension)).to_string();
            let entry = MediaEntry {
                id: file_name.to_string(),
                original_name: file_name.to_string(),
                media_kind: MediaKind::from_content_type(&content_type),
                content_type,
                category: None,
                thumbnail: thumbnail.is_file().then_some(thumbnail),
                path,
            };
            self.entries.insert(entry.id.clone(), entry);
        }
        Ok(())
    }

    /// Merge manifest entries into the catalog
    fn apply_manifest(&mut self, manifest_path: &Path) -> Result<()> {
        let text = match fs::read_to_string(manifest_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                logger::log_warning(&format!(
                    "Catalog manifest not found: {}",
                    manifest_path.display()
                ));
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let manifest: Manifest = toml::from_str(&text)?;

        let mut applied = 0usize;
        for item in manifest.media {
            match self.manifest_entry(item) {
                Ok(entry) => {
                    self.entries.insert(entry.id.clone(), entry);
                    applied += 1;
                }
                Err(e) => logger::log_warning(&format!("Skipping manifest entry: {e}")),
            }
        }
        logger::log_info(&format!(
            "Applied {applied} manifest entries from {}",
            manifest_path.display()
        ));
        Ok(())
    }

    fn manifest_entry(&self, item: ManifestEntry) -> Result<MediaEntry> {
        validate_id(&item.id)?;

        let path = self.contained_path(&item.id, &item.file)?;
        let thumbnail = item
            .thumbnail
            .as_deref()
            .map(|file| self.contained_path(&item.id, file))
            .transpose()?;
        let content_type = item.content_type.unwrap_or_else(|| {
            mime::get_content_type(path.extension().and_then(|e| e.to_str())).to_string()
        });
        let original_name = item.original_name.unwrap_or_else(|| {
            path.file_name()
                .map_or_else(|| item.id.clone(), |n| n.to_string_lossy().into_owned())
        });

        Ok(MediaEntry {
            id: item.id,
            path,
            original_name,
            media_kind: MediaKind::from_content_type(&content_type),
            content_type,
            category: item.category,
            thumbnail,
        })
    }

    /// Join a manifest file onto the media directory, refusing anything that
    /// lands outside it either lexically or through symlinks
    fn contained_path(&self, id: &str, file: &str) -> Result<PathBuf> {
        let outside = || {
            MediaError::Catalog(format!(
                "file '{file}' of media '{id}' is outside the media directory"
            ))
        };

        let relative = Path::new(file);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(outside());
        }

        let path = self.root.join(relative);
        match path.canonicalize() {
            Ok(resolved) if !resolved.starts_with(&self.root) => Err(outside()),
            // Files that do not exist yet are checked again when opened
            _ => Ok(path),
        }
    }
}

/// Reject ids that could read as a path: empty, `.`, `..` or containing a separator
fn validate_id(id: &str) -> Result<()> {
    if matches!(id, "" | "." | "..") || id.contains(['/', '\\']) {
        return Err(MediaError::InvalidId(id.to_string()));
    }
    Ok(())
}
