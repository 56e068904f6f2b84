//! Remote entity model.
//!
//! Mirrors the JSON the GitHub contents API returns for each entry of a
//! directory listing. Only the fields this filesystem needs are kept.

use serde::Deserialize;

/// Kind of a remote entity, parsed from the contents API `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Regular file with downloadable content.
    File,
    /// Directory with listable children.
    Dir,
    /// Any other kind (symlink, submodule, kinds added later). Listed in
    /// directories but never turned into a usable node.
    #[serde(other)]
    Unsupported,
}

/// A named node in the remote tree.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntity {
    /// Final path segment, unique among siblings.
    pub name: String,
    /// Entity kind from the remote `type` tag.
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Content locator: fetches the raw bytes. Present for files, null for
    /// directories and submodules.
    pub download_url: Option<String>,
    /// Listing locator: the API endpoint enumerating this entity's children.
    pub url: String,
}

impl RemoteEntity {
    /// Returns true if this entity is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntityKind::Dir
    }

    /// Returns true if this entity is a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntityKind::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_file_entry() {
        let json = r#"{
            "name": "README.md",
            "type": "file",
            "download_url": "https://raw.githubusercontent.com/o/r/main/README.md",
            "url": "https://api.github.com/repos/o/r/contents/README.md"
        }"#;

        let entity: RemoteEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.name, "README.md");
        assert_eq!(entity.kind, EntityKind::File);
        assert!(entity.is_file());
        assert!(entity.download_url.is_some());
    }

    #[test]
    fn test_deserialize_dir_entry_null_download_url() {
        let json = r#"{
            "name": "src",
            "type": "dir",
            "download_url": null,
            "url": "https://api.github.com/repos/o/r/contents/src"
        }"#;

        let entity: RemoteEntity = serde_json::from_str(json).unwrap();
        assert!(entity.is_dir());
        assert!(entity.download_url.is_none());
    }

    #[test]
    fn test_deserialize_unrecognized_kinds() {
        for kind in ["symlink", "submodule", "something-new"] {
            let json = format!(
                r#"{{"name": "x", "type": "{kind}", "download_url": null, "url": "u"}}"#
            );
            let entity: RemoteEntity = serde_json::from_str(&json).unwrap();
            assert_eq!(entity.kind, EntityKind::Unsupported, "type {kind}");
            assert!(!entity.is_dir());
            assert!(!entity.is_file());
        }
    }

    #[test]
    fn test_deserialize_listing_array() {
        let json = r#"[
            {"name": "README.md", "type": "file", "download_url": "d", "url": "u1"},
            {"name": "src", "type": "dir", "download_url": null, "url": "u2"}
        ]"#;

        let entries: Vec<RemoteEntity> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "README.md");
        assert_eq!(entries[1].name, "src");
    }

    #[test]
    fn test_deserialize_missing_name_is_error() {
        let json = r#"{"type": "file", "download_url": "d", "url": "u"}"#;
        assert!(serde_json::from_str::<RemoteEntity>(json).is_err());
    }
}
