//! On-disk layout of downloaded version payloads.
//!
//! Each version's payload lives at a deterministic path keyed by its
//! identity pair: `{data_dir}/versions/{base_version_id}/{version}/`.
//! Alongside the patch payload sit two named auxiliary-asset files
//! (one per flow, default/patched), a packaged logic object and an
//! optional version-specific custom-logic package.

use std::path::PathBuf;

use super::entry::VersionEntry;

/// File name of the patch payload inside a version directory.
pub const PATCH_FILE: &str = "patch.bin";

/// Avatar binding asset applied when resetting to the default state.
pub const AVATAR_DEFAULT_FILE: &str = "avatar-default.asset";

/// Avatar binding asset applied when the patch is installed.
pub const AVATAR_PATCHED_FILE: &str = "avatar-patched.asset";

/// Packaged logic object instantiated into the asset hierarchy.
pub const LOGIC_PACKAGE_FILE: &str = "logic.pkg";

/// Optional version-specific custom-logic package.
pub const CUSTOM_LOGIC_FILE: &str = "custom-logic.pkg";

/// Deterministic path resolution for version payload storage.
#[derive(Debug, Clone)]
pub struct VersionLayout {
    data_dir: PathBuf,
}

impl VersionLayout {
    /// Create a layout rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root directory holding all version payloads.
    pub fn versions_dir(&self) -> PathBuf {
        self.data_dir.join("versions")
    }

    /// Storage directory for a specific version.
    pub fn version_dir(&self, version: &VersionEntry) -> PathBuf {
        self.versions_dir()
            .join(sanitize(&version.base_version_id))
            .join(sanitize(&version.version))
    }

    /// Path of the version's patch payload.
    pub fn patch_payload(&self, version: &VersionEntry) -> PathBuf {
        self.version_dir(version).join(PATCH_FILE)
    }

    /// Path of the avatar binding asset for the given flow.
    pub fn avatar_asset(&self, version: &VersionEntry, patched: bool) -> PathBuf {
        let name = if patched {
            AVATAR_PATCHED_FILE
        } else {
            AVATAR_DEFAULT_FILE
        };
        self.version_dir(version).join(name)
    }

    /// Path of the packaged logic object.
    pub fn logic_package(&self, version: &VersionEntry) -> PathBuf {
        self.version_dir(version).join(LOGIC_PACKAGE_FILE)
    }

    /// Path of the optional custom-logic package.
    pub fn custom_logic(&self, version: &VersionEntry) -> PathBuf {
        self.version_dir(version).join(CUSTOM_LOGIC_FILE)
    }

    /// Whether the version's patch payload is present locally.
    pub fn is_downloaded(&self, version: &VersionEntry) -> bool {
        self.patch_payload(version).is_file()
    }
}

/// Replace path-hostile characters in a server-supplied component.
///
/// Version strings and base ids come from the network and must never
/// navigate outside the versions directory.
pub(crate) fn sanitize(component: &str) -> String {
    let cleaned: String = component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();

    if cleaned == "." || cleaned == ".." || cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_dir_is_keyed_by_identity_pair() {
        let layout = VersionLayout::new("/data");
        let v = VersionEntry::new("1.2.0", "winter-04");

        assert_eq!(
            layout.version_dir(&v),
            PathBuf::from("/data/versions/winter-04/1.2.0")
        );
        assert_eq!(
            layout.patch_payload(&v),
            PathBuf::from("/data/versions/winter-04/1.2.0/patch.bin")
        );
    }

    #[test]
    fn test_avatar_asset_per_flow() {
        let layout = VersionLayout::new("/data");
        let v = VersionEntry::new("1.0.0", "b");

        assert!(layout
            .avatar_asset(&v, true)
            .ends_with("avatar-patched.asset"));
        assert!(layout
            .avatar_asset(&v, false)
            .ends_with("avatar-default.asset"));
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert_eq!(sanitize(".."), "_");
        assert_eq!(sanitize("."), "_");
        assert_eq!(sanitize(""), "_");
        assert_eq!(sanitize("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize("1.2.0"), "1.2.0");
    }

    #[test]
    fn test_hostile_version_stays_inside_versions_dir() {
        use std::path::Component;

        let layout = VersionLayout::new("/data");
        let v = VersionEntry::new("../../etc", "../root");

        // Separators are rewritten, so no component can walk upward
        // even though the literal dots survive inside a component.
        let dir = layout.version_dir(&v);
        assert!(dir.starts_with("/data/versions"));
        assert!(dir
            .components()
            .all(|c| !matches!(c, Component::ParentDir | Component::CurDir)));
    }

    #[test]
    fn test_is_downloaded_checks_payload_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let layout = VersionLayout::new(temp.path());
        let v = VersionEntry::new("1.0.0", "b");

        assert!(!layout.is_downloaded(&v));

        std::fs::create_dir_all(layout.version_dir(&v)).unwrap();
        std::fs::write(layout.patch_payload(&v), b"payload").unwrap();
        assert!(layout.is_downloaded(&v));
    }
}
