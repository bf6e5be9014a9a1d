//! Asset file reachability checks.

use std::fmt::{self, Display, Formatter};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

/// Outcome of a single asset check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// Regular, readable, non-empty file.
    Ok,
    /// Path does not exist or is not a regular file.
    Missing,
    /// Path exists but cannot be opened for reading.
    Unreadable,
    /// Readable regular file with zero length. Counts as usable.
    EmptyWarning,
}

impl AssetStatus {
    /// Returns `true` when the sensor may use the asset.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        matches!(self, Self::Ok | Self::EmptyWarning)
    }
}

impl Display for AssetStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Missing => "missing",
            Self::Unreadable => "unreadable",
            Self::EmptyWarning => "empty",
        })
    }
}

/// Read-only probe for asset files.
pub trait AssetProbe: Send + Sync {
    /// Inspects `path` without modifying it.
    fn check(&self, path: &Path) -> AssetStatus;
}

/// Probe backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAssetChecker;

impl AssetProbe for FsAssetChecker {
    fn check(&self, path: &Path) -> AssetStatus {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return AssetStatus::Missing,
            Err(_) => return AssetStatus::Unreadable,
        };

        if !metadata.is_file() {
            return AssetStatus::Missing;
        }

        match File::open(path) {
            Ok(_) if metadata.len() == 0 => AssetStatus::EmptyWarning,
            Ok(_) => AssetStatus::Ok,
            Err(err) if err.kind() == ErrorKind::NotFound => AssetStatus::Missing,
            Err(_) => AssetStatus::Unreadable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use uuid::Uuid;

    fn temp_path(suffix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("robot-asset-{}.{suffix}", Uuid::new_v4()))
    }

    #[test]
    fn regular_file_is_ok() {
        let path = temp_path("bin");
        fs::write(&path, [0xff, 0x00, 0x0f]).unwrap();

        assert_eq!(FsAssetChecker.check(&path), AssetStatus::Ok);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_file_is_a_usable_warning() {
        let path = temp_path("bin");
        fs::write(&path, b"").unwrap();

        let status = FsAssetChecker.check(&path);
        assert_eq!(status, AssetStatus::EmptyWarning);
        assert!(status.is_usable());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn absent_path_and_directories_are_missing() {
        assert_eq!(FsAssetChecker.check(&temp_path("nope")), AssetStatus::Missing);
        assert_eq!(
            FsAssetChecker.check(&std::env::temp_dir()),
            AssetStatus::Missing
        );
        assert!(!AssetStatus::Missing.is_usable());
    }

    #[test]
    fn path_below_a_regular_file_is_unreadable() {
        let parent = temp_path("bin");
        fs::write(&parent, b"not a directory").unwrap();

        let status = FsAssetChecker.check(&parent.join("mask.bin"));
        assert_eq!(status, AssetStatus::Unreadable);
        assert!(!status.is_usable());

        let _ = fs::remove_file(parent);
    }
}
