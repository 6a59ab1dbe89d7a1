// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walk up from `path` looking for `filename`
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    path.ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.exists())
}

/// Pick the config file: an explicit cli path (relative to `cwd`), else the
/// nearest `default_filename` above `cwd`, else the one in `default_config_dir`.
pub fn resolve_config_path<P: Into<PathBuf>>(
    find_in_parent: FindInParent,
    cwd: P,
    default_config_dir: P,
    default_filename: &str,
    cli_file: Option<P>,
) -> PathBuf {
    let cwd = cwd.into();

    if let Some(cli_file) = cli_file.map(Into::into) {
        if cli_file.is_absolute() {
            return cli_file;
        }
        return clean(cwd.join(cli_file));
    }

    find_in_parent(&cwd, default_filename)
        .unwrap_or_else(|| clean(default_config_dir.into().join(default_filename)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;

    fn not_found(_: &Path, _: &str) -> Option<PathBuf> {
        None
    }

    fn found(_: &Path, _: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/game/purechance.config.yaml"))
    }

    #[test]
    fn test_resolve_cli() {
        let path = resolve_config_path(
            not_found,
            PathBuf::from("/game/play"),
            PathBuf::from("/home/me/.config/purechance"),
            "purechance.config.yaml",
            None,
        );
        assert_eq!(
            path,
            PathBuf::from("/home/me/.config/purechance/purechance.config.yaml")
        );

        let path = resolve_config_path(
            found,
            PathBuf::from("/game/play"),
            PathBuf::from("/home/me/.config/purechance"),
            "purechance.config.yaml",
            Some(PathBuf::from("/etc/purechance.yaml")),
        );
        assert_eq!(path, PathBuf::from("/etc/purechance.yaml"));

        let path = resolve_config_path(
            found,
            PathBuf::from("/game/play"),
            PathBuf::from("/home/me/.config/purechance"),
            "purechance.config.yaml",
            Some(PathBuf::from("../conf/./local.yaml")),
        );
        assert_eq!(path, PathBuf::from("/game/conf/local.yaml"));

        let path = resolve_config_path(
            found,
            PathBuf::from("/game/play"),
            PathBuf::from("/home/me/.config/purechance"),
            "purechance.config.yaml",
            None,
        );
        assert_eq!(path, PathBuf::from("/game/purechance.config.yaml"));
    }

    #[test]
    fn test_find_in_parent() -> Result<()> {
        let root = tempfile::tempdir()?;
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested)?;
        fs::write(root.path().join("purechance.config.yaml"), "")?;

        assert_eq!(
            find_in_parent(&nested, "purechance.config.yaml"),
            Some(root.path().join("purechance.config.yaml"))
        );
        assert_eq!(find_in_parent(&nested, "missing.yaml"), None);
        Ok(())
    }
}
