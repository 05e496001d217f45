//! Where the files come from.
//!
//! The serving directory is picked once, before the listener is bound, by
//! one of two [`DirectoryStrategy`] implementations:
//!
//! - [`ScriptRelative`]: the directory holding the running executable, so a
//!   binary dropped next to the site serves it no matter where it is
//!   started from.
//! - [`CwdWithFallback`]: the working directory, or the home directory when
//!   the working directory can not be listed.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use crate::error::ServerError;

pub trait DirectoryStrategy {
    fn resolve(&self) -> Result<ServingDirectory, ServerError>;

    /// Request-line prefix this deployment keeps out of the access log
    fn quiet_prefix(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServingDirectory {
    path: PathBuf,
    warning: Option<String>,
    change_working_dir: bool,
}

impl ServingDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ServingDirectory {
            path: path.into(),
            warning: None,
            change_working_dir: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set when resolution had to fall back to another directory
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn changes_working_dir(&self) -> bool {
        self.change_working_dir
    }

    /// Check the directory is usable and enter it if the strategy asks to
    pub fn prepare(&self) -> Result<(), ServerError> {
        let metadata = fs::metadata(&self.path).map_err(|source| self.error(source))?;
        if !metadata.is_dir() {
            return Err(self.error(io::ErrorKind::NotADirectory.into()));
        }

        if self.change_working_dir {
            env::set_current_dir(&self.path).map_err(|source| self.error(source))?;
        }
        Ok(())
    }

    fn error(&self, source: io::Error) -> ServerError {
        ServerError::Directory {
            path: self.path.clone(),
            source,
        }
    }
}

/// Serve the directory containing the running executable
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptRelative;

impl ScriptRelative {
    pub const QUIET_PREFIX: &'static str = "GET /lib/";

    /// Parent of `exe`, or the absolute current directory when unknown
    pub fn locate(exe: io::Result<PathBuf>) -> PathBuf {
        exe.ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::absolute(".").unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl DirectoryStrategy for ScriptRelative {
    fn resolve(&self) -> Result<ServingDirectory, ServerError> {
        Ok(ServingDirectory::new(Self::locate(env::current_exe())))
    }

    fn quiet_prefix(&self) -> &'static str {
        Self::QUIET_PREFIX
    }
}

/// Serve the working directory, or home when it is not listable
#[derive(Debug, Default, Clone, Copy)]
pub struct CwdWithFallback;

impl CwdWithFallback {
    pub const QUIET_PREFIX: &'static str = "GET /";

    /// Resolution with the environment passed in
    ///
    /// `list` probes the candidate directory; a permission error from it
    /// (or from `cwd`) selects `home`. Any other error is returned.
    pub fn resolve_with<L, H>(
        cwd: io::Result<PathBuf>,
        list: L,
        home: H,
    ) -> Result<ServingDirectory, ServerError>
    where
        L: FnOnce(&Path) -> io::Result<()>,
        H: FnOnce() -> Option<PathBuf>,
    {
        match cwd.and_then(|dir| list(&dir).map(|()| dir)) {
            Ok(path) => Ok(ServingDirectory {
                path,
                warning: None,
                change_working_dir: true,
            }),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                let home = home().ok_or(ServerError::NoHomeDirectory)?;
                Ok(ServingDirectory {
                    warning: Some(format!(
                        "Permission denied for the current directory, serving {} instead",
                        home.display()
                    )),
                    path: home,
                    change_working_dir: true,
                })
            }
            Err(source) => Err(ServerError::Directory {
                path: PathBuf::from("."),
                source,
            }),
        }
    }
}

impl DirectoryStrategy for CwdWithFallback {
    fn resolve(&self) -> Result<ServingDirectory, ServerError> {
        Self::resolve_with(
            env::current_dir(),
            |dir| fs::read_dir(dir).map(|_| ()),
            dirs::home_dir,
        )
    }

    fn quiet_prefix(&self) -> &'static str {
        Self::QUIET_PREFIX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denied(_: &Path) -> io::Result<()> {
        Err(io::ErrorKind::PermissionDenied.into())
    }

    #[test]
    fn test_script_relative_is_exe_dir() {
        let resolved = ScriptRelative.resolve().unwrap();
        let exe = env::current_exe().unwrap();

        assert_eq!(resolved.path(), exe.parent().unwrap());
        assert!(resolved.warning().is_none());
        assert!(!resolved.changes_working_dir());
    }

    #[test]
    fn test_script_relative_unknown_exe() {
        let located = ScriptRelative::locate(Err(io::ErrorKind::NotFound.into()));
        assert!(located.is_absolute() || located == Path::new("."));

        let bare = ScriptRelative::locate(Ok(PathBuf::from("coi-serve")));
        assert!(bare.is_absolute() || bare == Path::new("."));
    }

    #[test]
    fn test_cwd_listable() {
        let resolved = CwdWithFallback::resolve_with(
            Ok(PathBuf::from("/srv/site")),
            |_| Ok(()),
            || panic!("home must not be consulted"),
        )
        .unwrap();

        assert_eq!(resolved.path(), Path::new("/srv/site"));
        assert!(resolved.warning().is_none());
        assert!(resolved.changes_working_dir());
    }

    #[test]
    fn test_cwd_denied_falls_back_home() {
        let resolved = CwdWithFallback::resolve_with(
            Ok(PathBuf::from("/private/var/locked")),
            denied,
            || Some(PathBuf::from("/home/dev")),
        )
        .unwrap();

        assert_eq!(resolved.path(), Path::new("/home/dev"));
        assert!(resolved.warning().unwrap().contains("/home/dev"));
        assert!(resolved.changes_working_dir());
    }

    #[test]
    fn test_cwd_unresolvable_denied_falls_back_home() {
        let resolved = CwdWithFallback::resolve_with(
            Err(io::ErrorKind::PermissionDenied.into()),
            |_| panic!("nothing to list"),
            || Some(PathBuf::from("/home/dev")),
        )
        .unwrap();

        assert_eq!(resolved.path(), Path::new("/home/dev"));
    }

    #[test]
    fn test_cwd_denied_without_home() {
        let err = CwdWithFallback::resolve_with(Ok(PathBuf::from("/x")), denied, || None)
            .unwrap_err();
        assert!(matches!(err, ServerError::NoHomeDirectory));
    }

    #[test]
    fn test_cwd_other_error_is_fatal() {
        let err = CwdWithFallback::resolve_with(
            Err(io::ErrorKind::NotFound.into()),
            |_| Ok(()),
            || Some(PathBuf::from("/home/dev")),
        )
        .unwrap_err();
        assert!(matches!(err, ServerError::Directory { .. }));
    }

    #[test]
    fn test_quiet_prefixes() {
        assert_eq!(ScriptRelative.quiet_prefix(), "GET /lib/");
        assert_eq!(CwdWithFallback.quiet_prefix(), "GET /");
    }

    #[test]
    fn test_prepare_rejects_missing_and_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ServingDirectory::new(dir.path()).prepare().is_ok());

        let missing = ServingDirectory::new(dir.path().join("gone"));
        assert!(matches!(
            missing.prepare(),
            Err(ServerError::Directory { .. })
        ));

        let file = dir.path().join("index.html");
        fs::write(&file, b"<html></html>").unwrap();
        assert!(ServingDirectory::new(&file).prepare().is_err());
    }
}
