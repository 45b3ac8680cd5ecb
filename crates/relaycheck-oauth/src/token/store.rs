//! Token file persistence.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use super::AuthorizedUser;
use crate::error::Result;

/// Reads and writes [`AuthorizedUser`] token files.
///
/// On Unix, missing parent directories are created with mode `0700` and the
/// token file is written with mode `0600`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTokenStore;

impl FileTokenStore {
    /// Loads a cached grant.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(self, path: impl AsRef<Path>) -> Result<Option<AuthorizedUser>> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), "loaded token file");
        AuthorizedUser::from_json(&contents).map(Some)
    }

    /// Writes a grant, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created or written.
    pub fn save(self, path: impl AsRef<Path>, user: &AuthorizedUser) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent)?;
        }

        let json = user.to_json()?;
        let mut file = open_private_file(path)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %path.display(), "saved token file");
        Ok(())
    }
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

fn open_private_file(path: &Path) -> io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).truncate(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::provider::GOOGLE_TOKEN_URL;

    fn user() -> AuthorizedUser {
        AuthorizedUser {
            token: Some("ya29.access".into()),
            refresh_token: Some("1//refresh".into()),
            token_uri: GOOGLE_TOKEN_URL.into(),
            client_id: "id".into(),
            client_secret: None,
            scopes: vec![crate::scopes::GMAIL_INSERT.into()],
            expiry: None,
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = FileTokenStore.load(dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_garbage_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();
        assert!(FileTokenStore.load(&path).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/tokens/account1.json");

        FileTokenStore.save(&path, &user()).unwrap();
        let loaded = FileTokenStore.load(&path).unwrap().unwrap();
        assert_eq!(loaded, user());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{\"token\": \"a much longer stale value than the new one\"}").unwrap();

        FileTokenStore.save(&path, &user()).unwrap();
        let loaded = FileTokenStore.load(&path).unwrap().unwrap();
        assert_eq!(loaded.access_token(), Some("ya29.access"));
    }

    #[cfg(unix)]
    #[test]
    fn test_save_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("tokens");
        let path = parent.join("account1.json");
        FileTokenStore.save(&path, &user()).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let dir_mode = fs::metadata(&parent).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(dir_mode & 0o077, 0);
    }

    #[test]
    fn test_save_into_file_as_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let result = FileTokenStore.save(blocker.join("token.json"), &user());
        assert!(result.is_err());
    }
}
