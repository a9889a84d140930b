//! Media library backed by a music directory on disk.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media::{AudioAsset, MediaLibrary, PermissionStatus},
};
use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use url::Url;

/// Extensions treated as audio when scanning.
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] =
    &["mp3", "m4a", "aac", "flac", "ogg", "opus", "wav", "alac"];

/// Enumerates audio files below a root directory.
///
/// The walk is recursive and sorted by path so repeated scans list tracks in
/// the same order. Durations come from the file headers; files `lofty` cannot
/// parse are still listed with a zero duration.
pub struct DirectoryMediaLibrary {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectoryMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_AUDIO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }

    /// Library rooted at the user's music directory.
    pub fn user_music_dir() -> Result<Self> {
        let root = dirs::audio_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
            .ok_or_else(|| {
                BridgeError::NotAvailable("Could not determine the music directory".to_string())
            })?;
        Ok(Self::new(root))
    }

    /// Replace the accepted extensions (case-insensitive, without dot).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.into().to_lowercase())
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_audio(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Errors below the root skip that directory; errors at the root fail the
    /// scan.
    fn skip_unless_root(&self, dir: &Path, err: io::Error) -> Result<()> {
        if dir == self.root {
            return Err(BridgeError::Io(err));
        }
        warn!(dir = ?dir, error = %err, "Skipping unreadable directory");
        Ok(())
    }

    async fn collect_audio_files(&self) -> Result<Vec<PathBuf>> {
        let mut pending = vec![self.root.clone()];
        let mut files = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut read_dir = match fs::read_dir(&dir).await {
                Ok(read_dir) => read_dir,
                Err(err) => {
                    self.skip_unless_root(&dir, err)?;
                    continue;
                }
            };

            loop {
                let entry = match read_dir.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(err) => {
                        self.skip_unless_root(&dir, err)?;
                        break;
                    }
                };
                let path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(err) => {
                        warn!(path = ?path, error = %err, "Skipping unreadable entry");
                        continue;
                    }
                };
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && self.is_audio(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Read the stream duration from the file headers.
fn probe_duration_secs(path: &Path) -> Option<f64> {
    let tagged_file = Probe::open(path).ok()?.guess_file_type().ok()?.read().ok()?;
    Some(tagged_file.properties().duration().as_secs_f64())
}

/// Percent-encoded `file://` URI. `None` for paths that cannot be expressed
/// as one (relative or non-UTF-8 on some platforms).
fn file_uri(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(String::from)
}

#[async_trait]
impl MediaLibrary for DirectoryMediaLibrary {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(PermissionStatus::Granted),
            Ok(_) => Ok(PermissionStatus::Denied),
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                debug!(root = ?self.root, error = %err, "Music directory not accessible");
                Ok(PermissionStatus::Denied)
            }
            Err(err) => Err(BridgeError::Io(err)),
        }
    }

    async fn list_audio_assets(&self, limit: usize) -> Result<Vec<AudioAsset>> {
        let cwd = if self.root.is_relative() {
            Some(std::env::current_dir()?)
        } else {
            None
        };
        let mut files = self.collect_audio_files().await?;
        files.truncate(limit);

        let assets = tokio::task::spawn_blocking(move || {
            files
                .into_iter()
                .filter_map(|path| {
                    let absolute = match &cwd {
                        Some(cwd) => cwd.join(&path),
                        None => path,
                    };
                    let Some(uri) = file_uri(&absolute) else {
                        warn!(path = ?absolute, "Skipping file without a valid URI");
                        return None;
                    };
                    let filename = absolute
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let duration_secs = probe_duration_secs(&absolute).unwrap_or(0.0);
                    Some(AudioAsset::new(filename, uri, duration_secs))
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Media scan task failed: {}", e)))?;

        debug!(root = ?self.root, count = assets.len(), "Scanned music directory");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("mixtape-media-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_directory_is_denied() {
        let library = DirectoryMediaLibrary::new(temp_root());
        assert_eq!(
            library.request_permission().await.unwrap(),
            PermissionStatus::Denied
        );
    }

    #[tokio::test]
    async fn test_scan_filters_and_sorts() {
        let root = temp_root();
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::write(root.join("b.mp3"), b"not really audio").unwrap();
        std::fs::write(root.join("nested").join("a.FLAC"), b"not really audio").unwrap();
        std::fs::write(root.join("cover.jpg"), b"image").unwrap();

        let library = DirectoryMediaLibrary::new(&root);
        assert!(library.request_permission().await.unwrap().is_granted());

        let assets = library.list_audio_assets(10).await.unwrap();
        let names: Vec<_> = assets.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["b.mp3", "a.FLAC"]);
        assert!(assets.iter().all(|a| a.uri.starts_with("file://")));
        assert!(assets.iter().all(|a| a.duration_secs == 0.0));

        let limited = library.list_audio_assets(1).await.unwrap();
        assert_eq!(limited.len(), 1);

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_uris_encode_reserved_characters() {
        let root = temp_root();
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("My Song #1 100%.mp3");
        std::fs::write(&path, b"not really audio").unwrap();

        let assets = DirectoryMediaLibrary::new(&root)
            .list_audio_assets(10)
            .await
            .unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].filename, "My Song #1 100%.mp3");

        let uri = &assets[0].uri;
        assert!(uri.ends_with("My%20Song%20%231%20100%25.mp3"), "{}", uri);
        let parsed = Url::parse(uri).unwrap();
        assert_eq!(parsed.fragment(), None);
        assert_eq!(parsed.query(), None);
        assert_eq!(parsed.to_file_path().unwrap(), path);

        let _ = std::fs::remove_dir_all(root);
    }

    #[cfg(unix)]
    #[test]
    fn test_question_mark_stays_in_the_path() {
        let uri = file_uri(Path::new("/music/why?.mp3")).unwrap();
        assert_eq!(uri, "file:///music/why%3F.mp3");
    }

    #[test]
    fn test_relative_paths_have_no_uri() {
        assert_eq!(file_uri(Path::new("music/song.mp3")), None);
    }

    #[test]
    fn test_entry_errors_below_root_are_skipped() {
        let library = DirectoryMediaLibrary::new("/music");
        let denied = || io::Error::new(ErrorKind::PermissionDenied, "denied");

        assert!(library
            .skip_unless_root(Path::new("/music/locked"), denied())
            .is_ok());
        assert!(matches!(
            library.skip_unless_root(Path::new("/music"), denied()),
            Err(BridgeError::Io(_))
        ));
    }

    #[test]
    fn test_custom_extensions() {
        let library = DirectoryMediaLibrary::new("/music").with_extensions(["OGG"]);
        assert!(library.is_audio(Path::new("/music/song.ogg")));
        assert!(!library.is_audio(Path::new("/music/song.mp3")));
    }
}
