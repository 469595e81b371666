use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tracing::debug;

/// Distinguishes temporary files of concurrent writers within this process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write-once image store: a file that exists is a completed download.
///
/// Files are never updated or removed here. Two requests may both miss and
/// download the same image; each writes a private temporary file and renames
/// it into place, so readers only ever see complete images.
#[derive(Debug, Clone)]
pub struct ImageCache {
    root: PathBuf,
}

impl ImageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{perspective}-{vehicle_id}.png`
    pub fn file_name(perspective: &str, vehicle_id: &str) -> String {
        format!("{}-{}.png", perspective, vehicle_id)
    }

    /// Single path segment without traversal
    pub fn is_safe_file_name(file_name: &str) -> bool {
        !file_name.is_empty()
            && !file_name.contains('/')
            && !file_name.contains('\\')
            && !file_name.contains("..")
            && !file_name.contains('\0')
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub async fn contains(&self, file_name: &str) -> bool {
        if !Self::is_safe_file_name(file_name) {
            return false;
        }
        fs::try_exists(self.path_for(file_name)).await.unwrap_or(false)
    }

    /// Writes `bytes` to a temporary sibling and renames it to `file_name`.
    pub async fn store(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
        if !Self::is_safe_file_name(file_name) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("refusing to store image under unsafe name '{}'", file_name),
            ));
        }
        fs::create_dir_all(&self.root).await?;

        let target = self.path_for(file_name);
        let tmp = self.root.join(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(err) = fs::write(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err);
        }
        if let Err(err) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err);
        }
        debug!("stored image {}", target.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_deterministic_file_names() {
        assert_eq!(
            ImageCache::file_name("EXT150", "WDD2132231A444556"),
            "EXT150-WDD2132231A444556.png"
        );
    }

    #[test]
    fn rejects_traversal() {
        assert!(ImageCache::is_safe_file_name("EXT150-WDD2132231A444556.png"));
        assert!(!ImageCache::is_safe_file_name(&ImageCache::file_name("EXT150", "../../etc")));
        assert!(!ImageCache::is_safe_file_name("a/b.png"));
    }

    #[tokio::test]
    async fn store_creates_directory_and_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let cache = ImageCache::new(dir.path().join("images"));
        let name = ImageCache::file_name("INT1", "WDD2054661F444556");

        assert!(!cache.contains(&name).await);
        cache.store(&name, b"png-bytes").await?;

        assert!(cache.contains(&name).await);
        assert_eq!(std::fs::read(cache.path_for(&name))?, b"png-bytes");
        // no temporary files left behind
        assert_eq!(std::fs::read_dir(cache.root())?.count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_duplicate_stores_converge() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let cache = ImageCache::new(dir.path());
        let name = ImageCache::file_name("EXT330", "WDD2054661F444556");

        let (a, b) = tokio::join!(cache.store(&name, b"same-image"), cache.store(&name, b"same-image"));
        a?;
        b?;

        assert_eq!(std::fs::read(cache.path_for(&name))?, b"same-image");
        assert_eq!(std::fs::read_dir(cache.root())?.count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn refuses_unsafe_names() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(dir.path());
        assert!(cache.store("../escape.png", b"x").await.is_err());
    }
}
