use crate::error::{Result, SchemaError};
use globset::{GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Async recursive file discovery filtered by extension and glob patterns
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include (e.g., ["json"])
    extensions: Vec<String>,
    include_set: Option<GlobSet>,
    exclude_set: Option<GlobSet>,
    /// Maximum depth for directory traversal (None = unlimited)
    max_depth: Option<usize>,
    follow_symlinks: bool,
}

impl FileDiscovery {
    /// Discovery of `.json` files with no pattern filters
    pub fn new() -> Self {
        Self {
            extensions: vec!["json".to_string()],
            include_set: None,
            exclude_set: None,
            max_depth: None,
            follow_symlinks: false,
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(&ext))
            .collect();
        self
    }

    /// Only keep files matching at least one pattern
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.include_set = build_glob_set(&patterns, "include")?;
        Ok(self)
    }

    /// Drop files matching any pattern
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set(&patterns, "exclude")?;
        Ok(self)
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Discover files under `path` (file or directory), sorted by path
    ///
    /// A file given directly is returned if it passes the filters. Entries that
    /// cannot be read below the root are logged and skipped.
    pub async fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(path).await?;

        if metadata.is_file() {
            return Ok(if self.should_process(path) {
                vec![path.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let mut files = Vec::new();
        let mut read_dir = fs::read_dir(path).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let entry_path = entry.path();

            if entry_path.is_symlink() && !self.follow_symlinks {
                continue;
            }

            if let Err(e) = self
                .discover_files_recursive(&entry_path, 0, &mut files)
                .await
            {
                warn!(path = %entry_path.display(), error = %e, "skipping unreadable entry");
            }
        }

        files.sort();
        Ok(files)
    }

    fn discover_files_recursive<'a>(
        &'a self,
        path: &'a Path,
        depth: usize,
        files: &'a mut Vec<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(max_depth) = self.max_depth
                && depth > max_depth
            {
                return Ok(());
            }

            let metadata = fs::metadata(path).await?;

            if metadata.is_file() {
                if self.should_process(path) {
                    files.push(path.to_path_buf());
                }
            } else if metadata.is_dir() {
                if let Some(max_depth) = self.max_depth
                    && depth >= max_depth
                {
                    return Ok(());
                }

                let mut read_dir = fs::read_dir(path).await?;

                while let Some(entry) = read_dir.next_entry().await? {
                    let entry_path = entry.path();

                    if entry_path.is_symlink() && !self.follow_symlinks {
                        continue;
                    }

                    if let Err(e) = self
                        .discover_files_recursive(&entry_path, depth + 1, files)
                        .await
                    {
                        warn!(path = %entry_path.display(), error = %e, "skipping unreadable entry");
                    }
                }
            }

            Ok(())
        })
    }

    /// Check a path against the extension list and the glob patterns
    pub fn should_process(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        if !self.extensions.contains(&extension.to_lowercase()) {
            return false;
        }

        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        if let Some(include_set) = &self.include_set {
            return include_set.is_match(path);
        }

        true
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn build_glob_set(patterns: &[String], kind: &str) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| SchemaError::Config(format!("Invalid glob pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .map_err(|e| SchemaError::Config(format!("Failed to build {} glob set: {}", kind, e)))?;
    Ok(Some(set))
}

/// `.JSON` and `json` name the same extension
pub(crate) fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;
    use tokio::fs;

    async fn create_test_directory() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("subdir1")).await.unwrap();
        fs::create_dir_all(root.join("subdir2/nested"))
            .await
            .unwrap();

        fs::write(root.join("leia.json"), "{}").await.unwrap();
        fs::write(root.join("han.json"), "{}").await.unwrap();
        fs::write(root.join("notes.txt"), "text file").await.unwrap();
        fs::write(root.join("subdir1/nested.json"), "{}")
            .await
            .unwrap();
        fs::write(root.join("subdir2/nested/deep.json"), "{}")
            .await
            .unwrap();
        fs::write(root.join("subdir2/nested/character.toml"), "")
            .await
            .unwrap();

        temp_dir
    }

    fn names(files: &[PathBuf]) -> HashSet<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_discover_json_files() {
        let temp_dir = create_test_directory().await;
        let files = FileDiscovery::new()
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(files.len(), 4);
        let file_names = names(&files);
        assert!(file_names.contains("leia.json"));
        assert!(file_names.contains("han.json"));
        assert!(file_names.contains("nested.json"));
        assert!(file_names.contains("deep.json"));
    }

    #[tokio::test]
    async fn test_results_are_sorted() {
        let temp_dir = create_test_directory().await;
        let files = FileDiscovery::new()
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[tokio::test]
    async fn test_discover_multiple_extensions() {
        let temp_dir = create_test_directory().await;
        let discovery =
            FileDiscovery::new().with_extensions(vec!["json".to_string(), ".TOML".to_string()]);

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        assert_eq!(files.len(), 5);
        assert_eq!(discovery.extensions(), ["json", "toml"]);
    }

    #[tokio::test]
    async fn test_max_depth_limit() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new().with_max_depth(Some(1));

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();

        // depth 0: leia.json, han.json; depth 1: subdir1/nested.json
        assert_eq!(files.len(), 3);
        assert!(!names(&files).contains("deep.json"));
    }

    #[tokio::test]
    async fn test_include_patterns() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new()
            .with_include_patterns(vec!["**/nested*".to_string()])
            .unwrap();

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        assert_eq!(names(&files), HashSet::from(["nested.json".to_string()]));
    }

    #[tokio::test]
    async fn test_exclude_patterns() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new()
            .with_exclude_patterns(vec!["**/subdir2/**".to_string()])
            .unwrap();

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        assert_eq!(files.len(), 3);
        assert!(!names(&files).contains("deep.json"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = FileDiscovery::new().with_include_patterns(vec!["a[".to_string()]);
        match result {
            Err(SchemaError::Config(message)) => assert!(message.contains("Invalid glob pattern")),
            other => panic!("Expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_should_process() {
        let discovery = FileDiscovery::new();

        assert!(discovery.should_process(Path::new("leia.json")));
        assert!(discovery.should_process(Path::new("LEIA.JSON")));
        assert!(!discovery.should_process(Path::new("notes.txt")));
        assert!(!discovery.should_process(Path::new("json")));
    }

    #[tokio::test]
    async fn test_single_file_path() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new();

        let files = discovery
            .discover_files(&temp_dir.path().join("leia.json"))
            .await
            .unwrap();
        assert_eq!(files.len(), 1);

        let files = discovery
            .discover_files(&temp_dir.path().join("notes.txt"))
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_nonexistent_directory() {
        let result = FileDiscovery::new()
            .discover_files(Path::new("/nonexistent/path"))
            .await;

        match result {
            Err(SchemaError::Io(_)) => {}
            other => panic!("Expected IO error, got {:?}", other),
        }
    }
}
