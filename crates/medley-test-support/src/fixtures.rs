//! Temporary directory fixtures.

use std::fs;

use tempfile::TempDir;

/// Create a temporary directory containing `files`, each a `/`-separated
/// relative path whose content is the path itself.
///
/// # Errors
///
/// Returns an error when the directory or any file cannot be created.
pub fn library_tree(files: &[&str]) -> anyhow::Result<TempDir> {
    let temp = TempDir::new()?;
    for relative in files {
        let path = temp.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, relative.as_bytes())?;
    }
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_tree_writes_nested_files() -> anyhow::Result<()> {
        let tree = library_tree(&["Show/Season 1/s01e01.mkv", "movie.avi"])?;
        assert_eq!(
            fs::read_to_string(tree.path().join("Show/Season 1/s01e01.mkv"))?,
            "Show/Season 1/s01e01.mkv"
        );
        assert!(tree.path().join("movie.avi").is_file());
        Ok(())
    }
}
