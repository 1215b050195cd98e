//! Source image discovery.
//!
//! Finds every file under `root/{namespace}/**/*.{ext}` for each configured
//! namespace and each configured extension. Brace expansion is not portable,
//! so the `{ext, EXT}` alternatives are compiled up front into an explicit
//! cross product of [`glob::Pattern`]s:
//!
//! ```text
//! namespaces ["**", "blog"] × filetypes ["jpg", "png"]
//!   → **/*.jpg  **/*.JPG  **/*.png  **/*.PNG
//!     blog/**/*.jpg  blog/**/*.JPG  blog/**/*.png  blog/**/*.PNG
//! ```
//!
//! The tree is walked once with `walkdir` and each file's root-relative path
//! is tested against the compiled set. Separators are literal, so `*` never
//! crosses a directory boundary while `**` spans any depth.
//!
//! Discovery is best-effort: a missing root, or entries that cannot be read,
//! are skipped silently. Results are de-duplicated and sorted, but callers
//! must not depend on the order.

use glob::{MatchOptions, Pattern, PatternError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled namespace × extension patterns.
#[derive(Debug, Clone)]
pub struct Discovery {
    patterns: Vec<Pattern>,
}

impl Discovery {
    pub fn new<N, E>(namespaces: &[N], filetypes: &[E]) -> Result<Self, PatternError>
    where
        N: AsRef<str>,
        E: AsRef<str>,
    {
        let mut sources = Vec::new();
        for ns in namespaces {
            let ns = ns.as_ref().trim_matches('/');
            for ext in filetypes {
                for ext in extension_spellings(ext.as_ref()) {
                    let pattern = format!("{ns}/**/*.{ext}").replace("**/**/", "**/");
                    if !sources.contains(&pattern) {
                        sources.push(pattern);
                    }
                }
            }
        }
        let patterns = sources
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Pattern strings, in compile order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }

    /// Whether a root-relative path matches any pattern.
    pub fn matches(&self, relative: &Path) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }

    /// All matching files under `root`, as absolute paths.
    pub fn find(&self, root: &Path) -> Vec<PathBuf> {
        let found: BTreeSet<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .strip_prefix(root)
                    .is_ok_and(|relative| self.matches(relative))
            })
            .map(|entry| entry.into_path())
            .collect();
        found.into_iter().collect()
    }
}

/// The configured spelling plus its lower- and upper-case forms.
fn extension_spellings(ext: &str) -> Vec<String> {
    let mut spellings = vec![ext.to_string()];
    for folded in [ext.to_ascii_lowercase(), ext.to_ascii_uppercase()] {
        if !spellings.contains(&folded) {
            spellings.push(folded);
        }
    }
    spellings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn relative_names(root: &Path, found: &[PathBuf]) -> Vec<String> {
        found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn default_discovery() -> Discovery {
        Discovery::new(&["**"], &["jpg", "jpeg", "png"]).unwrap()
    }

    #[test]
    fn compiles_cross_product_of_namespaces_and_case_forms() {
        let discovery = Discovery::new(&["**", "blog"], &["jpg"]).unwrap();
        let patterns: Vec<&str> = discovery.patterns().collect();
        assert_eq!(
            patterns,
            vec!["**/*.jpg", "**/*.JPG", "blog/**/*.jpg", "blog/**/*.JPG"]
        );
    }

    #[test]
    fn finds_files_at_any_depth() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "cat.png");
        touch(tmp.path(), "a/b/c/deep.jpg");
        touch(tmp.path(), "notes.txt");

        let found = default_discovery().find(tmp.path());
        assert_eq!(relative_names(tmp.path(), &found), vec!["a/b/c/deep.jpg", "cat.png"]);
    }

    #[test]
    fn uppercase_extension_is_discovered() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "photo.JPG");

        let found = default_discovery().find(tmp.path());
        assert_eq!(relative_names(tmp.path(), &found), vec!["photo.JPG"]);
    }

    #[test]
    fn mixed_case_extension_is_not_discovered() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "photo.Jpg");

        assert!(default_discovery().find(tmp.path()).is_empty());
    }

    #[test]
    fn namespaces_restrict_search() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "blog/2024/post.png");
        touch(tmp.path(), "gallery/landscape.png");

        let discovery = Discovery::new(&["blog"], &["png"]).unwrap();
        let found = discovery.find(tmp.path());
        assert_eq!(relative_names(tmp.path(), &found), vec!["blog/2024/post.png"]);
    }

    #[test]
    fn namespace_matches_files_directly_inside_it() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "blog/cover.png");

        let discovery = Discovery::new(&["blog"], &["png"]).unwrap();
        assert_eq!(discovery.find(tmp.path()).len(), 1);
    }

    #[test]
    fn overlapping_namespaces_do_not_duplicate() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "blog/cover.png");

        let discovery = Discovery::new(&["**", "blog"], &["png", "PNG"]).unwrap();
        assert_eq!(discovery.find(tmp.path()).len(), 1);
    }

    #[test]
    fn missing_root_yields_empty() {
        let found = default_discovery().find(Path::new("/nonexistent/images/root"));
        assert!(found.is_empty());
    }

    #[test]
    fn directories_named_like_images_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("album.jpg")).unwrap();

        assert!(default_discovery().find(tmp.path()).is_empty());
    }

    #[test]
    fn invalid_namespace_pattern_is_error() {
        assert!(Discovery::new(&["[unclosed"], &["png"]).is_err());
    }
}
