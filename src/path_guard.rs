// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Confinement of generated output paths to the output directory.

use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::error::HarError;

/// Check that `candidate` resolves to a file strictly beneath `root`.
///
/// Both paths are made absolute against the current directory and
/// normalized, then the longest existing prefix of each is canonicalized so
/// symlinks inside the output directory cannot point the write elsewhere.
/// Components that do not exist yet are kept as written. Returns the
/// resolved candidate on success.
pub async fn validate(candidate: &Path, root: &Path) -> Result<PathBuf, HarError> {
    let abs_root = normalize(
        &std::path::absolute(root)
            .map_err(HarError::io("failed to get absolute path of output directory"))?,
    );
    let abs_candidate = normalize(
        &std::path::absolute(candidate)
            .map_err(HarError::io("failed to get absolute path of file"))?,
    );

    let escape = || HarError::PathEscape {
        path: candidate.to_path_buf(),
        root: root.to_path_buf(),
    };

    // A link that resolves nowhere would be followed on write.
    if is_dangling_link(&abs_candidate).await {
        return Err(escape());
    }

    let real_root = resolve(&abs_root).await;
    let real_candidate = resolve(&abs_candidate).await;

    match real_candidate.strip_prefix(&real_root) {
        Ok(rel) if rel.components().next().is_some() => Ok(real_candidate),
        _ => Err(escape()),
    }
}

// Canonicalize the deepest ancestor that exists and re-append the rest.
// `path` is already normalized, so the tail holds no `..`.
async fn resolve(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        if let Ok(real) = fs::canonicalize(ancestor).await {
            return match path.strip_prefix(ancestor) {
                Ok(tail) if tail.components().next().is_some() => real.join(tail),
                _ => real,
            };
        }
    }
    path.to_path_buf()
}

async fn is_dangling_link(path: &Path) -> bool {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.file_type().is_symlink() => fs::metadata(path).await.is_err(),
        _ => false,
    }
}

// Lexical cleanup: drop `.`, resolve `..` against preceding components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root is a no-op, as in `/..` == `/`.
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_temp_dir;
    use rstest::rstest;

    // Nothing under /srv/har exists on the test host, so only `/` and `/srv`
    // (if present) get canonicalized and the checks stay textual.
    #[rstest]
    #[case("/srv/har/a.har")]
    #[case("/srv/har/sub/a.har")]
    #[case("/srv/har/./a.har")]
    #[case("/srv/har/sub/../a.har")]
    #[case("/srv/har/..a.har")]
    #[tokio::test]
    async fn accepts_paths_inside_root(#[case] candidate: &str) {
        assert!(validate(Path::new(candidate), Path::new("/srv/har")).await.is_ok());
    }

    #[rstest]
    #[case("/srv/har/../a.har")]
    #[case("/srv/har/../../etc/passwd")]
    #[case("/srv/harvest/a.har")]
    #[case("/srv/har/..")]
    #[case("/srv/har")]
    #[case("/tmp/a.har")]
    #[tokio::test]
    async fn rejects_escapes(#[case] candidate: &str) {
        let res = validate(Path::new(candidate), Path::new("/srv/har")).await;
        assert!(matches!(res, Err(HarError::PathEscape { .. })));
    }

    #[tokio::test]
    async fn relative_paths_resolve_against_current_dir() {
        assert!(validate(Path::new("out/x.har"), Path::new("out")).await.is_ok());
        assert!(validate(Path::new("out/../x.har"), Path::new("out")).await.is_err());
        assert!(validate(Path::new("./out/./x.har"), Path::new("out/")).await.is_ok());
    }

    #[tokio::test]
    async fn returns_normalized_candidate() -> anyhow::Result<()> {
        let dir = make_temp_dir("guard_normalized");
        fs::create_dir_all(&dir).await?;

        let p = validate(&dir.join("sub/../a.har"), &dir).await?;
        assert_eq!(p, fs::canonicalize(&dir).await?.join("a.har"));

        fs::remove_dir_all(&dir).await?;
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_directory_inside_root_is_rejected() -> anyhow::Result<()> {
        let root = make_temp_dir("guard_link_root");
        let outside = make_temp_dir("guard_link_outside");
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(&outside).await?;
        fs::symlink(&outside, root.join("link")).await?;

        let res = validate(&root.join("link/x.har"), &root).await;
        assert!(matches!(res, Err(HarError::PathEscape { .. })));

        // A real subdirectory next to it is still fine.
        fs::create_dir_all(root.join("real")).await?;
        assert!(validate(&root.join("real/x.har"), &root).await.is_ok());

        fs::remove_dir_all(&root).await?;
        fs::remove_dir_all(&outside).await?;
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_file_pointing_out_is_rejected() -> anyhow::Result<()> {
        let root = make_temp_dir("guard_file_root");
        let outside = make_temp_dir("guard_file_outside");
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(&outside).await?;

        fs::write(outside.join("victim"), b"keep").await?;
        fs::symlink(outside.join("victim"), root.join("x.har")).await?;
        let res = validate(&root.join("x.har"), &root).await;
        assert!(matches!(res, Err(HarError::PathEscape { .. })));

        fs::symlink(outside.join("missing"), root.join("y.har")).await?;
        let res = validate(&root.join("y.har"), &root).await;
        assert!(matches!(res, Err(HarError::PathEscape { .. })));

        fs::remove_dir_all(&root).await?;
        fs::remove_dir_all(&outside).await?;
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_root_is_followed() -> anyhow::Result<()> {
        let real = make_temp_dir("guard_real_root");
        let alias = make_temp_dir("guard_alias_root");
        fs::create_dir_all(&real).await?;
        fs::symlink(&real, &alias).await?;

        let p = validate(&alias.join("x.har"), &alias).await?;
        assert_eq!(p, fs::canonicalize(&real).await?.join("x.har"));

        fs::remove_file(&alias).await?;
        fs::remove_dir_all(&real).await?;
        Ok(())
    }
}
