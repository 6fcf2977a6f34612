//! Lexical path helpers used by the workspace guard and the document assembler.
//!
//! Nothing here touches the filesystem: paths are normalized by walking their
//! components, so symlinks are never resolved.

use std::path::{Component, Path, PathBuf};

/// Resolve `candidate` against `base` and normalize `.`/`..` components lexically.
///
/// Absolute candidates ignore `base`. A `..` at the filesystem root stays at the root.
pub fn normalize(base: &Path, candidate: &Path) -> PathBuf {
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Whether `path` equals `root` or lies below it (component-wise prefix).
pub fn is_within(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

/// Return `target` relative to the directory `from_dir`, joined with `/`.
///
/// Both inputs must already be normalized absolute paths. The result is what a
/// LaTeX `\input{}` in a file under `from_dir` needs to reach `target`.
pub fn relative_forward_slash(from_dir: &Path, target: &Path) -> String {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = target.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    if parts.is_empty() {
        return ".".to_string();
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_relative_and_parent_components() {
        let base = Path::new("/work/project");
        assert_eq!(
            normalize(base, Path::new("notes/./a/../b.md")),
            PathBuf::from("/work/project/notes/b.md")
        );
        assert_eq!(
            normalize(base, Path::new("../../etc/passwd")),
            PathBuf::from("/etc/passwd")
        );
        assert_eq!(
            normalize(base, Path::new("/tmp/../work/x")),
            PathBuf::from("/work/x")
        );
    }

    #[test]
    fn normalize_clamps_at_root() {
        assert_eq!(
            normalize(Path::new("/"), Path::new("../../..")),
            PathBuf::from("/")
        );
    }

    #[test]
    fn is_within_accepts_root_and_children_only() {
        let root = Path::new("/work/project");
        assert!(is_within(root, Path::new("/work/project")));
        assert!(is_within(root, Path::new("/work/project/a/b")));
        assert!(!is_within(root, Path::new("/work/project-other/a")));
        assert!(!is_within(root, Path::new("/work")));
    }

    #[test]
    fn relative_forward_slash_walks_up_and_down() {
        let out_dir = Path::new("/work/output/report");
        assert_eq!(
            relative_forward_slash(out_dir, Path::new("/work/sections/intro.tex")),
            "../../sections/intro.tex"
        );
        assert_eq!(
            relative_forward_slash(out_dir, Path::new("/work/output/report/body.tex")),
            "body.tex"
        );
        assert_eq!(relative_forward_slash(out_dir, out_dir), ".");
    }
}
