use std::path::{Component, Path, PathBuf};

/// Renders a host path for messages, absolute and canonical when possible.
///
/// Paths that do not exist yet (a state file before the first save) cannot be
/// canonicalized, so they are joined onto the working directory and cleaned
/// lexically instead.
pub trait BestEffortPathExt {
    fn best_effort_path_display(&self) -> String;
}

impl BestEffortPathExt for Path {
    fn best_effort_path_display(&self) -> String {
        if let Ok(canonical) = self.canonicalize() {
            return canonical.display().to_string();
        }

        let absolute = if self.is_absolute() {
            self.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|dir| dir.join(self))
                .unwrap_or_else(|_| self.to_path_buf())
        };
        lexically_normalize(&absolute).display().to_string()
    }
}

fn lexically_normalize(path: &Path) -> PathBuf {
    path.components()
        .fold(Vec::new(), |mut kept: Vec<Component>, component| {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if matches!(kept.last(), Some(Component::Normal(_))) {
                        kept.pop();
                    }
                }
                other => kept.push(other),
            }
            kept
        })
        .iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_paths_are_canonicalized() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let dotted = temp_dir.path().join(".");

        assert_eq!(
            dotted.best_effort_path_display(),
            temp_dir.path().canonicalize().unwrap().display().to_string()
        );
    }

    #[test]
    fn missing_paths_are_cleaned_lexically() {
        let path = Path::new("/definitely/not/../here/./state.json");
        assert_eq!(
            path.best_effort_path_display(),
            "/definitely/here/state.json"
        );
    }

    #[test]
    fn relative_missing_paths_become_absolute() {
        let shown = Path::new("no-such-dir/state.json").best_effort_path_display();
        assert!(Path::new(&shown).is_absolute());
        assert!(shown.ends_with("no-such-dir/state.json"));
    }
}
