use snafu::{Snafu, ensure};
use tracing::debug;

use crate::filesystem::{NodeId, NodeKind, Snapshot, Tree, TreeError};
use crate::session::path::{self, ROOT};

/// A namespace together with the directory relative arguments resolve against.
///
/// `current_path` always names an existing directory. Failed operations leave
/// both the tree and the current directory unchanged.
#[derive(Debug, Clone)]
pub struct Session {
    tree: Tree,
    current_path: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            current_path: ROOT.to_string(),
        }
    }

    /// Replaces the whole namespace and returns to the root.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), NamespaceError> {
        self.tree = Tree::from_snapshot(snapshot)?;
        self.current_path = ROOT.to_string();
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.tree.to_snapshot()
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    pub fn make_directory(&mut self, name: &str) -> Result<(), NamespaceError> {
        let path = self.resolve(name);
        debug!("mkdir {}", path);
        self.tree.insert(&path, NodeKind::Directory)?;
        Ok(())
    }

    /// Names in the current directory, sorted ascending.
    pub fn list(&self) -> Vec<String> {
        let Some(id) = self.tree.search(&self.current_path) else {
            return Vec::new();
        };
        let node = self.tree.node(id);
        if node.is_file() {
            vec![node.name().to_string()]
        } else {
            node.children().keys().cloned().collect()
        }
    }

    /// Changes the current directory and returns it.
    pub fn change_directory(&mut self, target: &str) -> Result<&str, NamespaceError> {
        if target.is_empty() || target == "." {
            return Ok(&self.current_path);
        }

        let (path, id) = self.lookup(target)?;
        ensure!(
            self.tree.node(id).is_directory(),
            NotADirectorySnafu { path }
        );
        debug!("cd {} -> {}", self.current_path, path);
        self.current_path = path;
        Ok(&self.current_path)
    }

    pub fn read_file(&self, name: &str) -> Result<&str, NamespaceError> {
        let id = self.lookup_file(name)?;
        Ok(self.tree.node(id).content())
    }

    pub fn create_file(&mut self, name: &str) -> Result<(), NamespaceError> {
        let path = self.resolve(name);
        debug!("touch {}", path);
        self.tree.insert(&path, NodeKind::File)?;
        Ok(())
    }

    /// Appends `words` joined by single spaces, followed by one trailing space.
    pub fn append_text<S: AsRef<str>>(
        &mut self,
        name: &str,
        words: &[S],
    ) -> Result<(), NamespaceError> {
        let id = self.lookup_file(name)?;
        let mut text = words
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");
        text.push(' ');
        self.tree.append_content(id, &text)?;
        Ok(())
    }

    /// Moves `src` into the directory `dst`.
    pub fn move_entry(&mut self, src: &str, dst: &str) -> Result<(), NamespaceError> {
        let (_, src_id) = self.lookup(src)?;
        let (_, dst_id) = self.lookup(dst)?;

        let current = self.tree.search(&self.current_path);
        let carried = current.filter(|&id| self.tree.contains(src_id, id));

        self.tree.move_node(src_id, dst_id)?;

        if let Some(id) = carried {
            self.current_path = self.tree.path_of(id);
        }
        self.settle_current_directory();
        Ok(())
    }

    /// Copies `src` and everything below it into the directory `dst`.
    pub fn copy_entry(&mut self, src: &str, dst: &str) -> Result<(), NamespaceError> {
        let (_, src_id) = self.lookup(src)?;
        let (_, dst_id) = self.lookup(dst)?;

        self.tree.copy_node(src_id, dst_id)?;
        self.settle_current_directory();
        Ok(())
    }

    /// Removes a file, or a directory with no entries.
    pub fn remove(&mut self, target: &str) -> Result<(), NamespaceError> {
        let (path, id) = self.lookup(target)?;
        let node = self.tree.node(id);
        let Some(parent) = node.parent() else {
            return RootNotRemovableSnafu.fail();
        };
        ensure!(
            node.is_file() || node.children().is_empty(),
            DirectoryNotEmptySnafu { path }
        );

        let name = node.name().to_string();
        debug!("rm {}", path);
        self.tree.remove(parent, &name);
        self.settle_current_directory();
        Ok(())
    }

    /// Reports whether `pattern` occurs literally in the file at `name`.
    pub fn grep(&self, name: &str, pattern: &str) -> Result<bool, NamespaceError> {
        let id = self.lookup_file(name)?;
        Ok(self.tree.grep(id, pattern))
    }

    fn resolve(&self, argument: &str) -> String {
        path::resolve(&self.current_path, argument)
    }

    fn lookup(&self, argument: &str) -> Result<(String, NodeId), NamespaceError> {
        let path = self.resolve(argument);
        match self.tree.search(&path) {
            Some(id) => Ok((path, id)),
            None => NotFoundSnafu { path }.fail(),
        }
    }

    fn lookup_file(&self, argument: &str) -> Result<NodeId, NamespaceError> {
        let (path, id) = self.lookup(argument)?;
        ensure!(self.tree.node(id).is_file(), NotAFileSnafu { path });
        Ok(id)
    }

    /// Walks `current_path` up until it names an existing directory again.
    fn settle_current_directory(&mut self) {
        let mut candidate = self.current_path.as_str();
        loop {
            let is_directory = self
                .tree
                .search(candidate)
                .is_some_and(|id| self.tree.node(id).is_directory());
            if is_directory {
                break;
            }
            match path::split_last(candidate) {
                Some((parent, _)) => candidate = parent,
                None => break,
            }
        }

        if candidate != self.current_path {
            let settled = candidate.to_string();
            debug!("Current directory {} vanished, now {}", self.current_path, settled);
            self.current_path = settled;
        }
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    #[snafu(display("No such file or directory: {}", path))]
    NotFound { path: String },
    #[snafu(display("Not a file: {}", path))]
    NotAFile { path: String },
    #[snafu(display("{} is not a directory", path))]
    NotADirectory { path: String },
    #[snafu(display("Directory not empty: {}", path))]
    DirectoryNotEmpty { path: String },
    #[snafu(display("Cannot remove the root directory"))]
    RootNotRemovable,
    #[snafu(display("{}", source))]
    Tree { source: TreeError },
}

impl From<TreeError> for NamespaceError {
    fn from(error: TreeError) -> Self {
        match error {
            TreeError::NotADirectory { path } => NamespaceError::NotADirectory { path },
            TreeError::NotAFile { path } => NamespaceError::NotAFile { path },
            source => NamespaceError::Tree { source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn session_with(commands: &[&str]) -> Session {
        let mut session = Session::new();
        for command in commands {
            let (verb, argument) = command.split_once(' ').unwrap();
            match verb {
                "mkdir" => session.make_directory(argument).unwrap(),
                "touch" => session.create_file(argument).unwrap(),
                "cd" => {
                    session.change_directory(argument).unwrap();
                }
                _ => panic!("unsupported verb {verb}"),
            }
        }
        session
    }

    #[rstest]
    #[case(&["mkdir b", "touch a", "mkdir c"], &["a", "b", "c"])]
    #[case(&["mkdir x", "mkdir x", "touch y", "touch y"], &["x", "y"])]
    #[case(&["mkdir a/b/c"], &["a"])]
    #[case(&[] as &[&str], &[] as &[&str])]
    fn list_returns_sorted_unique_names(#[case] commands: &[&str], #[case] expected: &[&str]) {
        let session = session_with(commands);
        assert_eq!(session.list(), expected);
    }

    #[test]
    fn change_directory_handles_dot_dot_and_root() {
        let mut session = session_with(&["mkdir a/b"]);

        assert_eq!(session.change_directory("..").unwrap(), "/");
        assert_eq!(session.change_directory("a/b").unwrap(), "/a/b");
        assert_eq!(session.change_directory("..").unwrap(), "/a");
        assert_eq!(session.change_directory(".").unwrap(), "/a");
        assert_eq!(session.change_directory("").unwrap(), "/a");
        assert_eq!(session.change_directory("/").unwrap(), "/");
        assert_eq!(session.change_directory("/a/b").unwrap(), "/a/b");
    }

    #[test]
    fn change_directory_failures_keep_current_path() {
        let mut session = session_with(&["mkdir a", "touch a/f", "cd a"]);

        assert_eq!(
            session.change_directory("missing"),
            Err(NamespaceError::NotFound {
                path: "/a/missing".to_string()
            })
        );
        assert_eq!(
            session.change_directory("f"),
            Err(NamespaceError::NotADirectory {
                path: "/a/f".to_string()
            })
        );
        assert_eq!(session.current_path(), "/a");
    }

    #[test]
    fn relative_paths_resolve_against_current_directory() {
        let mut session = session_with(&["mkdir docs", "cd docs", "touch notes"]);
        assert_eq!(session.list(), vec!["notes"]);

        session.change_directory("/").unwrap();
        assert!(session.read_file("docs/notes").is_ok());
        assert!(session.read_file("/docs/notes").is_ok());
        assert!(session.read_file("docs/./../docs//notes").is_ok());
    }

    #[test]
    fn echo_appends_with_trailing_spaces() {
        let mut session = session_with(&["touch f"]);

        session.append_text("f", &["hello"]).unwrap();
        session.append_text("f", &["world"]).unwrap();

        assert_eq!(session.read_file("f").unwrap(), "hello world ");
    }

    #[test]
    fn echo_joins_words_with_single_spaces() {
        let mut session = session_with(&["touch f"]);
        session
            .append_text("f", &["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(session.read_file("f").unwrap(), "a b ");
    }

    #[test]
    fn touching_again_keeps_content() {
        let mut session = session_with(&["touch f"]);
        session.append_text("f", &["keep"]).unwrap();
        session.create_file("f").unwrap();
        assert_eq!(session.read_file("f").unwrap(), "keep ");
    }

    #[rstest]
    #[case("missing", NamespaceError::NotFound { path: "/missing".to_string() })]
    #[case("d", NamespaceError::NotAFile { path: "/d".to_string() })]
    fn file_operations_require_an_existing_file(
        #[case] name: &str,
        #[case] expected: NamespaceError,
    ) {
        let mut session = session_with(&["mkdir d"]);

        assert_eq!(session.read_file(name), Err(expected.clone()));
        assert_eq!(session.append_text(name, &["x"]), Err(expected.clone()));
        assert_eq!(session.grep(name, "x"), Err(expected));
    }

    #[test]
    fn remove_empty_directory_and_file() {
        let mut session = session_with(&["mkdir d", "touch f"]);

        session.remove("d").unwrap();
        session.remove("f").unwrap();

        assert!(session.list().is_empty());
    }

    #[test]
    fn remove_refuses_non_empty_directory() {
        let mut session = session_with(&["mkdir d", "touch /d/f"]);

        assert_eq!(
            session.remove("d"),
            Err(NamespaceError::DirectoryNotEmpty {
                path: "/d".to_string()
            })
        );
        assert!(session.read_file("/d/f").is_ok());
    }

    #[test]
    fn remove_refuses_root_and_missing_paths() {
        let mut session = Session::new();
        assert_eq!(session.remove("/"), Err(NamespaceError::RootNotRemovable));
        assert!(matches!(
            session.remove("nothing"),
            Err(NamespaceError::NotFound { .. })
        ));
    }

    #[test]
    fn removing_current_directory_returns_to_parent() {
        let mut session = session_with(&["mkdir a/b", "cd a/b"]);

        session.remove(".").unwrap();

        assert_eq!(session.current_path(), "/a");
    }

    #[test]
    fn move_entry_relocates_subtree() {
        let mut session = session_with(&["mkdir src", "touch src/f", "mkdir dst"]);

        session.move_entry("src", "dst").unwrap();

        assert_eq!(session.list(), vec!["dst"]);
        assert!(session.read_file("/dst/src/f").is_ok());
    }

    #[test]
    fn move_entry_carries_current_directory_along() {
        let mut session = session_with(&["mkdir a/inner", "mkdir b", "cd a/inner"]);

        session.move_entry("/a", "/b").unwrap();

        assert_eq!(session.current_path(), "/b/a/inner");
    }

    #[rstest]
    #[case("missing", "dst")]
    #[case("src", "missing")]
    fn move_and_copy_require_both_ends(#[case] src: &str, #[case] dst: &str) {
        let mut session = session_with(&["mkdir src", "mkdir dst"]);
        let before = session.snapshot();

        assert!(matches!(
            session.move_entry(src, dst),
            Err(NamespaceError::NotFound { .. })
        ));
        assert!(matches!(
            session.copy_entry(src, dst),
            Err(NamespaceError::NotFound { .. })
        ));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn move_into_file_is_refused() {
        let mut session = session_with(&["mkdir d", "touch f"]);
        assert_eq!(
            session.move_entry("d", "f"),
            Err(NamespaceError::NotADirectory {
                path: "/f".to_string()
            })
        );
    }

    #[test]
    fn copy_is_independent_of_source() {
        let mut session = session_with(&["mkdir src", "touch src/f", "mkdir dst"]);
        session.append_text("src/f", &["first"]).unwrap();

        session.copy_entry("src", "dst").unwrap();
        session.create_file("src/new").unwrap();
        session.append_text("src/f", &["changed"]).unwrap();
        session.remove("src/new").unwrap();
        session.create_file("src/other").unwrap();

        session.change_directory("/dst/src").unwrap();
        assert_eq!(session.list(), vec!["f"]);
        assert_eq!(session.read_file("f").unwrap(), "first ");
    }

    #[test]
    fn grep_reports_literal_matches_only() {
        let mut session = session_with(&["touch f", "mkdir d"]);
        session.append_text("f", &["needle", "in", "haystack"]).unwrap();

        assert_eq!(session.grep("f", "in hay"), Ok(true));
        assert_eq!(session.grep("f", "n.*e"), Ok(false));
        assert!(session.grep("d", "d").is_err());
        assert!(session.grep("nope", "x").is_err());
    }

    #[test]
    fn snapshot_round_trip_preserves_every_listing() {
        let mut session = session_with(&[
            "mkdir a/b",
            "touch a/b/f",
            "touch top",
            "mkdir empty",
        ]);
        session.append_text("a/b/f", &["deep"]).unwrap();

        let mut restored = Session::new();
        restored.restore(&session.snapshot()).unwrap();

        for dir in ["/", "/a", "/a/b", "/empty"] {
            session.change_directory(dir).unwrap();
            let mut other = restored.clone();
            other.change_directory(dir).unwrap();
            assert_eq!(session.list(), other.list(), "listing of {dir}");
        }
        assert_eq!(restored.read_file("/a/b/f").unwrap(), "deep ");
        assert_eq!(restored.snapshot(), session.snapshot());
    }

    #[test]
    fn restore_resets_current_directory() {
        let mut session = session_with(&["mkdir a", "cd a"]);
        session.restore(&Snapshot::default()).unwrap();
        assert_eq!(session.current_path(), "/");
        assert!(session.list().is_empty());
    }

    #[test]
    fn mkdir_over_file_reports_kind_mismatch() {
        let mut session = session_with(&["touch f"]);
        assert_eq!(
            session.make_directory("f/sub"),
            Err(NamespaceError::NotADirectory {
                path: "/f".to_string()
            })
        );
    }
}
