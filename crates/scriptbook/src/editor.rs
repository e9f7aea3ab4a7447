use crate::book::{ScriptBook, ScriptEntry};
use crate::error::{BookError, Result};

/// The two observable editor states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    /// Showing the script list.
    Viewing,
    /// The add form is open with the current field values.
    Editing(Draft),
}

/// In-progress form values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub command: String,
    pub description: String,
}

/// Two-state editor over a [`ScriptBook`].
///
/// Mutations persist the whole collection synchronously before the state
/// transition completes, so the file always matches what the list shows.
pub struct Editor {
    book: ScriptBook,
    entries: Vec<ScriptEntry>,
    state: EditorState,
}

impl Editor {
    pub fn new(book: ScriptBook) -> Result<Self> {
        let entries = book.load()?;
        Ok(Self {
            book,
            entries,
            state: EditorState::Viewing,
        })
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    /// Viewing -> Editing with an empty form.
    pub fn open_form(&mut self) {
        self.state = EditorState::Editing(Draft::default());
    }

    /// Editing -> Viewing, discarding the draft.
    pub fn cancel(&mut self) {
        self.state = EditorState::Viewing;
    }

    /// Validate the draft, append it, persist, and return to viewing.
    ///
    /// Name and command must be non-empty; on a validation or duplicate
    /// failure the form stays open with the submitted values.
    pub fn submit(&mut self, draft: Draft) -> Result<()> {
        let validated = Self::validate(&draft);
        if let Err(e) = validated {
            self.state = EditorState::Editing(draft);
            return Err(e);
        }

        let entry = ScriptEntry {
            name: draft.name.trim().to_string(),
            command: draft.command.trim().to_string(),
            description: draft.description.trim().to_string(),
        };
        if let Err(e) = self.book.add(entry.clone()) {
            self.state = EditorState::Editing(draft);
            return Err(e);
        }

        self.entries.push(entry);
        self.state = EditorState::Viewing;
        Ok(())
    }

    /// Remove the entry at `index` and persist immediately.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(BookError::BadIndex { index });
        }
        self.entries.remove(index);
        self.book.save(&self.entries)
    }

    fn validate(draft: &Draft) -> Result<()> {
        if draft.name.trim().is_empty() {
            return Err(BookError::EmptyField { field: "name" });
        }
        if draft.command.trim().is_empty() {
            return Err(BookError::EmptyField { field: "command" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> (tempfile::TempDir, Editor) {
        let dir = tempfile::tempdir().expect("tempdir");
        let book = ScriptBook::new(dir.path().join("scripts.json")).expect("book");
        let editor = Editor::new(book).expect("editor");
        (dir, editor)
    }

    fn draft(name: &str, command: &str) -> Draft {
        Draft {
            name: name.into(),
            command: command.into(),
            description: String::new(),
        }
    }

    #[test]
    fn starts_in_viewing_state() {
        let (_dir, editor) = editor();
        assert_eq!(*editor.state(), EditorState::Viewing);
        assert!(editor.entries().is_empty());
    }

    #[test]
    fn open_form_transitions_to_editing() {
        let (_dir, mut editor) = editor();
        editor.open_form();
        assert!(matches!(editor.state(), EditorState::Editing(_)));
        editor.cancel();
        assert_eq!(*editor.state(), EditorState::Viewing);
    }

    #[test]
    fn submit_appends_persists_and_returns_to_viewing() {
        let (dir, mut editor) = editor();
        editor.open_form();
        editor.submit(draft("deploy", "sh deploy.sh")).expect("submit");

        assert_eq!(*editor.state(), EditorState::Viewing);
        assert_eq!(editor.entries().len(), 1);

        // Persisted synchronously: a fresh load sees the entry.
        let book = ScriptBook::new(dir.path().join("scripts.json")).expect("book");
        assert_eq!(book.load().expect("load").len(), 1);
    }

    #[test]
    fn empty_name_or_command_keeps_the_form_open() {
        let (_dir, mut editor) = editor();
        editor.open_form();

        let result = editor.submit(draft("", "echo hi"));
        assert!(matches!(result, Err(BookError::EmptyField { field: "name" })));
        assert!(matches!(editor.state(), EditorState::Editing(_)));

        let result = editor.submit(draft("hi", "   "));
        assert!(matches!(
            result,
            Err(BookError::EmptyField { field: "command" })
        ));
        assert!(matches!(editor.state(), EditorState::Editing(_)));
        assert!(editor.entries().is_empty());
    }

    #[test]
    fn duplicate_submit_keeps_the_form_open() {
        let (_dir, mut editor) = editor();
        editor.open_form();
        editor.submit(draft("deploy", "a")).expect("submit");
        editor.open_form();
        let result = editor.submit(draft("DEPLOY", "b"));
        assert!(matches!(result, Err(BookError::DuplicateName { .. })));
        assert!(matches!(editor.state(), EditorState::Editing(_)));
        assert_eq!(editor.entries().len(), 1);
    }

    #[test]
    fn delete_removes_and_persists_immediately() {
        let (dir, mut editor) = editor();
        editor.open_form();
        editor.submit(draft("one", "echo 1")).expect("submit");
        editor.open_form();
        editor.submit(draft("two", "echo 2")).expect("submit");

        editor.delete(0).expect("delete");
        assert_eq!(editor.entries().len(), 1);
        assert_eq!(editor.entries()[0].name, "two");

        let book = ScriptBook::new(dir.path().join("scripts.json")).expect("book");
        assert_eq!(book.load().expect("load").len(), 1);
    }

    #[test]
    fn delete_out_of_range_is_an_error() {
        let (_dir, mut editor) = editor();
        assert!(matches!(
            editor.delete(0),
            Err(BookError::BadIndex { index: 0 })
        ));
    }
}
