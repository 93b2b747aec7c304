//! JSON-file backed storage for snippets, categories, custom variables and AI settings.
//!
//! Every write persists the whole document at once and then broadcasts the new
//! value of the collection that changed, so resolution contexts can refresh.

use crate::config::{ensure_parent_dir, get_db_file_path};
use crate::error::{QuickfillError, Result};
use crate::models::{clean_variable_name, new_id, AiConfig, Snippet, StoreData, Variables};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::debug;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// New full value of a collection after a write
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Snippets(Vec<Snippet>),
    Categories(Vec<String>),
    Variables(Variables),
    Ai(AiConfig),
}

pub struct Store {
    path: PathBuf,
    write_lock: Mutex<()>,
    changes: broadcast::Sender<StoreChange>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    /// Store at the default database location
    pub fn open_default() -> Self {
        Self::new(get_db_file_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Receive every change made through this store from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Load the whole document. A missing or empty file is an empty document.
    pub fn load(&self) -> Result<StoreData> {
        if !self.path.exists() {
            return Ok(StoreData::default());
        }

        let content = fs::read_to_string(&self.path)?;

        // Handle empty database file
        if content.trim().is_empty() {
            return Ok(StoreData::default());
        }

        serde_json::from_str(&content).map_err(|e| e.into())
    }

    pub fn load_snippets(&self) -> Result<Vec<Snippet>> {
        Ok(self.load()?.snippets)
    }

    pub fn load_categories(&self) -> Result<Vec<String>> {
        Ok(self.load()?.categories)
    }

    pub fn load_custom_variables(&self) -> Result<Variables> {
        Ok(self.load()?.custom_variables)
    }

    pub fn load_ai_config(&self) -> Result<AiConfig> {
        Ok(self.load()?.ai)
    }

    /// Insert or update a snippet by id. A snippet without a known id gets a fresh one.
    pub fn save_snippet(&self, mut snippet: Snippet) -> Result<Snippet> {
        if snippet.shortcut.trim().is_empty() {
            return Err(QuickfillError::InvalidConfig(
                "shortcut must not be empty".to_string(),
            ));
        }

        let _guard = self.write_lock.lock();
        let mut data = self.load()?;

        if data
            .snippets
            .iter()
            .any(|s| s.shortcut == snippet.shortcut && (snippet.id.is_empty() || s.id != snippet.id))
        {
            return Err(QuickfillError::DuplicateShortcut(snippet.shortcut));
        }

        match data.snippets.iter().position(|s| !snippet.id.is_empty() && s.id == snippet.id) {
            Some(index) => data.snippets[index] = snippet.clone(),
            None => {
                snippet.id = new_id();
                data.snippets.push(snippet.clone());
            }
        }

        let category_added = match &snippet.category {
            Some(category) if !category.is_empty() && !data.categories.contains(category) => {
                data.categories.push(category.clone());
                true
            }
            _ => false,
        };

        self.write(&data)?;
        self.notify(StoreChange::Snippets(data.snippets));
        if category_added {
            self.notify(StoreChange::Categories(data.categories));
        }
        Ok(snippet)
    }

    /// Delete a snippet by id
    pub fn delete_snippet(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut data = self.load()?;
        let before = data.snippets.len();
        data.snippets.retain(|s| s.id != id);
        if data.snippets.len() == before {
            return Err(QuickfillError::NotFound(format!("snippet '{}'", id)));
        }
        self.write(&data)?;
        self.notify(StoreChange::Snippets(data.snippets));
        Ok(())
    }

    /// Replace the whole snippet list in one write
    pub fn replace_snippets(&self, snippets: Vec<Snippet>) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut data = self.load()?;
        data.snippets = snippets;
        self.write(&data)?;
        self.notify(StoreChange::Snippets(data.snippets));
        Ok(())
    }

    pub fn save_category(&self, category: &str) -> Result<()> {
        let category = category.trim();
        if category.is_empty() {
            return Err(QuickfillError::InvalidConfig(
                "category must not be empty".to_string(),
            ));
        }

        let _guard = self.write_lock.lock();
        let mut data = self.load()?;
        if data.categories.iter().any(|c| c == category) {
            return Ok(());
        }
        data.categories.push(category.to_string());
        self.write(&data)?;
        self.notify(StoreChange::Categories(data.categories));
        Ok(())
    }

    /// Set a custom variable, renaming it when `old_name` differs from `name`
    pub fn save_custom_variable(&self, name: &str, value: &str, old_name: Option<&str>) -> Result<()> {
        let clean_name = clean_variable_name(name);
        if clean_name.trim().is_empty() {
            return Err(QuickfillError::InvalidConfig(
                "variable name must not be empty".to_string(),
            ));
        }

        let _guard = self.write_lock.lock();
        let mut data = self.load()?;
        if let Some(old) = old_name {
            let clean_old = clean_variable_name(old);
            if clean_old != clean_name {
                data.custom_variables.remove(&clean_old);
            }
        }
        data.custom_variables.insert(clean_name, value.to_string());
        self.write(&data)?;
        self.notify(StoreChange::Variables(data.custom_variables));
        Ok(())
    }

    pub fn delete_custom_variable(&self, name: &str) -> Result<()> {
        let clean_name = clean_variable_name(name);

        let _guard = self.write_lock.lock();
        let mut data = self.load()?;
        if data.custom_variables.remove(&clean_name).is_none() {
            return Err(QuickfillError::NotFound(format!("variable '{}'", clean_name)));
        }
        self.write(&data)?;
        self.notify(StoreChange::Variables(data.custom_variables));
        Ok(())
    }

    /// Replace the whole variable mapping in one write
    pub fn replace_variables(&self, variables: Variables) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut data = self.load()?;
        data.custom_variables = variables;
        self.write(&data)?;
        self.notify(StoreChange::Variables(data.custom_variables));
        Ok(())
    }

    pub fn save_ai_config(&self, config: AiConfig) -> Result<()> {
        if let Some(provider) = config.selected_provider {
            if config.api_key(provider).is_none() {
                return Err(QuickfillError::InvalidConfig(format!(
                    "an API key is required for the selected provider '{}'",
                    provider
                )));
            }
        }

        let _guard = self.write_lock.lock();
        let mut data = self.load()?;
        data.ai = config;
        self.write(&data)?;
        self.notify(StoreChange::Ai(data.ai));
        Ok(())
    }

    fn write(&self, data: &StoreData) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    fn notify(&self, change: StoreChange) {
        // No subscribers is fine
        if self.changes.send(change).is_err() {
            debug!("store change dropped, nobody is listening");
        }
    }
}

/// Find a snippet by shortcut
pub fn find_snippet<'a>(snippets: &'a [Snippet], shortcut: &str) -> Option<&'a Snippet> {
    snippets.iter().find(|entry| entry.shortcut == shortcut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("db").join("quickfill.json"));
        (dir, store)
    }

    #[test]
    fn missing_and_empty_files_read_as_empty() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load().unwrap(), StoreData::default());

        ensure_parent_dir(store.path()).unwrap();
        fs::write(store.path(), "  \n").unwrap();
        assert!(store.load_snippets().unwrap().is_empty());
    }

    #[test]
    fn save_snippet_assigns_id_and_updates_in_place() {
        let (_dir, store) = temp_store();
        let mut draft = Snippet::new("/sig", "Regards");
        draft.id.clear();

        let saved = store.save_snippet(draft).unwrap();
        assert!(!saved.id.is_empty());

        let mut edited = saved.clone();
        edited.text = "Best regards".to_string();
        store.save_snippet(edited).unwrap();

        let snippets = store.load_snippets().unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].id, saved.id);
        assert_eq!(snippets[0].text, "Best regards");
    }

    #[test]
    fn duplicate_shortcuts_are_rejected() {
        let (_dir, store) = temp_store();
        store.save_snippet(Snippet::new("/a", "one")).unwrap();
        let err = store.save_snippet(Snippet::new("/a", "two")).unwrap_err();
        assert!(matches!(err, QuickfillError::DuplicateShortcut(s) if s == "/a"));
    }

    #[test]
    fn saving_with_a_category_registers_it_once() {
        let (_dir, store) = temp_store();
        store
            .save_snippet(Snippet::new("/a", "one").with_category("work"))
            .unwrap();
        store
            .save_snippet(Snippet::new("/b", "two").with_category("work"))
            .unwrap();
        store.save_category("home").unwrap();
        store.save_category("home").unwrap();
        assert_eq!(store.load_categories().unwrap(), vec!["work", "home"]);
    }

    #[test]
    fn delete_unknown_snippet_is_not_found() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.delete_snippet("nope"),
            Err(QuickfillError::NotFound(_))
        ));
    }

    #[test]
    fn variables_strip_braces_and_rename() {
        let (_dir, store) = temp_store();
        store.save_custom_variable("{name}", "Bob", None).unwrap();
        store
            .save_custom_variable("fullname", "Bob Smith", Some("{name}"))
            .unwrap();

        let vars = store.load_custom_variables().unwrap();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("fullname").map(String::as_str), Some("Bob Smith"));

        store.delete_custom_variable("{fullname}").unwrap();
        assert!(store.load_custom_variables().unwrap().is_empty());
    }

    #[test]
    fn ai_config_requires_key_for_selected_provider() {
        let (_dir, store) = temp_store();
        let config = AiConfig {
            selected_provider: Some(crate::models::AiProvider::Deepseek),
            ..Default::default()
        };
        assert!(matches!(
            store.save_ai_config(config),
            Err(QuickfillError::InvalidConfig(_))
        ));
    }

    #[test]
    fn writes_broadcast_the_new_collection() {
        let (_dir, store) = temp_store();
        let mut changes = store.subscribe();
        store.save_custom_variable("name", "Bob", None).unwrap();

        match changes.try_recv().unwrap() {
            StoreChange::Variables(vars) => assert_eq!(vars["name"], "Bob"),
            other => panic!("unexpected change {:?}", other),
        }
    }
}
