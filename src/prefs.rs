use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};

use crate::error::StorageError;
use crate::models::{AiProvider, AiSettings, RemotePreference, SearchParams, UserPreferences};
use crate::storage::LocalStorage;

pub const PREFERENCES_KEY: &str = "userPreferences";

pub type SharedStorage = Rc<RefCell<LocalStorage>>;

/// Holds the user's preferences and writes the whole record back on every change.
pub struct PreferencesStore {
    storage: SharedStorage,
    prefs: UserPreferences,
}

impl PreferencesStore {
    pub fn open(storage: SharedStorage) -> Self {
        let prefs = match storage.borrow().get_item(PREFERENCES_KEY) {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                warn!(error = %e, "stored preferences unreadable, using defaults");
                UserPreferences::default()
            }),
            None => UserPreferences::default(),
        };
        Self { storage, prefs }
    }

    pub fn get(&self) -> &UserPreferences {
        &self.prefs
    }

    fn update<F>(&mut self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut UserPreferences),
    {
        let mut next = self.prefs.clone();
        change(&mut next);
        let blob = serde_json::to_string(&next)?;
        self.storage.borrow_mut().set_item(PREFERENCES_KEY, blob)?;
        self.prefs = next;
        Ok(())
    }

    pub fn toggle_dark_mode(&mut self) -> Result<bool, StorageError> {
        self.update(|p| p.dark_mode = !p.dark_mode)?;
        Ok(self.prefs.dark_mode)
    }

    pub fn set_dark_mode(&mut self, on: bool) -> Result<(), StorageError> {
        self.update(|p| p.dark_mode = on)
    }

    pub fn set_ai_settings(&mut self, provider: AiProvider, api_key: Option<String>) -> Result<(), StorageError> {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        info!(provider = provider.as_str(), custom_key = api_key.is_some(), "updated AI settings");
        self.update(|p| p.ai_settings = AiSettings { provider, api_key })
    }

    pub fn set_job_search_api_key(&mut self, key: Option<String>) -> Result<(), StorageError> {
        self.update(|p| p.job_search_api_key = key.filter(|k| !k.trim().is_empty()))
    }

    pub fn set_auto_apply(&mut self, on: bool) -> Result<(), StorageError> {
        self.update(|p| p.auto_apply_enabled = on)
    }

    /// Adds the search unless an identical one is already saved.
    pub fn save_search(&mut self, search: SearchParams) -> Result<bool, StorageError> {
        if self.prefs.saved_searches.contains(&search) {
            return Ok(false);
        }
        self.update(|p| p.saved_searches.push(search))?;
        Ok(true)
    }

    pub fn remove_saved_search(&mut self, index: usize) -> Result<Option<SearchParams>, StorageError> {
        if index >= self.prefs.saved_searches.len() {
            return Ok(None);
        }
        let mut removed = None;
        self.update(|p| removed = Some(p.saved_searches.remove(index)))?;
        Ok(removed)
    }

    pub fn blacklist_company(&mut self, company: &str) -> Result<bool, StorageError> {
        let company = company.trim();
        if company.is_empty() || contains_ignore_case(&self.prefs.application_preferences.blacklisted_companies, company) {
            return Ok(false);
        }
        self.update(|p| {
            p.application_preferences
                .blacklisted_companies
                .push(company.to_string())
        })?;
        Ok(true)
    }

    pub fn unblacklist_company(&mut self, company: &str) -> Result<bool, StorageError> {
        let before = self.prefs.application_preferences.blacklisted_companies.len();
        self.update(|p| {
            p.application_preferences
                .blacklisted_companies
                .retain(|c| !c.eq_ignore_ascii_case(company.trim()))
        })?;
        Ok(self.prefs.application_preferences.blacklisted_companies.len() != before)
    }

    pub fn add_preferred_location(&mut self, location: &str) -> Result<bool, StorageError> {
        let location = location.trim();
        if location.is_empty() || contains_ignore_case(&self.prefs.application_preferences.preferred_locations, location) {
            return Ok(false);
        }
        self.update(|p| {
            p.application_preferences
                .preferred_locations
                .push(location.to_string())
        })?;
        Ok(true)
    }

    pub fn remove_preferred_location(&mut self, location: &str) -> Result<bool, StorageError> {
        let before = self.prefs.application_preferences.preferred_locations.len();
        self.update(|p| {
            p.application_preferences
                .preferred_locations
                .retain(|l| !l.eq_ignore_ascii_case(location.trim()))
        })?;
        Ok(self.prefs.application_preferences.preferred_locations.len() != before)
    }

    pub fn set_remote_preference(&mut self, pref: RemotePreference) -> Result<(), StorageError> {
        self.update(|p| p.application_preferences.remote_preference = pref)
    }

    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.update(|p| *p = UserPreferences::default())
    }
}

fn contains_ignore_case(list: &[String], value: &str) -> bool {
    list.iter().any(|v| v.eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search;
    use std::path::Path;

    fn shared(path: &Path) -> SharedStorage {
        Rc::new(RefCell::new(LocalStorage::open(path).unwrap()))
    }

    #[test]
    fn test_defaults_when_nothing_stored() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PreferencesStore::open(shared(&tmp.path().join("ls.json")));
        assert_eq!(store.get(), &UserPreferences::default());
        assert_eq!(store.get().ai_settings.provider, AiProvider::OpenAI);
        assert_eq!(store.get().application_preferences.remote_preference, RemotePreference::Any);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ls.json");

        let mut store = PreferencesStore::open(shared(&path));
        assert!(store.toggle_dark_mode().unwrap());
        store
            .set_ai_settings(AiProvider::GitHub, Some("gh-key".to_string()))
            .unwrap();
        store.blacklist_company("Initech").unwrap();
        store.add_preferred_location("Remote").unwrap();
        store.set_remote_preference(RemotePreference::Hybrid).unwrap();

        let reopened = PreferencesStore::open(shared(&path));
        let prefs = reopened.get();
        assert!(prefs.dark_mode);
        assert_eq!(prefs.ai_settings.provider, AiProvider::GitHub);
        assert_eq!(prefs.ai_settings.api_key.as_deref(), Some("gh-key"));
        assert_eq!(prefs.application_preferences.blacklisted_companies, vec!["Initech"]);
        assert_eq!(prefs.application_preferences.preferred_locations, vec!["Remote"]);
        assert_eq!(prefs.application_preferences.remote_preference, RemotePreference::Hybrid);
    }

    #[test]
    fn test_blob_uses_camel_case_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = shared(&tmp.path().join("ls.json"));
        let mut store = PreferencesStore::open(storage.clone());
        store.set_auto_apply(true).unwrap();

        let raw = storage.borrow().get_item(PREFERENCES_KEY).unwrap().to_string();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["autoApplyEnabled"], true);
        assert_eq!(value["darkMode"], false);
        assert_eq!(value["aiSettings"]["provider"], "openai");
        assert_eq!(value["applicationPreferences"]["remotePreference"], "any");
    }

    #[test]
    fn test_blacklist_ignores_case_and_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = PreferencesStore::open(shared(&tmp.path().join("ls.json")));
        assert!(store.blacklist_company("Initech").unwrap());
        assert!(!store.blacklist_company("initech").unwrap());
        assert!(!store.blacklist_company("   ").unwrap());
        assert!(store.unblacklist_company("INITECH").unwrap());
        assert!(!store.unblacklist_company("Initech").unwrap());
    }

    #[test]
    fn test_saved_searches_add_and_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = PreferencesStore::open(shared(&tmp.path().join("ls.json")));
        let search = search::new_search("Rust Developer", Some("Berlin"));

        assert!(store.save_search(search.clone()).unwrap());
        assert!(!store.save_search(search.clone()).unwrap());
        assert_eq!(store.get().saved_searches.len(), 1);

        assert_eq!(store.remove_saved_search(5).unwrap(), None);
        assert_eq!(store.remove_saved_search(0).unwrap(), Some(search));
        assert!(store.get().saved_searches.is_empty());
    }

    #[test]
    fn test_blank_ai_key_means_default_key() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = PreferencesStore::open(shared(&tmp.path().join("ls.json")));
        store.set_ai_settings(AiProvider::Google, Some("  ".to_string())).unwrap();
        assert_eq!(store.get().ai_settings.api_key, None);
    }

    #[test]
    fn test_unreadable_blob_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = shared(&tmp.path().join("ls.json"));
        storage
            .borrow_mut()
            .set_item(PREFERENCES_KEY, "[1, 2]".to_string())
            .unwrap();
        let store = PreferencesStore::open(storage);
        assert_eq!(store.get(), &UserPreferences::default());
    }

    #[test]
    fn test_failed_save_keeps_previous_preferences() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ls.json");
        let mut store = PreferencesStore::open(shared(&path));
        store.blacklist_company("Initech").unwrap();

        std::fs::create_dir(tmp.path().join("ls.json.tmp")).unwrap();
        assert!(store.toggle_dark_mode().is_err());
        assert!(store.blacklist_company("Globex").is_err());

        assert!(!store.get().dark_mode);
        assert_eq!(store.get().application_preferences.blacklisted_companies, vec!["Initech"]);
        assert_eq!(PreferencesStore::open(shared(&path)).get(), store.get());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ls.json");
        let mut store = PreferencesStore::open(shared(&path));
        store.set_dark_mode(true).unwrap();
        store.set_job_search_api_key(Some("k".to_string())).unwrap();
        store.reset().unwrap();
        assert_eq!(PreferencesStore::open(shared(&path)).get(), &UserPreferences::default());
    }
}
