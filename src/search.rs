use anyhow::{anyhow, Result};

use crate::models::{Platform, SearchParams};

pub fn default_platforms() -> Vec<Platform> {
    vec![
        Platform {
            id: "1".to_string(),
            name: "LinkedIn".to_string(),
            url: "https://www.linkedin.com/jobs".to_string(),
            topic: None,
            enabled: true,
        },
        Platform {
            id: "2".to_string(),
            name: "Indeed".to_string(),
            url: "https://www.indeed.com".to_string(),
            topic: None,
            enabled: true,
        },
        Platform {
            id: "3".to_string(),
            name: "Glassdoor".to_string(),
            url: "https://www.glassdoor.com".to_string(),
            topic: None,
            enabled: false,
        },
    ]
}

pub fn new_search(role: &str, location: Option<&str>) -> SearchParams {
    SearchParams {
        role: role.trim().to_string(),
        location: location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string),
        platforms: default_platforms(),
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        new_search("", None)
    }
}

impl SearchParams {
    pub fn enabled_platforms(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.iter().filter(|p| p.enabled)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled_platforms().any(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Flips a platform's enabled flag; returns the new state, or `None` for an unknown id.
    pub fn toggle_platform(&mut self, id: &str) -> Option<bool> {
        let platform = self.platforms.iter_mut().find(|p| p.id == id)?;
        platform.enabled = !platform.enabled;
        Some(platform.enabled)
    }

    pub fn set_platform_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.platforms.iter_mut().find(|p| p.name.eq_ignore_ascii_case(name)) {
            Some(platform) => {
                platform.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Name, URL and topic are all required. New platforms start enabled.
    pub fn add_platform(&mut self, name: &str, url: &str, topic: &str) -> Result<&Platform> {
        let (name, url, topic) = (name.trim(), url.trim(), topic.trim());
        if name.is_empty() || url.is_empty() || topic.is_empty() {
            return Err(anyhow!("Platform name, URL and topic are all required"));
        }
        reqwest::Url::parse(url).map_err(|e| anyhow!("Invalid platform URL '{}': {}", url, e))?;
        if self.platforms.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            return Err(anyhow!("Platform '{}' already exists", name));
        }

        let next_id = self
            .platforms
            .iter()
            .filter_map(|p| p.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        self.platforms.push(Platform {
            id: next_id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            topic: Some(topic.to_string()),
            enabled: true,
        });
        Ok(&self.platforms[self.platforms.len() - 1])
    }

    pub fn remove_platform(&mut self, id: &str) -> Option<Platform> {
        let idx = self.platforms.iter().position(|p| p.id == id)?;
        Some(self.platforms.remove(idx))
    }

    pub fn validate(&self) -> Result<()> {
        if self.role.trim().is_empty() {
            return Err(anyhow!("Enter a role to search for"));
        }
        if self.enabled_platforms().next().is_none() {
            return Err(anyhow!("Enable at least one platform"));
        }
        Ok(())
    }

    pub fn label(&self) -> String {
        match &self.location {
            Some(location) => format!("{} in {}", self.role, location),
            None => self.role.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_platforms() {
        let params = SearchParams::default();
        let enabled: Vec<&str> = params.enabled_platforms().map(|p| p.name.as_str()).collect();
        assert_eq!(enabled, vec!["LinkedIn", "Indeed"]);
        assert!(!params.is_enabled("glassdoor"));
    }

    #[test]
    fn test_toggle_platform() {
        let mut params = SearchParams::default();
        assert_eq!(params.toggle_platform("3"), Some(true));
        assert!(params.is_enabled("Glassdoor"));
        assert_eq!(params.toggle_platform("3"), Some(false));
        assert_eq!(params.toggle_platform("missing"), None);
    }

    #[test]
    fn test_add_platform_requires_all_fields() {
        let mut params = SearchParams::default();
        assert!(params.add_platform("Dice", "https://www.dice.com", "").is_err());
        assert!(params.add_platform("", "https://www.dice.com", "tech").is_err());
        assert!(params.add_platform("Dice", "not a url", "tech").is_err());
        assert_eq!(params.platforms.len(), 3);
    }

    #[test]
    fn test_add_platform_assigns_fresh_id() {
        let mut params = SearchParams::default();
        let added = params.add_platform("Dice", "https://www.dice.com", "tech").unwrap();
        assert_eq!(added.id, "4");
        assert!(added.enabled);
        assert_eq!(added.topic.as_deref(), Some("tech"));
        assert!(params.add_platform("dice", "https://dice.com", "tech").is_err());
    }

    #[test]
    fn test_remove_platform() {
        let mut params = SearchParams::default();
        let removed = params.remove_platform("1").unwrap();
        assert_eq!(removed.name, "LinkedIn");
        assert!(params.remove_platform("1").is_none());
        assert_eq!(params.platforms.len(), 2);
    }

    #[test]
    fn test_validate() {
        let mut params = new_search("   ", None);
        assert!(params.validate().is_err());

        params.role = "Data Engineer".to_string();
        assert!(params.validate().is_ok());

        params.set_platform_enabled("LinkedIn", false);
        params.set_platform_enabled("Indeed", false);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_new_search_drops_blank_location() {
        assert_eq!(new_search("Dev", Some("  ")).location, None);
        assert_eq!(new_search(" Dev ", Some(" Austin, TX ")).label(), "Dev in Austin, TX");
    }
}
