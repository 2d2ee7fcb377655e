use clap::ValueEnum;

use crate::models::{JobListing, RemotePreference, UserPreferences};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ListingFilter {
    #[default]
    All,
    Saved,
    Applied,
}

impl ListingFilter {
    pub fn label(&self) -> &'static str {
        match self {
            ListingFilter::All => "all",
            ListingFilter::Saved => "saved",
            ListingFilter::Applied => "applied",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ListingFilter::All => ListingFilter::Saved,
            ListingFilter::Saved => ListingFilter::Applied,
            ListingFilter::Applied => ListingFilter::All,
        }
    }

    fn matches(&self, listing: &JobListing) -> bool {
        match self {
            ListingFilter::All => true,
            ListingFilter::Saved => listing.saved,
            ListingFilter::Applied => listing.applied,
        }
    }
}

pub struct Page<'a> {
    pub items: &'a [JobListing],
    pub number: usize,
    pub total_pages: usize,
}

/// The result set of the current view session.
#[derive(Debug, Default)]
pub struct ListingView {
    listings: Vec<JobListing>,
}

impl ListingView {
    pub fn new(listings: Vec<JobListing>) -> Self {
        Self { listings }
    }

    /// Swaps in a new result set. Whatever arrives last wins.
    pub fn replace(&mut self, listings: Vec<JobListing>) {
        self.listings = listings;
    }

    pub fn all(&self) -> &[JobListing] {
        &self.listings
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn filtered(&self, filter: ListingFilter) -> Vec<JobListing> {
        self.listings
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect()
    }

    pub fn toggle_saved(&mut self, id: &str) -> Option<bool> {
        let listing = self.listings.iter_mut().find(|l| l.id == id)?;
        listing.saved = !listing.saved;
        Some(listing.saved)
    }

    pub fn mark_applied(&mut self, id: &str) -> bool {
        match self.listings.iter_mut().find(|l| l.id == id) {
            Some(listing) => {
                listing.applied = true;
                true
            }
            None => false,
        }
    }

    /// Drops blacklisted companies and applies the remote preference.
    /// Returns how many listings were removed.
    pub fn apply_preferences(&mut self, prefs: &UserPreferences) -> usize {
        let app = &prefs.application_preferences;
        let before = self.listings.len();
        self.listings.retain(|l| {
            let blocked = app
                .blacklisted_companies
                .iter()
                .any(|c| c.eq_ignore_ascii_case(l.company.trim()));
            let location = l.location.to_lowercase();
            let fits = match app.remote_preference {
                RemotePreference::Any => true,
                RemotePreference::Remote => location.contains("remote"),
                RemotePreference::Hybrid => location.contains("hybrid") || location.contains("remote"),
            };
            !blocked && fits
        });
        before - self.listings.len()
    }
}

/// Client-side slice of `items`; `number` is 1-based and clamped into range.
pub fn page(items: &[JobListing], number: usize, per_page: usize) -> Page<'_> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let number = number.clamp(1, total_pages);
    let start = (number - 1) * per_page;
    let end = (start + per_page).min(items.len());
    Page {
        items: &items[start.min(items.len())..end],
        number,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, company: &str, location: &str) -> JobListing {
        JobListing {
            id: id.to_string(),
            title: format!("Engineer {}", id),
            company: company.to_string(),
            location: location.to_string(),
            platform: "LinkedIn".to_string(),
            url: format!("https://example.com/jobs/{}", id),
            posted_date: None,
            summary: None,
            match_score: None,
            salary: None,
            skills: Vec::new(),
            saved: false,
            applied: false,
        }
    }

    fn sample() -> ListingView {
        ListingView::new(vec![
            listing("1", "Initech", "Remote"),
            listing("2", "Globex", "Austin, TX"),
            listing("3", "Hooli", "Hybrid - Seattle, WA"),
            listing("4", "initech ", "Boston, MA"),
        ])
    }

    #[test]
    fn test_toggle_saved_and_filter() {
        let mut view = sample();
        assert_eq!(view.toggle_saved("2"), Some(true));
        assert_eq!(view.toggle_saved("3"), Some(true));
        assert_eq!(view.toggle_saved("3"), Some(false));
        assert_eq!(view.toggle_saved("missing"), None);

        let saved = view.filtered(ListingFilter::Saved);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, "2");
        assert_eq!(view.filtered(ListingFilter::All).len(), 4);
    }

    #[test]
    fn test_mark_applied() {
        let mut view = sample();
        assert!(view.mark_applied("1"));
        assert!(!view.mark_applied("nope"));
        let applied = view.filtered(ListingFilter::Applied);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].id, "1");
        assert!(applied[0].applied);
    }

    #[test]
    fn test_apply_preferences_blacklist_is_case_insensitive() {
        let mut view = sample();
        let mut prefs = UserPreferences::default();
        prefs
            .application_preferences
            .blacklisted_companies
            .push("INITECH".to_string());
        assert_eq!(view.apply_preferences(&prefs), 2);
        let ids: Vec<&str> = view.all().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_apply_preferences_remote_only() {
        let mut view = sample();
        let mut prefs = UserPreferences::default();
        prefs.application_preferences.remote_preference = RemotePreference::Remote;
        view.apply_preferences(&prefs);
        assert_eq!(view.all().len(), 1);
        assert_eq!(view.all()[0].id, "1");

        let mut view = sample();
        prefs.application_preferences.remote_preference = RemotePreference::Hybrid;
        view.apply_preferences(&prefs);
        assert_eq!(view.all().len(), 2);
    }

    #[test]
    fn test_page_slices_and_clamps() {
        let view = sample();
        let items = view.all();

        let first = page(items, 1, 3);
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.total_pages, 2);

        let last = page(items, 2, 3);
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].id, "4");

        let beyond = page(items, 9, 3);
        assert_eq!(beyond.number, 2);
        let zero = page(items, 0, 3);
        assert_eq!(zero.number, 1);
    }

    #[test]
    fn test_page_of_nothing() {
        let empty = page(&[], 1, 5);
        assert!(empty.items.is_empty());
        assert_eq!(empty.total_pages, 1);
    }

    #[test]
    fn test_replace_discards_previous_results() {
        let mut view = sample();
        view.replace(vec![listing("9", "Umbrella", "Remote")]);
        assert_eq!(view.all().len(), 1);
        assert_eq!(view.all()[0].id, "9");
    }
}
