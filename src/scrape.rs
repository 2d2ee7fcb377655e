use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ScrapeError;
use crate::models::JobListing;

pub const PLATFORM: &str = "Indeed";

// Result card layouts, newest first.
const BLOCK_SELECTORS: [&str; 3] = ["div.job_seen_beacon", "td.resultContent", "a.tapItem"];
const TITLE_SELECTORS: [&str; 3] = ["h2.jobTitle span[title]", "h2.jobTitle", ".jobTitle"];
const COMPANY_SELECTORS: [&str; 3] = ["[data-testid='company-name']", "span.companyName", ".companyName"];
const LOCATION_SELECTORS: [&str; 3] = ["[data-testid='text-location']", "div.companyLocation", ".companyLocation"];
const LINK_SELECTORS: [&str; 3] = ["h2.jobTitle a[href]", "a.jcs-JobTitle[href]", "a[href*='jk=']"];
const SUMMARY_SELECTORS: [&str; 2] = [".job-snippet", "[data-testid='jobsnippet_footer']"];
const DATE_SELECTORS: [&str; 2] = ["span.date", "[data-testid='myJobsStateDate']"];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

pub struct JobBoardScraper {
    client: reqwest::blocking::Client,
    search_url: String,
}

impl JobBoardScraper {
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            search_url: config.search_url.clone(),
        })
    }

    pub fn search_url(&self, role: &str, location: Option<&str>) -> Result<Url, ScrapeError> {
        Url::parse_with_params(
            &self.search_url,
            &[("q", role.trim()), ("l", location.unwrap_or("").trim())],
        )
        .map_err(|e| ScrapeError::Url(format!("{}: {}", self.search_url, e)))
    }

    /// One GET, one parse. Any failure is returned as-is; there is no retry.
    pub fn fetch_listings(&self, role: &str, location: Option<&str>) -> Result<Vec<JobListing>, ScrapeError> {
        let url = self.search_url(role, location)?;
        info!(%url, "fetching job board results");

        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "job board returned an error status");
            return Err(ScrapeError::Status(status.as_u16()));
        }

        let body = response.text()?;
        let listings = parse_listings(&body, &url);
        if listings.is_empty() {
            warn!(bytes = body.len(), "no result blocks matched");
            return Err(ScrapeError::Empty);
        }

        info!(count = listings.len(), "parsed listings");
        Ok(listings)
    }
}

/// Maps each result block to a listing. Missing fields stay blank.
pub fn parse_listings(html: &str, base: &Url) -> Vec<JobListing> {
    let document = Html::parse_document(html);

    let blocks: Vec<ElementRef> = BLOCK_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .map(|selector| document.select(&selector).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();
    debug!(blocks = blocks.len(), "matched result blocks");

    let mut seen_ids = HashSet::new();
    let mut listings = Vec::new();

    for (n, block) in blocks.into_iter().enumerate() {
        let title = first_text(block, &TITLE_SELECTORS).unwrap_or_default();
        let link = first_link(block);

        if title.is_empty() && link.is_none() {
            continue;
        }

        let url = link
            .as_deref()
            .and_then(|href| base.join(href).ok())
            .map(|u| u.to_string())
            .unwrap_or_default();

        let mut id = job_key(block)
            .map(|jk| format!("indeed-{}", jk))
            .filter(|id| !seen_ids.contains(id))
            .unwrap_or_else(|| format!("indeed-{}", n));
        let mut suffix = 1;
        while seen_ids.contains(&id) {
            id = format!("indeed-{}-{}", n, suffix);
            suffix += 1;
        }
        seen_ids.insert(id.clone());

        listings.push(JobListing {
            id,
            title,
            company: first_text(block, &COMPANY_SELECTORS).unwrap_or_default(),
            location: first_text(block, &LOCATION_SELECTORS).unwrap_or_default(),
            platform: PLATFORM.to_string(),
            url,
            posted_date: first_text(block, &DATE_SELECTORS).map(|d| clean_posted_date(&d)),
            summary: first_text(block, &SUMMARY_SELECTORS),
            match_score: None,
            salary: None,
            skills: Vec::new(),
            saved: false,
            applied: false,
        });
    }

    listings
}

fn first_text(block: ElementRef, selectors: &[&str]) -> Option<String> {
    for selector in selectors.iter().filter_map(|s| Selector::parse(s).ok()) {
        if let Some(element) = block.select(&selector).next() {
            let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn first_link(block: ElementRef) -> Option<String> {
    // The block itself is the anchor in the oldest layout.
    if let Some(href) = block.value().attr("href") {
        return Some(href.to_string());
    }
    LINK_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            block
                .select(&selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string)
        })
}

fn job_key(block: ElementRef) -> Option<String> {
    if let Some(jk) = block.value().attr("data-jk") {
        return Some(jk.to_string());
    }
    let selector = Selector::parse("[data-jk]").ok()?;
    block
        .select(&selector)
        .next()
        .and_then(|e| e.value().attr("data-jk"))
        .filter(|jk| !jk.is_empty())
        .map(str::to_string)
}

fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

fn clean_posted_date(text: &str) -> String {
    // Indeed renders a hidden "Posted" label in front of the visible one.
    text.trim_start_matches("Posted").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::path::Path;

    const RESULTS_PAGE: &str = r#"
        <html><body><div id="mosaic-jobResults">
          <div class="job_seen_beacon">
            <h2 class="jobTitle"><a class="jcs-JobTitle" data-jk="a1b2c3" href="/rc/clk?jk=a1b2c3&amp;from=serp">
              <span title="Senior Rust Engineer">Senior   Rust
                Engineer</span></a></h2>
            <span data-testid="company-name">Ferrous Systems</span>
            <div data-testid="text-location">Remote</div>
            <div class="job-snippet"><ul><li>Own the async runtime.</li></ul></div>
            <span class="date">PostedPosted 3 days ago</span>
          </div>
          <div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="https://www.indeed.com/viewjob?jk=zz9">Platform Engineer</a></h2>
            <div data-testid="text-location">Austin, TX</div>
          </div>
          <div class="job_seen_beacon">
            <span data-testid="company-name">No Title Or Link Inc</span>
          </div>
        </div></body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://www.indeed.com/jobs?q=rust").unwrap()
    }

    #[test]
    fn test_parse_listings_maps_fields() {
        let listings = parse_listings(RESULTS_PAGE, &base());
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.id, "indeed-a1b2c3");
        assert_eq!(first.title, "Senior Rust Engineer");
        assert_eq!(first.company, "Ferrous Systems");
        assert_eq!(first.location, "Remote");
        assert_eq!(first.platform, "Indeed");
        assert_eq!(first.url, "https://www.indeed.com/rc/clk?jk=a1b2c3&from=serp");
        assert_eq!(first.summary.as_deref(), Some("Own the async runtime."));
        assert_eq!(first.posted_date.as_deref(), Some("3 days ago"));
    }

    #[test]
    fn test_parse_listings_leaves_missing_fields_blank() {
        let listings = parse_listings(RESULTS_PAGE, &base());
        let second = &listings[1];
        assert_eq!(second.id, "indeed-1");
        assert_eq!(second.title, "Platform Engineer");
        assert_eq!(second.company, "");
        assert_eq!(second.url, "https://www.indeed.com/viewjob?jk=zz9");
        assert_eq!(second.summary, None);
        assert_eq!(second.posted_date, None);
    }

    #[test]
    fn test_parse_listings_older_layout() {
        let html = r#"
            <a class="tapItem" href="/viewjob?jk=old1">
              <h2 class="jobTitle">Data Analyst</h2>
              <span class="companyName">DataMind</span>
              <div class="companyLocation">Boston, MA</div>
            </a>"#;
        let listings = parse_listings(html, &base());
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Data Analyst");
        assert_eq!(listings[0].company, "DataMind");
        assert_eq!(listings[0].location, "Boston, MA");
    }

    #[test]
    fn test_duplicate_job_keys_get_distinct_ids() {
        let html = r#"
            <div class="job_seen_beacon" data-jk="dup"><h2 class="jobTitle">One</h2></div>
            <div class="job_seen_beacon" data-jk="dup"><h2 class="jobTitle">Two</h2></div>"#;
        let listings = parse_listings(html, &base());
        assert_eq!(listings[0].id, "indeed-dup");
        assert_eq!(listings[1].id, "indeed-1");
    }

    #[test]
    fn test_positional_id_never_reuses_a_job_key_id() {
        let html = r#"
            <div class="job_seen_beacon" data-jk="1"><h2 class="jobTitle">One</h2></div>
            <div class="job_seen_beacon"><h2 class="jobTitle">Two</h2></div>
            <div class="job_seen_beacon" data-jk="1"><h2 class="jobTitle">Three</h2></div>"#;
        let listings = parse_listings(html, &base());
        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["indeed-1", "indeed-1-1", "indeed-2"]);
    }

    #[test]
    fn test_no_blocks_parses_to_nothing() {
        assert!(parse_listings("<html><body><p>captcha</p></body></html>", &base()).is_empty());
    }

    #[test]
    fn test_search_url_encodes_role_and_location() {
        let config = Config::from_env().unwrap().with_data_dir(Path::new("/tmp"));
        let scraper = JobBoardScraper {
            client: reqwest::blocking::Client::new(),
            search_url: "https://www.indeed.com/jobs".to_string(),
        };
        let url = scraper.search_url("C++ Developer", Some("New York, NY")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.indeed.com/jobs?q=C%2B%2B+Developer&l=New+York%2C+NY"
        );
        let url = scraper.search_url("dev", None).unwrap();
        assert_eq!(url.query(), Some("q=dev&l="));
        assert!(JobBoardScraper::new(&config).is_ok());
    }

    fn scraper_for(server: &MockServer) -> JobBoardScraper {
        let mut config = Config::from_env().unwrap();
        config.search_url = server.url("/jobs");
        config.user_agent = "jobpicker-test/1.0".to_string();
        JobBoardScraper::new(&config).unwrap()
    }

    #[test]
    fn test_fetch_listings_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::GET)
                .path("/jobs")
                .query_param("q", "rust")
                .query_param("l", "remote")
                .header("user-agent", "jobpicker-test/1.0");
            then.status(200).header("content-type", "text/html").body(RESULTS_PAGE);
        });

        let listings = scraper_for(&server).fetch_listings("rust", Some("remote")).unwrap();
        mock.assert();
        assert_eq!(listings.len(), 2);
        assert!(listings[0].url.starts_with(&server.base_url()));
    }

    #[test]
    fn test_fetch_listings_sends_blank_location() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::GET).path("/jobs").query_param("q", "Data Analyst").query_param("l", "");
            then.status(200).body(RESULTS_PAGE);
        });

        scraper_for(&server).fetch_listings("  Data Analyst ", None).unwrap();
        mock.assert();
    }

    #[test]
    fn test_fetch_listings_non_success_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(Method::GET).path("/jobs");
            then.status(403).body("blocked");
        });
        let err = scraper_for(&server).fetch_listings("rust", None).unwrap_err();
        assert!(matches!(err, ScrapeError::Status(403)));
    }

    #[test]
    fn test_fetch_listings_empty_result_set() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(Method::GET).path("/jobs");
            then.status(200).body("<html><body></body></html>");
        });
        let err = scraper_for(&server).fetch_listings("rust", None).unwrap_err();
        assert!(matches!(err, ScrapeError::Empty));
    }

    #[test]
    fn test_fetch_listings_network_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut config = Config::from_env().unwrap();
        config.search_url = format!("http://127.0.0.1:{}/jobs", port);
        let err = JobBoardScraper::new(&config).unwrap().fetch_listings("rust", None).unwrap_err();
        assert!(matches!(err, ScrapeError::Network(_)));
    }
}
