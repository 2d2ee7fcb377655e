//! Demo data. None of this is derived from real activity.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

use crate::models::{ApplicationStatus, AutomationStats, JobListing, Notification, SearchParams};

const COMPANIES: [(&str, &str); 10] = [
    ("TechVision Inc.", "software"),
    ("DataMind", "data"),
    ("Cloud Systems", "cloud"),
    ("AI Innovations", "ai"),
    ("Digital Frontier", "frontend"),
    ("RapidGrowth Startup", "startup"),
    ("Enterprise Solutions", "enterprise"),
    ("Creative Tech", "creative"),
    ("SecurityFirst", "security"),
    ("MobileMasters", "mobile"),
];

const JOB_TITLES: [(&str, &[&str]); 10] = [
    ("software", &["Software Engineer", "Senior Developer", "Full-Stack Engineer", "Backend Developer", "DevOps Engineer", "Software Architect"]),
    ("data", &["Data Scientist", "Data Engineer", "Data Analyst", "Business Intelligence Developer", "Database Administrator"]),
    ("cloud", &["Cloud Engineer", "AWS Specialist", "Cloud Architect", "Azure Developer", "Cloud Operations Engineer"]),
    ("ai", &["AI Engineer", "Machine Learning Engineer", "NLP Specialist", "Computer Vision Engineer", "AI Research Scientist"]),
    ("frontend", &["Frontend Developer", "UI Engineer", "React Developer", "Angular Engineer", "Web Developer"]),
    ("startup", &["Full-Stack Developer", "Growth Engineer", "Product Developer", "Technical Co-Founder", "Startup Engineer"]),
    ("enterprise", &["Enterprise Architect", "Solutions Engineer", "Integration Specialist", "Systems Analyst", "IT Consultant"]),
    ("creative", &["UI/UX Engineer", "Creative Technologist", "Interactive Developer", "Digital Experience Engineer", "Product Designer"]),
    ("security", &["Security Engineer", "Cybersecurity Specialist", "Security Analyst", "Penetration Tester", "Security Consultant"]),
    ("mobile", &["Mobile Developer", "iOS Engineer", "Android Developer", "React Native Engineer", "Mobile App Architect"]),
];

const SKILLS: [(&str, &[&str]); 10] = [
    ("software", &["JavaScript", "Python", "Java", "Go", "Node.js", "Docker", "Kubernetes", "REST API", "Git"]),
    ("data", &["SQL", "Python", "R", "Hadoop", "Spark", "Tableau", "Power BI", "ETL", "Statistics"]),
    ("cloud", &["AWS", "Azure", "GCP", "Docker", "Kubernetes", "Terraform", "CloudFormation", "Serverless"]),
    ("ai", &["Python", "TensorFlow", "PyTorch", "NLP", "Computer Vision", "ML Ops", "Neural Networks"]),
    ("frontend", &["React", "TypeScript", "JavaScript", "HTML/CSS", "Redux", "Webpack", "UI/UX", "SASS"]),
    ("startup", &["Full-Stack", "React", "Node.js", "Agile", "DevOps", "Product Design", "Rapid Prototyping"]),
    ("enterprise", &["Java", "Spring", ".NET", "Oracle", "SAP", "Enterprise Architecture", "SOAP/REST"]),
    ("creative", &["JavaScript", "Three.js", "WebGL", "CSS Animation", "UX Design", "Creative Coding", "SVG"]),
    ("security", &["Network Security", "OWASP", "Ethical Hacking", "Encryption", "Vulnerability Assessment"]),
    ("mobile", &["Swift", "Kotlin", "React Native", "Flutter", "Mobile UI", "iOS", "Android", "App Store"]),
];

const LOCATIONS: [&str; 12] = [
    "New York, NY", "San Francisco, CA", "Seattle, WA", "Austin, TX", "Boston, MA", "Chicago, IL",
    "Los Angeles, CA", "Denver, CO", "Atlanta, GA", "Remote", "Washington, DC", "Portland, OR",
];

const SALARY_RANGES: [&str; 8] = [
    "$100,000 - $130,000", "$80,000 - $100,000", "$120,000 - $150,000", "$90,000 - $115,000",
    "$140,000 - $180,000", "$75,000 - $95,000", "$130,000 - $160,000", "Competitive Salary",
];

const POSTED_DATES: [&str; 9] = [
    "Today", "Yesterday", "2 days ago", "3 days ago", "Last week", "1 week ago", "2 weeks ago",
    "3 weeks ago", "Last month",
];

const SUMMARY_TEMPLATES: [&str; 5] = [
    "We are looking for a talented %TITLE% to join our team. You will be responsible for developing %DOMAIN% solutions and working closely with our cross-functional teams. The ideal candidate has strong %SKILLS% skills.",
    "Join our innovative team as a %TITLE%. In this role, you will design and build %DOMAIN% systems, collaborate with product managers, and create high-quality solutions. We value expertise in %SKILLS%.",
    "Exciting opportunity for a %TITLE% to make an impact at our growing company. You will architect scalable %DOMAIN% solutions and mentor junior team members. Strong background in %SKILLS% required.",
    "As a %TITLE%, you will be at the forefront of our %DOMAIN% initiatives, developing robust solutions and optimizing performance. Must have experience with %SKILLS%.",
    "We're seeking an experienced %TITLE% to help build our next-generation %DOMAIN% platform in an agile environment. Proficiency in %SKILLS% is essential.",
];

fn titles_for(domain: &str) -> &'static [&'static str] {
    JOB_TITLES
        .iter()
        .find(|(d, _)| *d == domain)
        .map(|(_, titles)| *titles)
        .unwrap_or(JOB_TITLES[0].1)
}

fn skills_for(domain: &str) -> &'static [&'static str] {
    SKILLS
        .iter()
        .find(|(d, _)| *d == domain)
        .map(|(_, skills)| *skills)
        .unwrap_or(SKILLS[0].1)
}

/// Last domain whose titles mention the role (or whose name does); `software` otherwise.
pub fn matching_domain(role: &str) -> &'static str {
    let term = role.trim().to_lowercase();
    if term.is_empty() {
        return "software";
    }
    JOB_TITLES
        .iter()
        .filter(|(domain, titles)| {
            domain.contains(term.as_str()) || titles.iter().any(|t| t.to_lowercase().contains(&term))
        })
        .map(|(domain, _)| *domain)
        .last()
        .unwrap_or("software")
}

pub fn generate_listings<R: Rng + ?Sized>(params: &SearchParams, count: usize, rng: &mut R) -> Vec<JobListing> {
    let platforms: Vec<&str> = params.enabled_platforms().map(|p| p.name.as_str()).collect();
    if platforms.is_empty() {
        return Vec::new();
    }

    let domain = matching_domain(&params.role);
    let term = params.role.trim().to_lowercase();
    let relevant: Vec<String> = titles_for(domain)
        .iter()
        .filter(|t| {
            let t = t.to_lowercase();
            !term.is_empty() && (t.contains(&term) || term.contains(&t))
        })
        .map(|t| t.to_string())
        .collect();
    let titles = if relevant.is_empty() {
        vec![params.role.trim().to_string()]
    } else {
        relevant
    };

    let company = COMPANIES
        .iter()
        .find(|(_, d)| *d == domain)
        .map(|(name, _)| *name)
        .unwrap_or(COMPANIES[0].0);
    let domain_skills = skills_for(domain);
    let stamp = Utc::now().timestamp_millis();

    (0..count)
        .map(|i| {
            let title = titles.choose(rng).cloned().unwrap_or_default();
            let location = params
                .location
                .clone()
                .unwrap_or_else(|| LOCATIONS.choose(rng).copied().unwrap_or("Remote").to_string());
            let platform = platforms.choose(rng).copied().unwrap_or_default();

            let mut skills: Vec<String> = domain_skills.iter().map(|s| s.to_string()).collect();
            skills.shuffle(rng);
            skills.truncate(rng.gen_range(3..=5));

            let template = SUMMARY_TEMPLATES.choose(rng).copied().unwrap_or(SUMMARY_TEMPLATES[0]);
            let summary = template
                .replace("%TITLE%", &title)
                .replace("%DOMAIN%", domain)
                .replace("%SKILLS%", &skills[..skills.len().min(3)].join(", "));

            JobListing {
                id: format!("job-{}-{}", i, stamp),
                title,
                company: company.to_string(),
                location,
                platform: platform.to_string(),
                url: format!("https://example.com/jobs/{}", i),
                posted_date: POSTED_DATES.choose(rng).map(|d| d.to_string()),
                summary: Some(summary),
                match_score: Some(rng.gen_range(40..=99)),
                salary: if rng.gen_bool(0.7) {
                    SALARY_RANGES.choose(rng).map(|s| s.to_string())
                } else {
                    None
                },
                skills,
                saved: rng.gen_bool(0.2),
                applied: rng.gen_bool(0.1),
            }
        })
        .collect()
}

pub fn automation_stats() -> AutomationStats {
    AutomationStats {
        total_applications: 45,
        successful_applications: 32,
        failed_applications: 13,
        average_match_score: 78.5,
        applications_by_platform: BTreeMap::from([
            ("LinkedIn".to_string(), 20),
            ("Indeed".to_string(), 15),
            ("Glassdoor".to_string(), 10),
        ]),
        applications_by_day: BTreeMap::from([
            ("2024-02-01".to_string(), 5),
            ("2024-02-02".to_string(), 8),
            ("2024-02-03".to_string(), 12),
        ]),
    }
}

pub fn recent_applications(now: DateTime<Utc>) -> Vec<ApplicationStatus> {
    vec![
        ApplicationStatus {
            job_id: "1".to_string(),
            timestamp: now,
            status: "submitted".to_string(),
            match_score: 85,
            error: None,
        },
        ApplicationStatus {
            job_id: "2".to_string(),
            timestamp: now - Duration::days(1),
            status: "pending".to_string(),
            match_score: 72,
            error: None,
        },
        ApplicationStatus {
            job_id: "3".to_string(),
            timestamp: now - Duration::days(2),
            status: "failed".to_string(),
            match_score: 45,
            error: Some("Application form not accessible".to_string()),
        },
    ]
}

pub fn notifications() -> Vec<Notification> {
    vec![
        Notification {
            id: "1".to_string(),
            message: "New job match found for \"Frontend Developer\"".to_string(),
            unread: true,
        },
        Notification {
            id: "2".to_string(),
            message: "Application submitted successfully".to_string(),
            unread: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::new_search;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_matching_domain() {
        assert_eq!(matching_domain("Data Engineer"), "data");
        assert_eq!(matching_domain("security"), "security");
        assert_eq!(matching_domain("Underwater Basket Weaver"), "software");
        assert_eq!(matching_domain(""), "software");
        // "react" appears in both frontend and mobile titles; the last domain wins
        assert_eq!(matching_domain("react"), "mobile");
    }

    #[test]
    fn test_generate_listings_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let params = new_search("Data Engineer", None);
        let listings = generate_listings(&params, 15, &mut rng);

        assert_eq!(listings.len(), 15);
        let ids: HashSet<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), 15);

        for listing in &listings {
            assert_eq!(listing.title, "Data Engineer");
            assert_eq!(listing.company, "DataMind");
            assert!(["LinkedIn", "Indeed"].contains(&listing.platform.as_str()));
            assert!((3..=5).contains(&listing.skills.len()));
            assert!(listing.summary.as_deref().unwrap().contains("Data Engineer"));
            let score = listing.match_score.unwrap();
            assert!((40..=99).contains(&score));
        }
    }

    #[test]
    fn test_generate_listings_uses_requested_location() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = new_search("Cloud", Some("Denver, CO"));
        let listings = generate_listings(&params, 5, &mut rng);
        assert!(listings.iter().all(|l| l.location == "Denver, CO"));
    }

    #[test]
    fn test_unmatched_role_becomes_title() {
        let mut rng = StdRng::seed_from_u64(3);
        let params = new_search("Lighthouse Keeper", None);
        let listings = generate_listings(&params, 3, &mut rng);
        assert!(listings.iter().all(|l| l.title == "Lighthouse Keeper"));
        assert!(listings.iter().all(|l| l.company == "TechVision Inc."));
    }

    #[test]
    fn test_no_enabled_platforms_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut params = new_search("Engineer", None);
        for platform in &mut params.platforms {
            platform.enabled = false;
        }
        assert!(generate_listings(&params, 10, &mut rng).is_empty());
    }

    #[test]
    fn test_automation_stats_are_consistent() {
        let stats = automation_stats();
        assert_eq!(
            stats.successful_applications + stats.failed_applications,
            stats.total_applications
        );
        assert_eq!(stats.applications_by_platform.values().sum::<u32>(), 45);
    }

    #[test]
    fn test_recent_applications_are_newest_first() {
        let now = Utc::now();
        let apps = recent_applications(now);
        assert_eq!(apps.len(), 3);
        assert!(apps.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
        assert_eq!(apps[2].error.as_deref(), Some("Application form not accessible"));
    }
}
