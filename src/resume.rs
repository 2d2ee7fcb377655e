use chrono::Utc;
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::UploadError;
use crate::models::{Resume, ResumeAnalysis};

const PROGRESS_STEP: u8 = 10;

// Filenames containing these fail on purpose so the error path can be demoed.
const FAILURE_MARKERS: [&str; 3] = ["fail", "corrupt", "error"];

const SUGGESTIONS: [&str; 7] = [
    "Add more quantifiable achievements",
    "Include relevant certifications",
    "Optimize keywords for ATS systems",
    "Shorten the summary to three lines",
    "Lead each bullet with an action verb",
    "Move education below experience",
    "Link to a portfolio or GitHub profile",
];

const IN_DEMAND_KEYWORDS: [&str; 8] = [
    "Docker", "AWS", "Python", "Kubernetes", "CI/CD", "GraphQL", "Terraform", "SQL",
];

/// Simulates an upload: validates the file, then reports progress in steps of ten.
/// The file is never read beyond its metadata.
pub fn upload<F>(path: &Path, step_delay: Duration, mut on_progress: F) -> Result<Resume, UploadError>
where
    F: FnMut(u8),
{
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(UploadError::NotPdf);
    }

    let metadata = std::fs::metadata(path).map_err(|_| UploadError::Missing(path.display().to_string()))?;

    let mut progress = 0u8;
    while progress <= 100 {
        on_progress(progress);
        if !step_delay.is_zero() {
            thread::sleep(step_delay);
        }
        progress += PROGRESS_STEP;
    }

    let lower = name.to_lowercase();
    if let Some(marker) = FAILURE_MARKERS.iter().find(|m| lower.contains(*m)) {
        warn!(file = %name, marker, "simulated upload failure");
        return Err(UploadError::Simulated(format!("server rejected '{}'", name)));
    }

    info!(file = %name, bytes = metadata.len(), "resume uploaded");
    Ok(Resume {
        id: String::new(),
        name,
        size_bytes: metadata.len(),
        uploaded_at: Utc::now(),
        skills: vec!["React".to_string(), "TypeScript".to_string(), "Node.js".to_string()],
        experience: vec!["Software Engineer at Tech Co".to_string()],
        education: vec!["BS in Computer Science".to_string()],
    })
}

/// Randomized; the resume's content plays no part.
pub fn analyze<R: Rng + ?Sized>(resume: &Resume, rng: &mut R) -> ResumeAnalysis {
    let suggestions = SUGGESTIONS
        .choose_multiple(rng, 3)
        .map(|s| s.to_string())
        .collect();

    let missing: Vec<&str> = IN_DEMAND_KEYWORDS
        .iter()
        .copied()
        .filter(|k| !resume.skills.iter().any(|s| s.eq_ignore_ascii_case(k)))
        .collect();
    let missing_keywords = missing
        .choose_multiple(rng, 3)
        .map(|s| s.to_string())
        .collect();

    ResumeAnalysis {
        score: rng.gen_range(55..=95),
        suggestions,
        keywords: resume.skills.clone(),
        missing_keywords,
    }
}

pub fn score_band(score: u8) -> &'static str {
    if score > 80 {
        "strong"
    } else if score > 60 {
        "fair"
    } else {
        "weak"
    }
}

/// In-memory resumes for the current session.
#[derive(Debug, Default)]
pub struct ResumeStore {
    resumes: Vec<Resume>,
    next_id: u64,
}

impl ResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next free id and returns it.
    pub fn add(&mut self, mut resume: Resume) -> String {
        self.next_id += 1;
        resume.id = self.next_id.to_string();
        let id = resume.id.clone();
        self.resumes.push(resume);
        id
    }

    pub fn get(&self, id: &str) -> Option<&Resume> {
        self.resumes.iter().find(|r| r.id == id)
    }

    pub fn latest(&self) -> Option<&Resume> {
        self.resumes.last()
    }

    pub fn list(&self) -> &[Resume] {
        &self.resumes
    }

    pub fn remove(&mut self, id: &str) -> Option<Resume> {
        let idx = self.resumes.iter().position(|r| r.id == id)?;
        Some(self.resumes.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;

    fn write_file(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"%PDF-1.4 fake").unwrap();
        path
    }

    #[test]
    fn test_upload_reports_progress_to_100() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "jane_doe.PDF");
        let mut steps = Vec::new();

        let resume = upload(&path, Duration::ZERO, |p| steps.push(p)).unwrap();

        assert_eq!(steps, (0..=100).step_by(10).collect::<Vec<u8>>());
        assert_eq!(resume.name, "jane_doe.PDF");
        assert_eq!(resume.size_bytes, 13);
    }

    #[test]
    fn test_upload_rejects_non_pdf() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "resume.docx");
        let err = upload(&path, Duration::ZERO, |_| {}).unwrap_err();
        assert!(matches!(err, UploadError::NotPdf));
    }

    #[test]
    fn test_upload_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = upload(&tmp.path().join("ghost.pdf"), Duration::ZERO, |_| {}).unwrap_err();
        assert!(matches!(err, UploadError::Missing(_)));
    }

    #[test]
    fn test_upload_failure_heuristic() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["fail.pdf", "Corrupt-resume.pdf", "my_error.pdf"] {
            let path = write_file(tmp.path(), name);
            let err = upload(&path, Duration::ZERO, |_| {}).unwrap_err();
            assert!(matches!(err, UploadError::Simulated(_)), "{} should fail", name);
        }
    }

    #[test]
    fn test_analyze_is_mocked_but_well_formed() {
        let tmp = tempfile::tempdir().unwrap();
        let resume = upload(&write_file(tmp.path(), "cv.pdf"), Duration::ZERO, |_| {}).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let analysis = analyze(&resume, &mut rng);
        assert!((55..=95).contains(&analysis.score));
        assert_eq!(analysis.suggestions.len(), 3);
        assert_eq!(analysis.keywords, resume.skills);
        assert_eq!(analysis.missing_keywords.len(), 3);
        for kw in &analysis.missing_keywords {
            assert!(!resume.skills.contains(kw));
        }
    }

    #[test]
    fn test_score_band() {
        assert_eq!(score_band(81), "strong");
        assert_eq!(score_band(80), "fair");
        assert_eq!(score_band(60), "weak");
    }

    #[test]
    fn test_store_ids_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let resume = upload(&write_file(tmp.path(), "a.pdf"), Duration::ZERO, |_| {}).unwrap();
        let mut store = ResumeStore::new();

        let first = store.add(resume.clone());
        let second = store.add(resume.clone());
        assert_ne!(first, second);

        store.remove(&first);
        let third = store.add(resume);
        assert_ne!(third, second);
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.latest().unwrap().id, third);
        assert!(store.get(&first).is_none());
    }
}
