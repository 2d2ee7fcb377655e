use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub platforms: Vec<Platform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub platform: String,
    pub url: String,
    pub posted_date: Option<String>,
    pub summary: Option<String>,
    pub match_score: Option<u8>,
    pub salary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub saved: bool,
    #[serde(default)]
    pub applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    #[value(name = "openai")]
    OpenAI,
    Google,
    #[value(name = "github")]
    GitHub,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAI => "openai",
            AiProvider::Google => "google",
            AiProvider::GitHub => "github",
        }
    }

    pub fn next(self) -> Self {
        match self {
            AiProvider::OpenAI => AiProvider::Google,
            AiProvider::Google => AiProvider::GitHub,
            AiProvider::GitHub => AiProvider::OpenAI,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub provider: AiProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RemotePreference {
    #[default]
    Any,
    Remote,
    Hybrid,
}

impl RemotePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemotePreference::Any => "any",
            RemotePreference::Remote => "remote",
            RemotePreference::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPreferences {
    #[serde(default)]
    pub blacklisted_companies: Vec<String>,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    #[serde(default)]
    pub remote_preference: RemotePreference,
}

/// The single record persisted in local storage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub saved_searches: Vec<SearchParams>,
    #[serde(default)]
    pub ai_settings: AiSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_search_api_key: Option<String>,
    #[serde(default)]
    pub auto_apply_enabled: bool,
    #[serde(default)]
    pub application_preferences: ApplicationPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    // Mocked; the uploaded file is never parsed.
    pub skills: Vec<String>,
    pub experience: Vec<String>,
    pub education: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    pub score: u8,
    pub suggestions: Vec<String>,
    pub keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationStats {
    pub total_applications: u32,
    pub successful_applications: u32,
    pub failed_applications: u32,
    pub average_match_score: f64,
    pub applications_by_platform: BTreeMap<String, u32>,
    pub applications_by_day: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub job_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: String, // "submitted", "pending", "failed"
    pub match_score: u8,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub unread: bool,
}
