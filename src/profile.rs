//! Candidate profile snapshot and transcript matching.
//!
//! The profile travels with every suggestion request so the backend can
//! tailor its talk tracks. The matcher powers the resume-context side panel:
//! as the interviewer speaks, entries the transcript touches surface live.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A profile entry surfaced because the live transcript touched it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProfileMatch {
    Experience {
        company: String,
        role: String,
        description: String,
    },
    Project {
        name: String,
        description: String,
    },
    Skills {
        matched: Vec<String>,
    },
}

/// Words shorter than this match too much via substring containment
const MIN_MATCH_WORD_LEN: usize = 3;

/// Match transcript vocabulary against the profile.
///
/// An experience or project entry matches when any transcript word appears
/// inside its text fields (case-insensitive). Skills match on exact word
/// membership and are reported together.
pub fn relevant_entries(profile: &CandidateProfile, transcript: &str) -> Vec<ProfileMatch> {
    let words: Vec<String> = transcript
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= MIN_MATCH_WORD_LEN)
        .collect();

    if words.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();

    for entry in &profile.experience {
        let haystacks = [
            entry.company.to_lowercase(),
            entry.role.to_lowercase(),
            entry.description.to_lowercase(),
        ];
        if words
            .iter()
            .any(|w| haystacks.iter().any(|h| h.contains(w.as_str())))
        {
            matches.push(ProfileMatch::Experience {
                company: entry.company.clone(),
                role: entry.role.clone(),
                description: entry.description.clone(),
            });
        }
    }

    for project in &profile.projects {
        let haystacks = [project.name.to_lowercase(), project.description.to_lowercase()];
        if words
            .iter()
            .any(|w| haystacks.iter().any(|h| h.contains(w.as_str())))
        {
            matches.push(ProfileMatch::Project {
                name: project.name.clone(),
                description: project.description.clone(),
            });
        }
    }

    let matched_skills: Vec<String> = profile
        .skills
        .iter()
        .filter(|s| words.contains(&s.to_lowercase()))
        .cloned()
        .collect();
    if !matched_skills.is_empty() {
        matches.push(ProfileMatch::Skills {
            matched: matched_skills,
        });
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CandidateProfile {
        CandidateProfile {
            name: "Sam".to_string(),
            job_title: "Backend Engineer".to_string(),
            skills: vec!["React".to_string(), "Rust".to_string()],
            experience: vec![ExperienceEntry {
                company: "Acme Robotics".to_string(),
                role: "Platform Engineer".to_string(),
                description: "Built the telemetry ingestion pipeline".to_string(),
            }],
            projects: vec![ProjectEntry {
                name: "Flightdeck".to_string(),
                description: "A scheduling dashboard".to_string(),
            }],
        }
    }

    #[test]
    fn experience_matches_on_description_words() {
        let matches = relevant_entries(&profile(), "tell me about telemetry work");
        assert!(matches
            .iter()
            .any(|m| matches!(m, ProfileMatch::Experience { company, .. } if company == "Acme Robotics")));
    }

    #[test]
    fn skills_match_on_exact_words() {
        let matches = relevant_entries(&profile(), "how much react have you written");
        assert!(matches
            .iter()
            .any(|m| matches!(m, ProfileMatch::Skills { matched } if matched == &vec!["React".to_string()])));
    }

    #[test]
    fn short_words_do_not_match() {
        // "ac" is contained in "Acme" but is too short to count
        let matches = relevant_entries(&profile(), "ac");
        assert!(matches.is_empty());
    }

    #[test]
    fn empty_transcript_matches_nothing() {
        assert!(relevant_entries(&profile(), "").is_empty());
    }
}
