//! Deterministic pattern classifiers over raw utterance text.
//!
//! Each classifier is a pure predicate/extractor — no collaborator calls,
//! no session state — so every one can be unit-tested in isolation. The
//! precedence between them lives in [`crate::classify::router`], not here.

use regex::Regex;

use crate::api::{ProviderType, VisitMode};

/// Urgency signal inferred from phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Urgent,
    Routine,
}

/// Who the appointment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientGroup {
    Pediatric,
    Adult,
}

/// A detected specialty + location provider search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSearchMatch {
    pub specialty: ProviderType,
    /// "near you" when the text carries no explicit place.
    pub location: String,
}

/// Compiled classifier patterns.
///
/// Construction compiles every regex once; all methods borrow immutably so
/// one instance can serve the whole session.
pub struct Classifiers {
    insurance_terms: Regex,
    provider_clause: Regex,
    symptom_terms: Regex,
    next_available: Regex,
    urgency_urgent: Regex,
    urgency_routine: Regex,
    mode_virtual: Regex,
    mode_in_person: Regex,
    group_pediatric: Regex,
    group_adult: Regex,
    proximity: Regex,
    place_after_preposition: Regex,
    name_word: Regex,
    /// Ordered (specialty, keywords) table — first match wins.
    specialty_table: Vec<(ProviderType, Regex)>,
}

impl Default for Classifiers {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifiers {
    pub fn new() -> Self {
        let specialty_table = vec![
            (
                ProviderType::Cardiology,
                Regex::new(r"(?i)\b(cardiolog\w*|heart (doctor|specialist))\b").unwrap(),
            ),
            (
                ProviderType::Dermatology,
                Regex::new(r"(?i)\b(dermatolog\w*|skin (doctor|specialist))\b").unwrap(),
            ),
            (
                ProviderType::Orthopedics,
                Regex::new(r"(?i)\b(orthoped\w*|bone doctor|joint specialist|sports medicine)\b")
                    .unwrap(),
            ),
            (
                ProviderType::Neurology,
                Regex::new(r"(?i)\b(neurolog\w*|brain (doctor|specialist))\b").unwrap(),
            ),
            (
                ProviderType::UrgentCare,
                Regex::new(r"(?i)\b(urgent care|walk[- ]?in clinic)\b").unwrap(),
            ),
            (
                ProviderType::PrimaryCare,
                Regex::new(
                    r"(?i)\b(primary care|family (doctor|medicine|physician)|general practitioner|pcp|internist)\b",
                )
                .unwrap(),
            ),
        ];

        Self {
            insurance_terms: Regex::new(r"(?i)\b(insurance|coverage|covered|plan|copay|in[- ]network)\b")
                .unwrap(),
            provider_clause: Regex::new(r"(?i)\b(doctors?|dr|providers?|physicians?|specialists?|accepts?|takes?)\b")
                .unwrap(),
            symptom_terms: Regex::new(
                r"(?i)\b(symptoms?|symptom checker|fever|cough|sore throat|headache|migraine|rash|nausea|vomiting|dizzy|dizziness|congestion|runny nose|chills|earache|ear pain|sick|pain)\b",
            )
            .unwrap(),
            next_available: Regex::new(
                r"(?i)\b(next available|earliest|soonest|first available)\b",
            )
            .unwrap(),
            urgency_urgent: Regex::new(r"(?i)\b(urgent|asap|as soon as possible|today|right away)\b")
                .unwrap(),
            urgency_routine: Regex::new(
                r"(?i)\b(routine|check[- ]?up|annual|physical|wellness|no rush|not urgent)\b",
            )
            .unwrap(),
            mode_virtual: Regex::new(
                r"(?i)\b(virtual|telehealth|tele-health|video (visit|call|appointment)|online (visit|appointment))\b",
            )
            .unwrap(),
            mode_in_person: Regex::new(
                r"(?i)\b(in[- ]person|at the clinic|office visit|face to face|come in)\b",
            )
            .unwrap(),
            group_pediatric: Regex::new(
                r"(?i)\b(child|children|kids?|son|daughter|pediatric|toddler|infant|baby|teen(ager)?)\b",
            )
            .unwrap(),
            group_adult: Regex::new(r"(?i)\badult\b").unwrap(),
            proximity: Regex::new(r"(?i)\b(near me|nearby|around here|close by)\b").unwrap(),
            place_after_preposition: Regex::new(r"(?i)\b(?:in|near|around)\s+([a-z][a-z .'-]+)")
                .unwrap(),
            name_word: Regex::new(r"^[A-Za-z][A-Za-z.'-]*$").unwrap(),
            specialty_table,
        }
    }

    /// True iff the text contains an insurance/coverage term AND a
    /// doctor/provider/accept term. Both clauses are required — "insurance"
    /// alone is not an insurance query.
    pub fn is_insurance_query(&self, text: &str) -> bool {
        self.insurance_terms.is_match(text) && self.provider_clause.is_match(text)
    }

    /// True iff the text mentions a recognized symptom keyword or an
    /// explicit "symptom checker" phrase.
    pub fn is_symptom_query(&self, text: &str) -> bool {
        self.symptom_terms.is_match(text)
    }

    /// Scan the ordered specialty table; first matching specialty wins.
    /// The location defaults to "near you" when the text names no place.
    pub fn detect_provider_search(&self, text: &str) -> Option<ProviderSearchMatch> {
        for (specialty, keywords) in &self.specialty_table {
            if keywords.is_match(text) {
                let location = self
                    .normalize_location_label(text)
                    .unwrap_or_else(|| "near you".to_string());
                return Some(ProviderSearchMatch {
                    specialty: *specialty,
                    location,
                });
            }
        }
        None
    }

    /// "near me"/"nearby"/"around here" → "near you"; otherwise the place
    /// name following in/near/around; otherwise `None`.
    pub fn normalize_location_label(&self, text: &str) -> Option<String> {
        if self.proximity.is_match(text) {
            return Some("near you".to_string());
        }
        self.place_after_preposition
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().trim_end_matches(['.', ',', '?', '!']).to_string())
            .filter(|s| !s.is_empty())
    }

    /// Heuristic name-shape check: 1–3 whitespace-separated tokens of name
    /// characters; a 3-token form is only a name if it leads with "Dr".
    pub fn looks_like_provider_name(&self, text: &str) -> bool {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() || tokens.len() > 3 {
            return false;
        }
        if !tokens.iter().all(|t| self.name_word.is_match(t)) {
            return false;
        }
        if tokens.len() == 3 {
            let first = tokens[0].trim_end_matches('.');
            if !first.eq_ignore_ascii_case("dr") {
                return false;
            }
        }
        true
    }

    /// True iff the text asks for the next/earliest/soonest available slot.
    pub fn is_next_available_request(&self, text: &str) -> bool {
        self.next_available.is_match(text)
    }

    /// Urgency phrasing. Routine phrasing is checked first so "not urgent"
    /// reads as routine.
    pub fn detect_urgency(&self, text: &str) -> Option<Urgency> {
        if self.urgency_routine.is_match(text) {
            Some(Urgency::Routine)
        } else if self.urgency_urgent.is_match(text) {
            Some(Urgency::Urgent)
        } else {
            None
        }
    }

    /// Telehealth/virtual vs clinic/in-person phrasing.
    pub fn detect_mode_preference(&self, text: &str) -> Option<VisitMode> {
        if self.mode_virtual.is_match(text) {
            Some(VisitMode::Virtual)
        } else if self.mode_in_person.is_match(text) {
            Some(VisitMode::InPerson)
        } else {
            None
        }
    }

    /// Child-referencing phrasing vs an explicit adult mention.
    pub fn detect_patient_group(&self, text: &str) -> Option<PatientGroup> {
        if self.group_pediatric.is_match(text) {
            Some(PatientGroup::Pediatric)
        } else if self.group_adult.is_match(text) {
            Some(PatientGroup::Adult)
        } else {
            None
        }
    }
}
