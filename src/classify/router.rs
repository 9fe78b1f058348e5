//! Utterance routing — the classifier precedence chain as data.
//!
//! The precedence order of the flows is an ordered list of named rules, not
//! a cascade of if/else branches, so the order itself can be unit-tested.
//! `candidates` returns *every* matching route in precedence order; the
//! controller takes the first, and falls through to the next when a
//! provider-name lookup comes back empty.

use tracing::debug;

use crate::api::ProviderType;
use crate::classify::patterns::Classifiers;

/// A routing decision for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    /// Insurance/coverage question → insurance selection flow.
    Insurance,
    /// Text shaped like a provider name → name-based lookup.
    ProviderName { query: String },
    /// Specialty/location search, or an explicit next-available request
    /// (which defaults to primary care when no specialty is named).
    ProviderSearch {
        specialty: ProviderType,
        location: String,
        next_available: bool,
    },
    /// Symptom mention → triage questionnaire.
    SymptomTriage,
    /// Everything else → the generic intent collaborator.
    Generic,
}

impl RouteMatch {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Insurance => "insurance",
            Self::ProviderName { .. } => "provider_name",
            Self::ProviderSearch { .. } => "provider_search",
            Self::SymptomTriage => "symptom_triage",
            Self::Generic => "generic",
        }
    }
}

type Matcher = fn(&Classifiers, &str) -> Option<RouteMatch>;

/// One entry in the precedence chain.
struct RouteRule {
    name: &'static str,
    matcher: Matcher,
}

/// The fixed-precedence utterance router.
pub struct Router {
    classifiers: Classifiers,
    rules: Vec<RouteRule>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        let rules = vec![
            RouteRule {
                name: "insurance",
                matcher: |c, text| c.is_insurance_query(text).then_some(RouteMatch::Insurance),
            },
            RouteRule {
                name: "provider_name",
                matcher: |c, text| {
                    c.looks_like_provider_name(text)
                        .then(|| RouteMatch::ProviderName {
                            query: text.trim().to_string(),
                        })
                },
            },
            RouteRule {
                name: "provider_search",
                matcher: |c, text| {
                    let next_available = c.is_next_available_request(text);
                    if let Some(m) = c.detect_provider_search(text) {
                        return Some(RouteMatch::ProviderSearch {
                            specialty: m.specialty,
                            location: m.location,
                            next_available,
                        });
                    }
                    if next_available {
                        let location = c
                            .normalize_location_label(text)
                            .unwrap_or_else(|| "near you".to_string());
                        return Some(RouteMatch::ProviderSearch {
                            specialty: ProviderType::PrimaryCare,
                            location,
                            next_available: true,
                        });
                    }
                    None
                },
            },
            RouteRule {
                name: "symptom",
                matcher: |c, text| c.is_symptom_query(text).then_some(RouteMatch::SymptomTriage),
            },
            // Terminal rule — always matches.
            RouteRule {
                name: "generic",
                matcher: |_, _| Some(RouteMatch::Generic),
            },
        ];
        Self {
            classifiers: Classifiers::new(),
            rules,
        }
    }

    /// The classifiers backing this router, for signal extraction beyond
    /// routing (mode, urgency, patient group).
    pub fn classifiers(&self) -> &Classifiers {
        &self.classifiers
    }

    /// All matching routes in precedence order. Never empty: the generic
    /// rule is terminal.
    pub fn candidates(&self, text: &str) -> Vec<RouteMatch> {
        let mut out = Vec::new();
        for rule in &self.rules {
            if let Some(m) = (rule.matcher)(&self.classifiers, text) {
                debug!(rule = rule.name, route = m.label(), "route candidate");
                out.push(m);
            }
        }
        out
    }

    /// The highest-precedence route for an utterance.
    pub fn first_match(&self, text: &str) -> RouteMatch {
        self.candidates(text)
            .into_iter()
            .next()
            .unwrap_or(RouteMatch::Generic)
    }
}
