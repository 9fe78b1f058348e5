//! Insurance carrier table for the plan picker.
//!
//! The carrier list is fixed — the picker presents it as quick replies and
//! the selection is recorded on the session. After selection the assistant
//! prompts for a care type; discovery then runs with the insurance-filter
//! intent (see DESIGN.md for the variant choice).

use serde::Serialize;

/// One selectable carrier entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsurancePlan {
    pub id: &'static str,
    pub name: &'static str,
    pub shorthand: &'static str,
    /// Display accent color for the picker tile.
    pub accent: &'static str,
}

/// The fixed carrier list, in display order.
pub const CARRIERS: [InsurancePlan; 5] = [
    InsurancePlan {
        id: "aetna",
        name: "Aetna",
        shorthand: "AET",
        accent: "#7A3DB8",
    },
    InsurancePlan {
        id: "bcbs",
        name: "Blue Cross Blue Shield",
        shorthand: "BCBS",
        accent: "#1E5AA8",
    },
    InsurancePlan {
        id: "cigna",
        name: "Cigna",
        shorthand: "CIG",
        accent: "#00857C",
    },
    InsurancePlan {
        id: "uhc",
        name: "UnitedHealthcare",
        shorthand: "UHC",
        accent: "#E87722",
    },
    InsurancePlan {
        id: "medicare",
        name: "Medicare",
        shorthand: "MED",
        accent: "#B03A48",
    },
];

/// Look up a carrier by id or display name, case-insensitively.
pub fn find_plan(key: &str) -> Option<InsurancePlan> {
    CARRIERS
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(key) || p.name.eq_ignore_ascii_case(key))
        .cloned()
}

/// Quick-reply labels for the picker message.
pub fn picker_options() -> Vec<String> {
    CARRIERS.iter().map(|p| p.name.to_string()).collect()
}
