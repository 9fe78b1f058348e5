//! Symptom triage sequencer.
//!
//! A fixed, ordered questionnaire: one question at a time, one answer per
//! question, answers recorded in question order. Completing the last
//! question produces a summary enumerating every answer. Geolocation runs
//! alongside (see `geo`); this module never blocks on it.

use crate::error::FlowError;

/// One triage question with its mutually exclusive options.
#[derive(Debug, Clone, Copy)]
pub struct TriageQuestion {
    pub id: &'static str,
    pub prompt: &'static str,
    pub options: &'static [&'static str],
}

/// The fixed question list, in ask order.
pub static QUESTIONS: [TriageQuestion; 3] = [
    TriageQuestion {
        id: "duration",
        prompt: "How long have you had these symptoms?",
        options: &["Less than a day", "1-3 days", "More than 3 days"],
    },
    TriageQuestion {
        id: "fever",
        prompt: "Do you have a fever?",
        options: &["No fever", "Mild fever", "High fever"],
    },
    TriageQuestion {
        id: "breathing",
        prompt: "Are you having any difficulty breathing?",
        options: &["No", "Some difficulty", "Severe difficulty"],
    },
];

/// Progress through the questionnaire: current index plus recorded answers.
#[derive(Debug, Clone, Default)]
pub struct TriageState {
    index: usize,
    answers: Vec<(&'static str, String)>,
}

impl TriageState {
    /// The question awaiting an answer, or `None` when complete.
    pub fn current_question(&self) -> Option<&'static TriageQuestion> {
        QUESTIONS.get(self.index)
    }

    /// Record the chosen option for the current question and advance.
    pub fn record_answer(&mut self, option: &str) -> Result<(), FlowError> {
        let question = self.current_question().ok_or(FlowError::TriageComplete)?;
        if !question.options.contains(&option) {
            return Err(FlowError::InvalidOption {
                question: question.id.to_string(),
                option: option.to_string(),
            });
        }
        self.answers.push((question.id, option.to_string()));
        self.index += 1;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.index >= QUESTIONS.len()
    }

    /// How many questions have been answered.
    pub fn answered(&self) -> usize {
        self.answers.len()
    }

    /// The recorded answer for a question id.
    pub fn answer(&self, question_id: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|(id, _)| *id == question_id)
            .map(|(_, a)| a.as_str())
    }

    /// Summary enumerating every question and its answer, in ask order.
    pub fn summary(&self) -> String {
        let mut out = String::from("Here's what you told me:");
        for (id, answer) in &self.answers {
            let prompt = QUESTIONS
                .iter()
                .find(|q| q.id == *id)
                .map(|q| q.prompt)
                .unwrap_or(id);
            out.push_str(&format!("\n• {prompt} {answer}"));
        }
        out
    }

    /// Closing line, pointing at the resolved location when available.
    pub fn closing_message(&self, location_label: &str) -> String {
        format!(
            "Thanks — based on your answers, I'd suggest seeing a provider {location_label}. \
             Want me to pull up available appointments?"
        )
    }
}
