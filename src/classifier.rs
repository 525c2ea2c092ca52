//! Two-stage job-relevance classification and free-text filtering

use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::CompletionBackend;
use crate::error::Result;
use crate::models::MessageSummary;

/// Vocabulary that marks a message as job/career-related.
static JOB_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "job",
        "career",
        "position",
        "opening",
        "vacancy",
        "application",
        "apply",
        "applied",
        "interview",
        "recruiter",
        "recruiting",
        "recruitment",
        "hiring",
        "hiring manager",
        "resume",
        "cover letter",
        "internship",
        "candidate",
        "talent",
    ]
});

/// Vocabulary that marks a message as newsletter/marketing/billing noise.
static TRASH_KEYWORDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "unsubscribe",
        "newsletter",
        "sale",
        "% off",
        "discount",
        "promo",
        "coupon",
        "deal",
        "limited time",
        "marketing",
        "invoice",
        "billing",
        "receipt",
        "payment due",
        "verification code",
        "one-time password",
        "password reset",
        "webinar",
    ]
});

/// Two-stage relevance classifier: a deterministic keyword gate disposes of
/// obviously-labeled mail, the completion backend decides the ambiguous rest.
pub struct RelevanceClassifier {
    backend: Arc<dyn CompletionBackend>,
}

impl RelevanceClassifier {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Count positive and negative keyword occurrences over an
    /// already-lowercased text blob. Substring matches, every occurrence
    /// counted.
    pub fn keyword_scores(blob: &str) -> (usize, usize) {
        let job_score = JOB_KEYWORDS
            .iter()
            .map(|kw| blob.matches(kw).count())
            .sum();
        let trash_score = TRASH_KEYWORDS
            .iter()
            .map(|kw| blob.matches(kw).count())
            .sum();
        (job_score, trash_score)
    }

    /// Classify a message from its subject and snippet.
    ///
    /// High-confidence keyword verdicts short-circuit without touching the
    /// backend; only ambiguous input pays for a model call. The fallback call
    /// is made exactly once with no retry, and its failure propagates to the
    /// caller.
    pub async fn classify(&self, subject: &str, snippet: &str) -> Result<bool> {
        let blob = format!("{} {}", subject, snippet).to_lowercase();
        let (job_score, trash_score) = Self::keyword_scores(&blob);

        if job_score >= 2 && trash_score == 0 {
            debug!(job_score, "keyword gate: job-related");
            return Ok(true);
        }
        if trash_score >= 2 && job_score == 0 {
            debug!(trash_score, "keyword gate: not job-related");
            return Ok(false);
        }

        debug!(job_score, trash_score, "ambiguous, deferring to model");
        let prompt = format!(
            "You are labeling a user's sent emails. Decide whether the email \
             below is related to jobs, careers, applications or recruiting.\n\
             Subject: {}\n\
             Preview: {}\n\
             Answer with a single word: yes or no.",
            subject, snippet
        );
        let response = self.backend.complete(&prompt).await?;
        Ok(response.to_lowercase().contains("yes"))
    }

    /// Filter a message listing against a natural-language prompt.
    ///
    /// Formats the whole listing into one model prompt and expects a JSON
    /// array of matching ids back. Lossy by contract: a failed call or an
    /// unparsable response yields an empty match set, never an error.
    pub async fn filter_messages(
        &self,
        summaries: &[MessageSummary],
        prompt: &str,
    ) -> Vec<String> {
        let listing: String = summaries
            .iter()
            .map(|s| {
                format!(
                    "- id: {} | from: {} | subject: {} | date: {}",
                    s.id, s.sender, s.subject, s.date
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let full_prompt = format!(
            "Here is a list of emails:\n{}\n\n\
             Select the emails matching this request: {}\n\
             Respond with a JSON array of the matching ids, e.g. [\"id1\", \"id2\"]. \
             Respond with [] if none match.",
            listing, prompt
        );

        let raw = match self.backend.complete(&full_prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("filter call failed, returning empty match set: {}", e);
                return Vec::new();
            }
        };

        extract_id_array(&raw)
    }
}

/// Pull a JSON string array out of a free-form model response by taking the
/// window between the first `[` and the last `]`. Tolerates surrounding
/// commentary; anything unparsable yields an empty set.
pub fn extract_id_array(raw: &str) -> Vec<String> {
    let Some(start) = raw.find('[') else {
        return Vec::new();
    };
    let Some(end) = raw.rfind(']') else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }
    serde_json::from_str(&raw[start..=end]).unwrap_or_default()
}
