//! Prompts for vision-model résumé review.
//!
//! Every prompt lives here so the wording can change without touching the
//! workflow or the provider plumbing, and so tests can inspect it directly.
//!
//! Callers can override the system prompt via
//! [`crate::config::AnalysisConfig::system_prompt`]; the per-request
//! instructions always come from [`prepare_instructions`].

/// Default system prompt for the review call.
pub const FEEDBACK_SYSTEM_PROMPT: &str = r#"You are an expert in applicant tracking systems (ATS) and résumé review. You receive an image of the first page of a résumé and instructions describing the job it is submitted for.

Answer with a single JSON object and nothing else:
- No markdown code fences
- No commentary before or after the object
- Every score is an integer from 0 to 100"#;

/// Shape of the JSON object the model must return.
pub const AI_RESPONSE_FORMAT: &str = r#"interface Feedback {
  overallScore: number; // max 100
  ATS: {
    score: number; // rate based on ATS suitability
    tips: {
      type: "good" | "improve";
      tip: string; // give 3-4 tips
    }[];
  };
  toneAndStyle: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // a short title for the explanation
      explanation: string; // explain in detail
    }[]; // give 3-4 tips
  };
  content: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string;
      explanation: string;
    }[];
  };
  structure: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string;
      explanation: string;
    }[];
  };
  skills: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string;
      explanation: string;
    }[];
  };
}"#;

/// Build the per-request instructions for a job application.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    format!(
        "Analyze and rate this résumé and suggest how to improve it.\n\
         Scores may be low if the résumé is weak; be thorough and point out every \
         mistake or area for improvement so the candidate can act on it.\n\
         Use the job description, when given, to tailor the feedback to the role.\n\
         The job title is: {job_title}\n\
         The job description is: {job_description}\n\
         Provide the feedback using the following format:\n\
         {AI_RESPONSE_FORMAT}\n\
         Return the analysis as a JSON object, without any other text and without backticks."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_embed_job_and_format() {
        let s = prepare_instructions("Backend Engineer", "Rust, tokio, Postgres");
        assert!(s.contains("The job title is: Backend Engineer"));
        assert!(s.contains("Rust, tokio, Postgres"));
        assert!(s.contains("overallScore"));
    }

    #[test]
    fn system_prompt_forbids_fences() {
        assert!(FEEDBACK_SYSTEM_PROMPT.contains("No markdown code fences"));
    }
}
