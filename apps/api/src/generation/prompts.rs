//! Prompt templates for the three generation stages.
//!
//! Slots are written `{name}`. Rendering is single-pass, so slot-like text
//! inside a supplied value (a resume that happens to contain `{job_description}`)
//! is never substituted a second time.

use thiserror::Error;

/// Substituted for empty user notes so the cover letter prompt never shows a
/// blank personalization section.
pub const NO_NOTES_PLACEHOLDER: &str = "No specific notes provided.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template '{template}' requires slot '{slot}', which was not supplied")]
    MissingSlot {
        template: &'static str,
        slot: &'static str,
    },

    #[error("template '{template}' has no slot named '{slot}'")]
    UnknownSlot {
        template: &'static str,
        slot: String,
    },
}

/// A fixed prompt body with a declared set of required slots.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub slots: &'static [&'static str],
    body: &'static str,
}

impl PromptTemplate {
    /// Fills every slot. Fails if a declared slot is missing or an undeclared one is supplied.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, TemplateError> {
        if let Some((unknown, _)) = values
            .iter()
            .find(|(k, _)| !self.slots.iter().any(|slot| slot == k))
        {
            return Err(TemplateError::UnknownSlot {
                template: self.name,
                slot: unknown.to_string(),
            });
        }
        if let Some(missing) = self
            .slots
            .iter()
            .find(|slot| !values.iter().any(|(k, _)| k == *slot))
        {
            return Err(TemplateError::MissingSlot {
                template: self.name,
                slot: *missing,
            });
        }

        let mut out = String::with_capacity(
            self.body.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
        );
        let mut rest = self.body;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after
                .find('}')
                .map(|close| (&after[..close], close))
                .and_then(|(name, close)| {
                    values
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| (*v, close))
                });
            match value {
                Some((v, close)) => {
                    out.push_str(v);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Stage 1: rewrite the resume for the target job.
pub const RESUME_REWRITE: PromptTemplate = PromptTemplate {
    name: "resume_rewrite",
    slots: &["resume_text", "job_description"],
    body: r#"Act as an expert career coach and professional resume writer.
Your task is to rewrite the following resume so it is tailored to the target job description.

Instructions:
1. Analyze the job description: identify the key skills, technologies, qualifications and action verbs.
2. Mirror language: integrate the job description's keywords and phrases naturally into the resume.
3. Quantify achievements: rephrase bullet points to be result-oriented and include metrics where possible (e.g. "Increased efficiency by 20%", "Managed a team of 5").
4. Action verbs: start each bullet point with a strong action verb relevant to the role.
5. Structure: keep the original resume's sections (e.g. Summary, Experience, Skills, Projects, Education). Do not add or remove sections.
6. Keep the result professional, clear and concise.

Original resume:
---
{resume_text}
---

Target job description:
---
{job_description}
---

Output:
Return ONLY the full text of the rewritten, ATS-friendly resume. Do not add any commentary before or after the resume."#,
};

/// Stage 2: cover letter from the tailored resume.
pub const COVER_LETTER: PromptTemplate = PromptTemplate {
    name: "cover_letter",
    slots: &["tailored_resume", "job_description", "user_notes"],
    body: r#"Act as an expert career coach and professional writer. Write a compelling, professional and concise cover letter.

Candidate's tailored resume:
---
{tailored_resume}
---

Target job description:
---
{job_description}
---

Personal notes from the candidate:
---
{user_notes}
---

Instructions:
1. Hook: open strongly and name the position being applied for.
2. Connect: in one or two body paragraphs, tie the candidate's key qualifications and achievements to the most important requirements of the job. Use 2-3 specific examples.
3. Personalize: weave in the candidate's notes (e.g. a career gap, a referral, passion for the company's mission). If no notes are provided, rely on the resume and job description only.
4. Call to action: close confidently and invite a conversation.
5. Tone: professional, enthusiastic and confident.

Output:
Return ONLY the full text of the cover letter. Do not include a subject line or any commentary."#,
};

/// Stage 3: score the tailored resume.
///
/// The `Score:` / `Analysis:` lines requested here are what
/// `score_parser::parse_score_response` looks for. Change both together.
pub const SCORING: PromptTemplate = PromptTemplate {
    name: "scoring",
    slots: &["resume_text", "job_description"],
    body: r#"Act as a sophisticated Applicant Tracking System (ATS) and a senior HR manager.
Analyze the resume against the job description and evaluate the fit.

Resume:
---
{resume_text}
---

Job description:
---
{job_description}
---

Evaluation criteria:
1. Keyword alignment: how well do the resume's skills, technologies and responsibilities match the job description?
2. Experience relevance: is the work experience directly relevant to the role?
3. Qualification match: does the candidate meet the core qualifications (years of experience, degrees, certifications)?
4. Impact: does the resume demonstrate quantifiable achievements?

Output format:
Respond with exactly two labelled lines and nothing else. The first line is the compatibility score as a whole number from 1 to 100. The second line is a concise summary of the key strengths and the optimizations performed or still needed.

Score: 87
Analysis: Strong alignment on distributed systems and Rust; add explicit Kubernetes experience to close the remaining gap.

Now give the Score and Analysis lines for the documents above."#,
};

/// Renders stage 2, substituting the neutral placeholder for blank notes.
pub fn render_cover_letter(
    tailored_resume: &str,
    job_description: &str,
    user_notes: &str,
) -> Result<String, TemplateError> {
    let notes = if user_notes.trim().is_empty() {
        NO_NOTES_PLACEHOLDER
    } else {
        user_notes
    };
    COVER_LETTER.render(&[
        ("tailored_resume", tailored_resume),
        ("job_description", job_description),
        ("user_notes", notes),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_declared_slot_appears_in_its_body() {
        for template in [RESUME_REWRITE, COVER_LETTER, SCORING] {
            for slot in template.slots {
                assert!(
                    template.body.contains(&format!("{{{slot}}}")),
                    "{} is missing {{{slot}}}",
                    template.name
                );
            }
        }
    }

    #[test]
    fn test_render_fills_all_slots() {
        let prompt = RESUME_REWRITE
            .render(&[
                ("resume_text", "Jane Doe, Rust engineer"),
                ("job_description", "Senior Rust Engineer"),
            ])
            .unwrap();
        assert!(prompt.contains("Jane Doe, Rust engineer"));
        assert!(prompt.contains("Senior Rust Engineer"));
        assert!(!prompt.contains("{resume_text}"));
        assert!(!prompt.contains("{job_description}"));
    }

    #[test]
    fn test_missing_slot_fails() {
        let err = SCORING.render(&[("resume_text", "x")]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingSlot {
                template: "scoring",
                slot: "job_description"
            }
        );
    }

    #[test]
    fn test_unknown_slot_fails() {
        let err = SCORING
            .render(&[
                ("resume_text", "x"),
                ("job_description", "y"),
                ("user_notes", "z"),
            ])
            .unwrap_err();
        assert!(matches!(err, TemplateError::UnknownSlot { slot, .. } if slot == "user_notes"));
    }

    #[test]
    fn test_slot_text_inside_values_is_not_substituted_again() {
        let prompt = RESUME_REWRITE
            .render(&[
                ("resume_text", "Wrote {job_description} parsers"),
                ("job_description", "JD"),
            ])
            .unwrap();
        assert!(prompt.contains("Wrote {job_description} parsers"));
    }

    #[test]
    fn test_unbalanced_braces_in_body_are_kept() {
        let template = PromptTemplate {
            name: "t",
            slots: &["a"],
            body: "json {\"k\": 1} and {a} and {",
        };
        assert_eq!(
            template.render(&[("a", "A")]).unwrap(),
            "json {\"k\": 1} and A and {"
        );
    }

    #[test]
    fn test_cover_letter_blank_notes_use_placeholder() {
        for notes in ["", "   \n"] {
            let prompt = render_cover_letter("resume", "jd", notes).unwrap();
            assert!(prompt.contains(NO_NOTES_PLACEHOLDER));
            assert!(!prompt.contains("---\n\n---"));
        }
    }

    #[test]
    fn test_cover_letter_keeps_real_notes() {
        let prompt = render_cover_letter("resume", "jd", "Referred by Sam").unwrap();
        assert!(prompt.contains("Referred by Sam"));
        assert!(!prompt.contains(NO_NOTES_PLACEHOLDER));
    }

    #[test]
    fn test_scoring_prompt_asks_for_parser_labels() {
        assert!(SCORING.body.contains("\nScore: "));
        assert!(SCORING.body.contains("\nAnalysis: "));
    }
}
