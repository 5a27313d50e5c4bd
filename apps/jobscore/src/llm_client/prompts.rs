// Prompt text sent to the model directly (the hosted endpoint owns its own prompts).

/// Instruction sent alongside an inline PDF to turn a résumé into text.
pub const RESUME_PARSE_INSTRUCTION: &str = "Parse this provided resume into a markdown format. \
    Preserve the sections as provided in the resume. \
    Keep the information exact dont modify it.";

/// Fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Job-match prompt. Placeholders: {resume}, {title}, {company}, {description}.
pub const JOB_MATCH_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter.
Compare the candidate resume with the job posting and rate the fit.

RESUME:
{resume}

JOB POSTING:
Title: {title}
Company: {company}
Description:
{description}

Respond with a JSON object of exactly this shape:
{"score": <integer 0-100>, "confidence": "<low|medium|high>", "feedback": ["<short point>", "<short point>", "<short point>"]}
"#;

pub fn job_match_prompt(resume: &str, title: &str, company: &str, description: &str) -> String {
    let body = fill_placeholders(
        JOB_MATCH_PROMPT_TEMPLATE,
        &[
            ("{resume}", resume),
            ("{title}", title),
            ("{company}", company),
            ("{description}", description),
        ],
    );
    format!("{JSON_ONLY_SYSTEM}\n\n{body}")
}

/// Single pass over `template`; substituted text is never scanned again.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_match_prompt_fills_placeholders() {
        let prompt = job_match_prompt("R", "Backend Engineer", "Acme", "Build APIs");
        assert!(prompt.starts_with(JSON_ONLY_SYSTEM));
        assert!(prompt.contains("Title: Backend Engineer"));
        assert!(prompt.contains("Company: Acme"));
        assert!(!prompt.contains("{resume}"));
        assert!(!prompt.contains("{description}"));
        assert!(prompt.contains(r#"{"score": <integer 0-100>"#));
    }

    #[test]
    fn test_placeholders_inside_values_are_left_alone() {
        let prompt = job_match_prompt("I know {description} well", "SRE", "{company}", "SECRET-JD");
        assert_eq!(prompt.matches("SECRET-JD").count(), 1);
        assert!(prompt.contains("I know {description} well"));
        assert!(prompt.contains("Company: {company}"));
    }
}
