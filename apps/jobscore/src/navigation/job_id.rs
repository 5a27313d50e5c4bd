use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static VIEW_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/jobs/view/(\d+)").expect("job view pattern is valid"));

const CURRENT_JOB_PARAM: &str = "currentJobId";

/// Identifier of the job posting currently displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the job id encoded in `url`.
///
/// Precedence: digits right after `/jobs/view/` in the path, then a non-empty
/// `currentJobId` query parameter, otherwise `None`.
pub fn derive_job_id(url: &Url) -> Option<JobId> {
    view_path_id(url.path()).or_else(|| current_job_param(url))
}

fn view_path_id(path: &str) -> Option<JobId> {
    VIEW_PATH_RE
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|digits| JobId(digits.as_str().to_string()))
}

fn current_job_param(url: &Url) -> Option<JobId> {
    url.query_pairs()
        .find(|(key, _)| key == CURRENT_JOB_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .map(JobId)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_id(url: &str) -> Option<String> {
        derive_job_id(&Url::parse(url).unwrap()).map(|id| id.as_str().to_string())
    }

    #[test]
    fn test_view_path_yields_digit_run() {
        assert_eq!(
            job_id("https://www.linkedin.com/jobs/view/4323548252/").as_deref(),
            Some("4323548252")
        );
        assert_eq!(
            job_id("https://www.linkedin.com/jobs/view/17/?refId=abc&trk=x").as_deref(),
            Some("17")
        );
        assert_eq!(
            job_id("https://www.linkedin.com/jobs/view/99").as_deref(),
            Some("99")
        );
    }

    #[test]
    fn test_view_path_match_may_start_inside_an_earlier_one() {
        assert_eq!(
            job_id("https://www.linkedin.com/jobs/view/jobs/view/5/").as_deref(),
            Some("5")
        );
        assert_eq!(
            job_id("https://www.linkedin.com/jobs/view/abc/jobs/view/42").as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_view_path_takes_precedence_over_query() {
        assert_eq!(
            job_id("https://www.linkedin.com/jobs/view/111/?currentJobId=222").as_deref(),
            Some("111")
        );
    }

    #[test]
    fn test_current_job_query_param() {
        assert_eq!(
            job_id(
                "https://www.linkedin.com/jobs/collections/recommended/?currentJobId=4323548252"
            )
            .as_deref(),
            Some("4323548252")
        );
        assert_eq!(
            job_id("https://www.linkedin.com/jobs/search/?keywords=rust&currentJobId=5").as_deref(),
            Some("5")
        );
    }

    #[test]
    fn test_non_numeric_view_segment_falls_back_to_query() {
        assert_eq!(
            job_id("https://www.linkedin.com/jobs/view/abc/?currentJobId=42").as_deref(),
            Some("42")
        );
        assert_eq!(job_id("https://www.linkedin.com/jobs/view/abc/"), None);
    }

    #[test]
    fn test_urls_without_job_yield_none() {
        assert_eq!(job_id("https://www.linkedin.com/feed/"), None);
        assert_eq!(job_id("https://www.linkedin.com/jobs/"), None);
        assert_eq!(
            job_id("https://www.linkedin.com/jobs/search/?currentJobId="),
            None
        );
    }

    #[test]
    fn test_display_matches_inner_value() {
        let id = derive_job_id(&Url::parse("https://x.test/jobs/view/8/").unwrap()).unwrap();
        assert_eq!(id.to_string(), "8");
    }
}
