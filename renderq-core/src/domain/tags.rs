//! Job tags
//!
//! Tags are a single comma separated string. They are sanitized on create so
//! that nothing downstream ever sees characters outside `[a-zA-Z0-9, ]`.

use crate::domain::job::Job;

/// Strip every character outside ASCII letters, digits, comma and space
pub fn sanitize_tags(tags: &str) -> String {
    tags.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ',' || *c == ' ')
        .collect()
}

fn split_tags(tags: &str) -> impl Iterator<Item = String> + '_ {
    tags.split(',')
        .map(|tag| tag.trim().to_ascii_lowercase())
        .filter(|tag| !tag.is_empty())
}

/// Set of tags a worker requires from the job it picks up
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagFilter {
    tags: Vec<String>,
}

impl TagFilter {
    /// Parse a comma separated tag list, sanitizing it the same way job tags are
    pub fn parse(raw: &str) -> Self {
        let sanitized = sanitize_tags(raw);
        let mut tags: Vec<String> = split_tags(&sanitized).collect();
        tags.sort();
        tags.dedup();
        Self { tags }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// A job matches when it carries every requested tag (case-insensitive)
    pub fn matches(&self, job: &Job) -> bool {
        let job_tags: Vec<String> = split_tags(job.tags()).collect();
        self.tags.iter().all(|wanted| job_tags.contains(wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_tags_removes_illegal_characters() {
        assert_eq!(sanitize_tags("a,b! c#1"), "a,b c1");
        assert_eq!(sanitize_tags("GPU, 4k;DROP TABLE"), "GPU, 4kDROP TABLE");
        assert_eq!(sanitize_tags("<script>"), "script");
        assert_eq!(sanitize_tags(""), "");
    }

    #[test]
    fn test_sanitize_tags_drops_non_ascii() {
        assert_eq!(sanitize_tags("caf\u{e9},x"), "caf,x");
    }

    #[test]
    fn test_filter_parse() {
        let filter = TagFilter::parse(" GPU,4k,,gpu ");
        assert_eq!(filter.tags(), &["4k".to_string(), "gpu".to_string()]);
        assert!(TagFilter::parse(",,").is_empty());
    }

    #[test]
    fn test_filter_matches_all_of() {
        let now = chrono::Utc::now();
        let job = Job::new("j1".to_string(), now)
            .merged(serde_json::json!({ "tags": "gpu, 4K, linux" }), now)
            .unwrap();

        assert!(TagFilter::parse("gpu").matches(&job));
        assert!(TagFilter::parse("4k,GPU").matches(&job));
        assert!(!TagFilter::parse("gpu,windows").matches(&job));
        assert!(TagFilter::parse("").matches(&job));
    }

    #[test]
    fn test_filter_treats_non_string_tags_as_none() {
        let now = chrono::Utc::now();
        let job = Job::new("j1".to_string(), now)
            .merged(serde_json::json!({ "tags": ["gpu"] }), now)
            .unwrap();

        assert!(!TagFilter::parse("gpu").matches(&job));
        assert!(TagFilter::parse("").matches(&job));
    }
}
