//! Job domain types
//!
//! A [`Job`] is one render request, kept as the JSON object its callers
//! sent. The queue reads a handful of fields through typed accessors
//! (`uid`, `state`, `tags`, the timestamps) and never validates the rest:
//! every other value is stored and returned verbatim, whatever its type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::domain::state::JobState;
use crate::domain::status::JobStatus;
use crate::domain::tags::sanitize_tags;

/// Keys a create request can never set
const CREATE_MANAGED_KEYS: [&str; 6] = ["uid", "id", "state", "creator", "createdAt", "updatedAt"];

/// Keys an update patch can never set
const UPDATE_MANAGED_KEYS: [&str; 2] = ["uid", "updatedAt"];

/// Errors raised while building a job from caller input
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("job payload must be a JSON object")]
    NotAnObject,

    #[error("job record has no string uid")]
    MissingUid,

    #[error("unknown job state: {0}")]
    UnknownState(String),
}

/// Render job record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Job {
    uid: String,
    record: Map<String, Value>,
}

impl Job {
    /// A queued job with every field at its default
    pub fn new(uid: String, now: DateTime<Utc>) -> Self {
        let stamp = timestamp(now);
        let record = [
            ("uid", json!(uid)),
            ("type", json!("default")),
            ("state", json!(JobState::Queued.as_str())),
            ("output", json!("")),
            ("priority", json!(0)),
            ("tags", json!("")),
            ("renderProgress", json!(0)),
            ("template", json!({ "src": "", "composition": "" })),
            ("assets", json!([])),
            ("actions", json!({ "prerender": [], "postrender": [] })),
            ("createdAt", stamp.clone()),
            ("updatedAt", stamp),
            ("startedAt", Value::Null),
            ("finishedAt", Value::Null),
            ("errorAt", Value::Null),
            ("creator", Value::Null),
            ("executor", Value::Null),
            ("error", json!([])),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();

        Self { uid, record }
    }

    /// Build a new job from a create request body
    ///
    /// The body is overlaid on the defaults. `uid`, `state`, `creator` and
    /// both store-managed timestamps are always taken from the arguments,
    /// whatever the body says. String tags are sanitized.
    pub fn from_request(
        body: Value,
        uid: String,
        creator: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        let Value::Object(mut fields) = body else {
            return Err(ModelError::NotAnObject);
        };
        for key in CREATE_MANAGED_KEYS {
            fields.remove(key);
        }

        let mut job = Job::new(uid, now);
        job.record.extend(fields);
        job.record.insert("creator".to_string(), json!(creator));
        if let Some(Value::String(tags)) = job.record.get_mut("tags") {
            *tags = sanitize_tags(tags);
        }

        Ok(job)
    }

    /// Shallow-merge a patch over this job
    ///
    /// Every key in the patch replaces the stored value as-is, `state`
    /// included. The uid never changes and `updatedAt` becomes `now`,
    /// clamped so it never moves backwards.
    pub fn merged(&self, patch: Value, now: DateTime<Utc>) -> Result<Self, ModelError> {
        let Value::Object(mut fields) = patch else {
            return Err(ModelError::NotAnObject);
        };
        for key in UPDATE_MANAGED_KEYS {
            fields.remove(key);
        }

        let mut job = self.clone();
        job.record.extend(fields);
        job.touch(now);

        Ok(job)
    }

    /// This job moved to `picked` by `executor`
    pub fn claimed(&self, executor: Option<String>, now: DateTime<Utc>) -> Self {
        let mut job = self.clone();
        job.record
            .insert("state".to_string(), json!(JobState::Picked.as_str()));
        job.record.insert("executor".to_string(), json!(executor));
        job.touch(now);
        job
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        let stamp = self.updated_at().map_or(now, |previous| now.max(previous));
        self.record
            .insert("updatedAt".to_string(), timestamp(stamp));
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Raw value of any field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.record
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.record.get(key).and_then(Value::as_str)
    }

    fn time_field(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.str_field(key)?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|time| time.with_timezone(&Utc))
    }

    /// State string exactly as stored
    pub fn state_str(&self) -> Option<&str> {
        self.str_field("state")
    }

    /// `None` when the stored state is missing or outside the known vocabulary
    pub fn state(&self) -> Option<JobState> {
        self.state_str().and_then(|state| state.parse().ok())
    }

    pub fn is_queued(&self) -> bool {
        self.state() == Some(JobState::Queued)
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_some_and(|state| state.is_terminal())
    }

    pub fn job_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    /// Comma separated tags; empty when the stored value is not a string
    pub fn tags(&self) -> &str {
        self.str_field("tags").unwrap_or_default()
    }

    pub fn priority(&self) -> Option<i64> {
        self.record.get("priority").and_then(Value::as_i64)
    }

    pub fn render_progress(&self) -> Option<f64> {
        self.record.get("renderProgress").and_then(Value::as_f64)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.time_field("createdAt")
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.time_field("updatedAt")
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.time_field("startedAt")
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.time_field("finishedAt")
    }

    pub fn creator(&self) -> Option<&str> {
        self.str_field("creator")
    }

    pub fn executor(&self) -> Option<&str> {
        self.str_field("executor")
    }

    pub fn status(&self) -> JobStatus {
        JobStatus::from(self)
    }
}

impl TryFrom<Map<String, Value>> for Job {
    type Error = ModelError;

    fn try_from(record: Map<String, Value>) -> Result<Self, ModelError> {
        let uid = record
            .get("uid")
            .and_then(Value::as_str)
            .ok_or(ModelError::MissingUid)?
            .to_string();
        Ok(Self { uid, record })
    }
}

impl From<Job> for Map<String, Value> {
    fn from(job: Job) -> Self {
        job.record
    }
}

fn timestamp(time: DateTime<Utc>) -> Value {
    Value::String(time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}
