//! Job DTOs

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::job::Job;

/// Outcome of a delete request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub id: String,
    pub removed: bool,
}

/// Pickup answer: the claimed job, or `{}` when nothing is queued
///
/// Only an empty object decodes as [`PickupResponse::Empty`]. Any other
/// object must be a job record, so a claimed job is never mistaken for an
/// empty queue.
#[derive(Debug, Clone, PartialEq)]
pub enum PickupResponse {
    Job(Job),
    Empty,
}

impl PickupResponse {
    pub fn into_job(self) -> Option<Job> {
        match self {
            PickupResponse::Job(job) => Some(job),
            PickupResponse::Empty => None,
        }
    }
}

impl From<Option<Job>> for PickupResponse {
    fn from(job: Option<Job>) -> Self {
        match job {
            Some(job) => PickupResponse::Job(job),
            None => PickupResponse::Empty,
        }
    }
}

impl Serialize for PickupResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PickupResponse::Job(job) => job.serialize(serializer),
            PickupResponse::Empty => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

impl<'de> Deserialize<'de> for PickupResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Map::<String, Value>::deserialize(deserializer)?;
        if record.is_empty() {
            return Ok(PickupResponse::Empty);
        }

        Job::try_from(record)
            .map(PickupResponse::Job)
            .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pickup_is_empty_object() {
        let value = serde_json::to_value(PickupResponse::from(None)).unwrap();
        assert_eq!(value, serde_json::json!({}));

        let parsed: PickupResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.into_job().is_none());
    }

    #[test]
    fn test_job_pickup_parses_back() {
        let job = Job::new("j1".to_string(), chrono::Utc::now());
        let text = serde_json::to_string(&PickupResponse::from(Some(job.clone()))).unwrap();

        let parsed: PickupResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.into_job(), Some(job));
    }

    #[test]
    fn test_job_with_unknown_state_is_still_a_job() {
        let parsed: PickupResponse =
            serde_json::from_str(r#"{"uid":"j1","state":"paused","priority":null}"#).unwrap();

        let job = parsed.into_job().unwrap();
        assert_eq!(job.uid(), "j1");
        assert_eq!(job.state_str(), Some("paused"));
    }

    #[test]
    fn test_undecodable_pickup_is_an_error() {
        assert!(serde_json::from_str::<PickupResponse>(r#"{"state":"picked"}"#).is_err());
        assert!(serde_json::from_str::<PickupResponse>(r#"{"uid":7,"state":"picked"}"#).is_err());
        assert!(serde_json::from_str::<PickupResponse>("[]").is_err());
    }
}
