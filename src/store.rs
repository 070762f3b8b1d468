use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::filter::ClassFilter;
use crate::models::{ClassDefinition, ClassType};

/// Most ids the document store accepts in a single `in` filter.
pub const IN_QUERY_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Class {class_id} not found in studio {studio_id}")]
    NotFound { studio_id: String, class_id: String },
    #[error("Document store URL cannot be used as a base: {0}")]
    InvalidBaseUrl(String),
}

/// Class document as the store returns it. Fields the schedule does not use
/// (fees, rate plans, timestamps) are ignored here and never reach the rest
/// of the crate.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ClassRecord {
    #[serde(rename = "id")]
    pub id: String,
    pub class_name: String,
    #[serde(default)]
    pub class_type: ClassType,
    pub description: Option<String>,
    #[serde(default)]
    pub days: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub season_id: Option<String>,
    pub room_id: Option<String>,
    pub instructor_id: Option<String>,
    pub class_style_id: Option<String>,
    #[serde(default)]
    pub max_size: u32,
    #[serde(default)]
    pub students: Vec<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    #[serde(default)]
    pub enforce_age_limit: bool,
}

impl From<ClassRecord> for ClassDefinition {
    fn from(record: ClassRecord) -> Self {
        ClassDefinition {
            id: record.id,
            name: record.class_name,
            class_type: record.class_type,
            description: record.description,
            weekdays: record.days,
            start_time: record.start_time,
            end_time: record.end_time,
            season_id: record.season_id,
            room_id: record.room_id,
            instructor_id: record.instructor_id,
            class_style_id: record.class_style_id,
            max_size: record.max_size,
            enrolled_student_ids: record.students,
            min_age: record.min_age,
            max_age: record.max_age,
            enforce_age_limit: record.enforce_age_limit,
        }
    }
}

/// Read-only client for the per-studio class collections of the hosted
/// document store.
#[derive(Clone)]
pub struct DocumentStore {
    client: reqwest::Client,
    base_url: Arc<Url>,
}

impl DocumentStore {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Arc::new(base_url),
        }
    }

    fn collection_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = (*self.base_url).clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetches the studio's classes that pass `filter`. The filter is sent as
    /// query hints, split into batches the store accepts, and applied again
    /// locally so the result does not depend on the store honouring it.
    pub async fn fetch_classes(
        &self,
        studio_id: &str,
        filter: &ClassFilter,
    ) -> Result<Vec<ClassDefinition>, StoreError> {
        let hints = query_hints(filter);
        let requests = hints.iter().map(|hint| self.fetch_batch(studio_id, hint));
        let batches = try_join_all(requests).await?;

        let mut seen = HashSet::new();
        let mut classes: Vec<ClassDefinition> = batches
            .into_iter()
            .flatten()
            .filter(|record| seen.insert(record.id.clone()))
            .map(ClassDefinition::from)
            .collect();
        let fetched = classes.len();
        filter.retain(&mut classes);
        debug!(
            studio_id,
            batches = hints.len(),
            fetched,
            kept = classes.len(),
            "fetched classes"
        );
        Ok(classes)
    }

    async fn fetch_batch(
        &self,
        studio_id: &str,
        hint: &QueryHint,
    ) -> Result<Vec<ClassRecord>, StoreError> {
        let mut url = self.collection_url(&["studios", studio_id, "classes"])?;
        let params: Vec<(&str, &str)> = [
            ("seasonId", hint.season_ids.as_deref()),
            ("roomId", hint.room_ids.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let records = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ClassRecord>>()
            .await?;
        Ok(records)
    }

    pub async fn fetch_class(
        &self,
        studio_id: &str,
        class_id: &str,
    ) -> Result<ClassDefinition, StoreError> {
        let url = self.collection_url(&["studios", studio_id, "classes", class_id])?;
        let response = self.client.get(url.as_str()).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                studio_id: studio_id.to_string(),
                class_id: class_id.to_string(),
            });
        }
        let record = response.error_for_status()?.json::<ClassRecord>().await?;
        Ok(record.into())
    }
}

/// Comma-joined id lists sent with one collection request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct QueryHint {
    season_ids: Option<String>,
    room_ids: Option<String>,
}

/// One request per batch of at most [`IN_QUERY_LIMIT`] season ids. Rooms are
/// only hinted when they fit in a single `in` filter; otherwise the store
/// returns every room and the local filter narrows the result.
fn query_hints(filter: &ClassFilter) -> Vec<QueryHint> {
    let room_ids = filter
        .room_ids()
        .filter(|ids| ids.len() <= IN_QUERY_LIMIT)
        .map(|ids| join_ids(ids.iter()));

    match filter.season_ids() {
        Some(ids) => {
            let ids: Vec<&String> = ids.iter().collect();
            ids.chunks(IN_QUERY_LIMIT)
                .map(|chunk| QueryHint {
                    season_ids: Some(join_ids(chunk.iter().copied())),
                    room_ids: room_ids.clone(),
                })
                .collect()
        }
        None => vec![QueryHint {
            season_ids: None,
            room_ids,
        }],
    }
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a String>) -> String {
    ids.map(String::as_str).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_class_record_into_definition() {
        let json = serde_json::json!({
            "id": "abc",
            "ClassId": "abc",
            "ClassName": "Jazz Teens",
            "ClassType": "Workshop",
            "Days": ["Monday", "wed"],
            "StartTime": "16:00",
            "EndTime": "17:00",
            "SeasonId": "fall",
            "RoomId": "studio-a",
            "InstructorId": "i1",
            "MaxSize": 12,
            "Students": ["st1", "st2"],
            "EnforceAgeLimit": true,
            "MinAge": 13,
            "MaxAge": 17,
            "RatePlanId": "rp1",
            "CreatedAt": "2024-01-01T00:00:00Z"
        });
        let record: ClassRecord = serde_json::from_value(json).unwrap();
        let def = ClassDefinition::from(record);

        assert_eq!(def.id, "abc");
        assert_eq!(def.name, "Jazz Teens");
        assert_eq!(def.class_type, ClassType::Workshop);
        assert_eq!(def.weekdays, vec!["Monday", "wed"]);
        assert_eq!(def.room_id.as_deref(), Some("studio-a"));
        assert_eq!(def.enrolled_count(), 2);
        assert_eq!(def.age_range_label().as_deref(), Some("13 - 17 years"));
    }

    #[test]
    fn test_class_record_defaults() {
        let json = serde_json::json!({
            "id": "min",
            "ClassName": "Open Practice",
            "StartTime": "10:00",
            "EndTime": "11:00"
        });
        let record: ClassRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.class_type, ClassType::Regular);
        assert!(record.days.is_empty());
        assert!(record.students.is_empty());
        assert_eq!(record.season_id, None);
    }

    #[test]
    fn test_collection_url_encodes_segments() {
        let store = DocumentStore::new(Url::parse("https://store.example.com/v1/").unwrap());
        let url = store
            .collection_url(&["studios", "my studio", "classes"])
            .unwrap();
        assert_eq!(url.as_str(), "https://store.example.com/v1/studios/my%20studio/classes");
    }

    #[test]
    fn test_collection_url_rejects_non_base() {
        let store = DocumentStore::new(Url::parse("mailto:ops@example.com").unwrap());
        assert!(matches!(
            store.collection_url(&["studios"]),
            Err(StoreError::InvalidBaseUrl(_))
        ));
    }

    fn numbered(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{prefix}{i:02}")).collect()
    }

    fn record(id: &str, season_id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "ClassName": format!("Class {id}"),
            "Days": ["Mon"],
            "StartTime": "17:00",
            "EndTime": "18:00",
            "SeasonId": season_id,
            "RoomId": "r00"
        })
    }

    #[test]
    fn test_query_hints_unrestricted() {
        assert_eq!(query_hints(&ClassFilter::default()), vec![QueryHint::default()]);
    }

    #[test]
    fn test_query_hints_split_seasons_into_batches() {
        let filter = ClassFilter::new(numbered("s", 11), ["r1", "r2"]);
        let hints = query_hints(&filter);

        assert_eq!(hints.len(), 2);
        assert_eq!(
            hints[0].season_ids.as_deref(),
            Some("s00,s01,s02,s03,s04,s05,s06,s07,s08,s09")
        );
        assert_eq!(hints[1].season_ids.as_deref(), Some("s10"));
        assert!(hints.iter().all(|h| h.room_ids.as_deref() == Some("r1,r2")));
    }

    #[test]
    fn test_query_hints_drop_rooms_over_limit() {
        let filter = ClassFilter::new(Vec::<String>::new(), numbered("r", 11));
        let hints = query_hints(&filter);

        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].season_ids, None);
        assert_eq!(hints[0].room_ids, None);
    }

    #[tokio::test]
    async fn test_fetch_classes_merges_batches_in_first_seen_order() {
        // Arrange
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/studios/s1/classes")
                .query_param("seasonId", "s00,s01,s02,s03,s04,s05,s06,s07,s08,s09")
                .query_param_missing("roomId");
            then.status(200)
                .json_body(serde_json::json!([record("a", "s00"), record("shared", "s05")]));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/studios/s1/classes")
                .query_param("seasonId", "s10")
                .query_param_missing("roomId");
            then.status(200)
                .json_body(serde_json::json!([record("shared", "s05"), record("b", "s10")]));
        });
        let store = DocumentStore::new(Url::parse(&server.base_url()).unwrap());
        let filter = ClassFilter::new(numbered("s", 11), numbered("r", 11));

        // Act
        let classes = store.fetch_classes("s1", &filter).await.unwrap();

        // Assert
        first.assert_async().await;
        second.assert_async().await;
        let ids: Vec<&str> = classes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "shared", "b"]);
    }

    #[tokio::test]
    async fn test_fetch_class_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/studios/s1/classes/gone");
            then.status(404);
        });
        let store = DocumentStore::new(Url::parse(&server.base_url()).unwrap());

        let result = store.fetch_class("s1", "gone").await;

        assert!(matches!(
            result,
            Err(StoreError::NotFound { class_id, .. }) if class_id == "gone"
        ));
    }
}
