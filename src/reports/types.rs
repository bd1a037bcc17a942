//! Report records as the backend returns them
//!
//! Only `id` is required; everything a screen merely displays is optional so
//! a sparse row never fails a whole list.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use qhse_session::UserProfile;

use crate::media::{clean_media_url, format_incident_type};

/// Records that can be addressed by id
pub trait Identified {
    fn id(&self) -> i64;
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// An attached image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
}

impl Media {
    /// URL safe to hand to an image view, if the upload has one
    pub fn display_url(&self, media_url: &str) -> Option<String> {
        self.original_url
            .as_deref()
            .map(|url| clean_media_url(url, media_url))
    }
}

/// `{ "name": ... }` reference to the reporting user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentTypeRef {
    #[serde(default)]
    pub incident_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    #[serde(default)]
    pub incident_description: Option<String>,
    #[serde(default)]
    pub incident_date: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub incident_status: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub investigation_status: Option<String>,
    #[serde(default)]
    pub incident_type: Option<IncidentTypeRef>,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default, deserialize_with = "vec_or_null")]
    pub media: Vec<Media>,
}

impl Incident {
    /// Human label for the incident type, e.g. `Near Miss`
    pub fn type_label(&self) -> Option<String> {
        self.incident_type
            .as_ref()
            .and_then(|t| t.incident_type.as_deref())
            .map(format_incident_type)
    }

    pub fn reporter(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }
}

/// Safety observation record or immediate corrective action
///
/// Both report kinds share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    #[serde(default)]
    pub observation: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub status: Option<String>,
    #[serde(default)]
    pub steps_taken: Option<Value>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub action_owner: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "vec_or_null")]
    pub media: Vec<Media>,
}

pub type Sor = Observation;
pub type Ica = Observation;

impl Observation {
    /// Steps in order
    ///
    /// The backend stores them as `{"1": "...", "2": "..."}`, sometimes as an
    /// array, sometimes JSON-encoded inside a string.
    pub fn steps(&self) -> Vec<String> {
        self.steps_taken.as_ref().map(steps_from_value).unwrap_or_default()
    }
}

fn steps_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(step_text).collect(),
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            });
            entries.into_iter().filter_map(|(_, v)| step_text(v)).collect()
        }
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(inner @ (Value::Array(_) | Value::Object(_))) => steps_from_value(&inner),
            _ if s.trim().is_empty() => Vec::new(),
            _ => vec![s.clone()],
        },
        _ => Vec::new(),
    }
}

fn step_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: i64,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub attendees: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "vec_or_null")]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub to: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default, deserialize_with = "vec_or_null")]
    pub media: Vec<Media>,
}

/// Head count for one designation on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personnel {
    pub id: i64,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permit {
    pub id: i64,
    #[serde(default, rename = "type")]
    pub permit_type: Option<String>,
    #[serde(default)]
    pub area_owner: Option<String>,
    #[serde(default)]
    pub authorized_person: Option<String>,
    #[serde(default)]
    pub competent_person: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
}

/// Entry of the `incident-types` lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentTypeEntry {
    pub id: i64,
    pub incident_type: String,
}

impl IncidentTypeEntry {
    pub fn label(&self) -> String {
        format_incident_type(&self.incident_type)
    }
}

/// Entry of the `sor-types` lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SorTypeEntry {
    pub id: String,
    pub label: String,
}

impl SorTypeEntry {
    /// Accepts either an `{id: label}` map or a list of `{id, name}` rows.
    pub fn parse_list(data: &Value) -> Vec<SorTypeEntry> {
        match data {
            Value::Object(map) => map
                .iter()
                .filter_map(|(id, label)| {
                    step_text(label).map(|label| SorTypeEntry {
                        id: id.clone(),
                        label,
                    })
                })
                .collect(),
            Value::Array(rows) => rows
                .iter()
                .filter_map(|row| {
                    let id = step_text(row.get("id")?)?;
                    let label = ["name", "sor_type", "type", "title"]
                        .iter()
                        .find_map(|key| row.get(*key).and_then(step_text))
                        .unwrap_or_else(|| id.clone());
                    Some(SorTypeEntry { id, label })
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of `GET profile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: UserProfile,
    #[serde(default, deserialize_with = "vec_or_null")]
    pub activities: Vec<Activity>,
}

macro_rules! identified {
    ($($ty:ty),*) => {
        $(impl Identified for $ty {
            fn id(&self) -> i64 {
                self.id
            }
        })*
    };
}

identified!(Incident, Observation, Training, Task, Personnel, Permit);
