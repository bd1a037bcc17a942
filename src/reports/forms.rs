//! Creation forms for report types

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

pub const MISSING_FIELDS: &str = "Please fill all fields.";

/// An image picked for upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    /// Names the file `<millis + index>.<ext>` with content type `image/<ext>`
    pub fn new(bytes: Vec<u8>, extension: &str, index: usize) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        let ext = if ext.is_empty() { "jpg".to_string() } else { ext };
        let stamp = chrono::Utc::now().timestamp_millis() + index as i64;
        Self {
            file_name: format!("{}.{}", stamp, ext),
            content_type: format!("image/{}", ext),
            bytes,
        }
    }

    pub async fn from_path(path: &Path, index: usize) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::general(format!("cannot read {}: {}", path.display(), e)))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        Ok(Self::new(bytes, ext, index))
    }

    fn into_part(self) -> Result<Part> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?)
    }
}

/// Loads every path as an attachment, numbering them in order
pub async fn load_images<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ImageAttachment>> {
    let mut images = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        images.push(ImageAttachment::from_path(path.as_ref(), index).await?);
    }
    Ok(images)
}

fn require(fields: &[&str]) -> Result<()> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(Error::validation(MISSING_FIELDS));
    }
    Ok(())
}

fn attach(mut form: Form, images: Vec<ImageAttachment>) -> Result<Form> {
    for image in images {
        form = form.part("images[]", image.into_part()?);
    }
    Ok(form)
}

/// Steps are numbered from 1, matching what the web app stores
fn encode_steps(steps: &[String]) -> Result<String> {
    let numbered: BTreeMap<String, &String> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| ((i + 1).to_string(), step))
        .collect();
    Ok(serde_json::to_string(&numbered)?)
}

#[derive(Debug, Clone, Default)]
pub struct NewIncident {
    pub description: String,
    /// `open` or `closed`
    pub investigation_status: String,
    /// `yes` or `no`
    pub incident_status: String,
    pub incident_type_id: String,
    pub images: Vec<ImageAttachment>,
}

impl NewIncident {
    pub fn validate(&self) -> Result<()> {
        require(&[
            &self.description,
            &self.investigation_status,
            &self.incident_status,
        ])
    }

    pub fn into_form(self, user_id: i64) -> Result<Form> {
        let form = Form::new()
            .text("incident_description", self.description)
            .text("investigation_status", self.investigation_status)
            .text("incident_status", self.incident_status)
            .text("incident_type_id", self.incident_type_id);
        Ok(attach(form, self.images)?.text("user_id", user_id.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSor {
    pub observation: String,
    pub status: String,
    pub steps_taken: Vec<String>,
    pub action_owner: String,
    pub type_id: String,
    pub images: Vec<ImageAttachment>,
}

impl NewSor {
    pub fn validate(&self) -> Result<()> {
        require(&[&self.observation, &self.status, &self.action_owner])
    }

    pub fn into_form(self, assignor_id: i64) -> Result<Form> {
        let form = Form::new()
            .text("observation", self.observation)
            .text("status", self.status)
            .text("steps_taken", encode_steps(&self.steps_taken)?)
            .text("action_owner", self.action_owner)
            .text("type_id", self.type_id);
        Ok(attach(form, self.images)?.text("assignor_id", assignor_id.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewIca {
    pub observation: String,
    pub status: String,
    pub steps_taken: Vec<String>,
    pub action_owner: String,
    pub images: Vec<ImageAttachment>,
}

impl NewIca {
    pub fn validate(&self) -> Result<()> {
        require(&[&self.observation, &self.status, &self.action_owner])
    }

    pub fn into_form(self) -> Result<Form> {
        let form = Form::new()
            .text("observation", self.observation)
            .text("status", self.status)
            .text("steps_taken", encode_steps(&self.steps_taken)?)
            .text("action_owner", self.action_owner);
        attach(form, self.images)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTraining {
    pub topic: String,
    pub attendees: String,
    pub comments: String,
    pub images: Vec<ImageAttachment>,
}

impl NewTraining {
    pub fn validate(&self) -> Result<()> {
        require(&[&self.topic, &self.attendees, &self.comments])
    }

    pub fn into_form(self) -> Result<Form> {
        let form = Form::new()
            .text("topic", self.topic)
            .text("attendees", self.attendees)
            .text("comments", self.comments);
        attach(form, self.images)
    }
}

/// JSON body of `POST personell`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPersonnel {
    pub designation: String,
    pub number: String,
}

impl NewPersonnel {
    pub fn validate(&self) -> Result<()> {
        require(&[&self.designation, &self.number])
    }
}
