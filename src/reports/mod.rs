//! Report endpoints
//!
//! One small client per report screen. All of them go through
//! [`AuthorizedClient`], so the 401 handling is the same everywhere.

mod forms;
mod types;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use qhse_session::DashboardStats;

use crate::error::{Error, Result};
use crate::gateway::{AuthorizedClient, Request};

pub use forms::*;
pub use types::*;

/// List responses come either flat (`{"data": [...]}`) or wrapped in a
/// paginator (`{"data": {"data": [...]}}`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListData<T> {
    Flat(Vec<T>),
    Paged { data: Vec<T> },
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: ListData<T>,
}

impl<T> ListEnvelope<T> {
    fn into_items(self) -> Vec<T> {
        match self.data {
            ListData::Flat(items) | ListData::Paged { data: items } => items,
        }
    }
}

async fn fetch_list<T: DeserializeOwned>(
    gateway: &AuthorizedClient,
    request: Request,
) -> Result<Vec<T>> {
    let envelope: ListEnvelope<T> = gateway.fetch_json(request).await?;
    Ok(envelope.into_items())
}

/// A screen's list source
#[async_trait]
pub trait ReportList: Send + Sync {
    type Item: Identified + Clone + Send + Sync;

    /// Display name used in messages, e.g. `Near Miss`
    fn label(&self) -> &'static str;

    fn gateway(&self) -> &AuthorizedClient;

    async fn list(&self) -> Result<Vec<Self::Item>>;
}

/// A list source whose rows can be deleted
#[async_trait]
pub trait ReportDelete: ReportList {
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Validates a form, alerting the user on failure
fn check(gateway: &AuthorizedClient, validation: Result<()>) -> Result<()> {
    if let Err(e) = validation {
        if let Error::Validation(msg) = &e {
            gateway.alert(msg);
        }
        return Err(e);
    }
    Ok(())
}

async fn delete_at(gateway: &AuthorizedClient, path: String, label: &str) -> Result<()> {
    let request = Request::delete(gateway.api_url(&path)?)
        .on_failure(&format!("Error deleting {}", label.to_lowercase()));
    gateway.execute(request).await?;
    info!(%path, "record deleted");
    Ok(())
}

/// Posts a multipart form to the web app and confirms with an alert
///
/// Success is decided by the status alone. The body is returned when it is
/// JSON and as `Value::Null` otherwise.
async fn submit(
    gateway: &AuthorizedClient,
    path: &str,
    form: reqwest::multipart::Form,
    record: &str,
) -> Result<Value> {
    let request = Request::post(gateway.webapp_url(path)?)
        .multipart(form)
        .on_failure(&format!("Failed to create {} record.", record));
    let response = gateway.send(request).await?;
    let created = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        Err(e) => {
            debug!(%path, error = %e, "could not read create response body");
            Value::Null
        }
    };
    info!(%path, "{} record created", record);
    gateway.alert(&format!("{} record created successfully.", record));
    Ok(created)
}

/// Incident category codes understood by `incidents?type=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentKind {
    NearMiss,
    MedicalTreatment,
    Other(u32),
}

impl IncidentKind {
    pub fn code(self) -> u32 {
        match self {
            IncidentKind::NearMiss => 1,
            IncidentKind::MedicalTreatment => 3,
            IncidentKind::Other(code) => code,
        }
    }
}

/// Which incidents a screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentFilter {
    All,
    Type(IncidentKind),
    /// `no` lists incidents that are still open
    Status(String),
}

impl IncidentFilter {
    pub fn open() -> Self {
        IncidentFilter::Status("no".to_string())
    }
}

pub struct Incidents {
    gateway: AuthorizedClient,
    filter: IncidentFilter,
}

impl Incidents {
    pub fn new(gateway: AuthorizedClient, filter: IncidentFilter) -> Self {
        Self { gateway, filter }
    }

    pub fn filter(&self) -> &IncidentFilter {
        &self.filter
    }

    /// Options for the incident type dropdown
    pub async fn types(&self) -> Result<Vec<IncidentTypeEntry>> {
        let request = Request::get(self.gateway.api_url("incident-types")?)
            .on_failure("Error fetching incident types");
        fetch_list(&self.gateway, request).await
    }

    /// Multipart submission, tagged with the stored user's id
    pub async fn create(&self, form: NewIncident) -> Result<Value> {
        check(&self.gateway, form.validate())?;
        let user = self.gateway.require_user().await?;
        submit(&self.gateway, "api/incident", form.into_form(user.id)?, "Incident").await
    }
}

#[async_trait]
impl ReportList for Incidents {
    type Item = Incident;

    fn label(&self) -> &'static str {
        match self.filter {
            IncidentFilter::Type(IncidentKind::NearMiss) => "Near Miss",
            IncidentFilter::Type(IncidentKind::MedicalTreatment) => "Medical Treated Case",
            _ => "Incident",
        }
    }

    fn gateway(&self) -> &AuthorizedClient {
        &self.gateway
    }

    async fn list(&self) -> Result<Vec<Incident>> {
        let mut request = Request::get(self.gateway.api_url("incidents")?)
            .on_failure("Error fetching incidents");
        request = match &self.filter {
            IncidentFilter::All => request,
            IncidentFilter::Type(kind) => request.query("type", kind.code()),
            IncidentFilter::Status(status) => request.query("status", status),
        };
        fetch_list(&self.gateway, request).await
    }
}

#[async_trait]
impl ReportDelete for Incidents {
    async fn delete(&self, id: i64) -> Result<()> {
        delete_at(&self.gateway, format!("incidents/{}", id), self.label()).await
    }
}

/// SOR sub-categories understood by `sors?sors_type=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SorKind {
    BadPractice,
    GoodPractice,
    SuggestedImprovement,
    Other(u32),
}

impl SorKind {
    pub fn code(self) -> u32 {
        match self {
            SorKind::BadPractice => 1,
            SorKind::GoodPractice => 2,
            SorKind::SuggestedImprovement => 4,
            SorKind::Other(code) => code,
        }
    }
}

pub struct Sors {
    gateway: AuthorizedClient,
    kind: SorKind,
}

impl Sors {
    pub fn new(gateway: AuthorizedClient, kind: SorKind) -> Self {
        Self { gateway, kind }
    }

    pub fn kind(&self) -> SorKind {
        self.kind
    }

    /// Options for the record type dropdown
    pub async fn types(&self) -> Result<Vec<SorTypeEntry>> {
        #[derive(Deserialize)]
        struct Envelope {
            data: Value,
        }
        let request = Request::get(self.gateway.api_url("sor-types")?)
            .on_failure("Error fetching SOR types");
        let envelope: Envelope = self.gateway.fetch_json(request).await?;
        Ok(SorTypeEntry::parse_list(&envelope.data))
    }

    /// Multipart submission, with the stored user as assignor
    pub async fn create(&self, form: NewSor) -> Result<Value> {
        check(&self.gateway, form.validate())?;
        let user = self.gateway.require_user().await?;
        submit(&self.gateway, "api/sor", form.into_form(user.id)?, "SOR").await
    }
}

#[async_trait]
impl ReportList for Sors {
    type Item = Sor;

    fn label(&self) -> &'static str {
        match self.kind {
            SorKind::BadPractice => "Bad practice",
            SorKind::GoodPractice => "Good practice",
            SorKind::SuggestedImprovement => "Suggested improvement",
            SorKind::Other(_) => "Record",
        }
    }

    fn gateway(&self) -> &AuthorizedClient {
        &self.gateway
    }

    async fn list(&self) -> Result<Vec<Sor>> {
        let request = Request::get(self.gateway.api_url("sors")?)
            .query("sors_type", self.kind.code())
            .on_failure("Error fetching records");
        fetch_list(&self.gateway, request).await
    }
}

#[async_trait]
impl ReportDelete for Sors {
    async fn delete(&self, id: i64) -> Result<()> {
        delete_at(&self.gateway, format!("sors/{}", id), self.label()).await
    }
}

pub struct Icas {
    gateway: AuthorizedClient,
}

impl Icas {
    pub fn new(gateway: AuthorizedClient) -> Self {
        Self { gateway }
    }

    pub async fn create(&self, form: NewIca) -> Result<Value> {
        check(&self.gateway, form.validate())?;
        submit(&self.gateway, "api/ica", form.into_form()?, "ICA").await
    }
}

#[async_trait]
impl ReportList for Icas {
    type Item = Ica;

    fn label(&self) -> &'static str {
        "ICA"
    }

    fn gateway(&self) -> &AuthorizedClient {
        &self.gateway
    }

    async fn list(&self) -> Result<Vec<Ica>> {
        let request = Request::get(self.gateway.api_url("icas")?).on_failure("Error fetching ICAs");
        fetch_list(&self.gateway, request).await
    }
}

#[async_trait]
impl ReportDelete for Icas {
    async fn delete(&self, id: i64) -> Result<()> {
        delete_at(&self.gateway, format!("icas/{}", id), self.label()).await
    }
}

pub struct Trainings {
    gateway: AuthorizedClient,
}

impl Trainings {
    pub fn new(gateway: AuthorizedClient) -> Self {
        Self { gateway }
    }

    pub async fn create(&self, form: NewTraining) -> Result<Value> {
        check(&self.gateway, form.validate())?;
        submit(&self.gateway, "api/trainings", form.into_form()?, "Training").await
    }
}

#[async_trait]
impl ReportList for Trainings {
    type Item = Training;

    fn label(&self) -> &'static str {
        "Training"
    }

    fn gateway(&self) -> &AuthorizedClient {
        &self.gateway
    }

    async fn list(&self) -> Result<Vec<Training>> {
        let request =
            Request::get(self.gateway.api_url("training")?).on_failure("Error fetching trainings");
        fetch_list(&self.gateway, request).await
    }
}

pub struct Tasks {
    gateway: AuthorizedClient,
}

impl Tasks {
    pub fn new(gateway: AuthorizedClient) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ReportList for Tasks {
    type Item = Task;

    fn label(&self) -> &'static str {
        "Task"
    }

    fn gateway(&self) -> &AuthorizedClient {
        &self.gateway
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let request = Request::get(self.gateway.api_url("tasks")?).on_failure("Error fetching tasks");
        fetch_list(&self.gateway, request).await
    }
}

pub struct Permits {
    gateway: AuthorizedClient,
}

impl Permits {
    pub fn new(gateway: AuthorizedClient) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ReportList for Permits {
    type Item = Permit;

    fn label(&self) -> &'static str {
        "Permit"
    }

    fn gateway(&self) -> &AuthorizedClient {
        &self.gateway
    }

    async fn list(&self) -> Result<Vec<Permit>> {
        let request =
            Request::get(self.gateway.api_url("permits")?).on_failure("Error fetching permits");
        fetch_list(&self.gateway, request).await
    }
}

pub struct PersonnelRegister {
    gateway: AuthorizedClient,
}

impl PersonnelRegister {
    pub fn new(gateway: AuthorizedClient) -> Self {
        Self { gateway }
    }

    /// JSON submission to the API
    pub async fn create(&self, form: NewPersonnel) -> Result<()> {
        check(&self.gateway, form.validate())?;
        let request = Request::post(self.gateway.api_url("personell")?)
            .json(&form)?
            .on_failure("Error adding personnel");
        self.gateway.execute(request).await?;
        info!(designation = %form.designation, "personnel entry added");
        self.gateway.alert("Personnel added successfully");
        Ok(())
    }
}

#[async_trait]
impl ReportList for PersonnelRegister {
    type Item = Personnel;

    fn label(&self) -> &'static str {
        "Personnel"
    }

    fn gateway(&self) -> &AuthorizedClient {
        &self.gateway
    }

    async fn list(&self) -> Result<Vec<Personnel>> {
        let request = Request::get(self.gateway.api_url("personell")?)
            .on_failure("Error fetching personnel data");
        fetch_list(&self.gateway, request).await
    }
}

#[async_trait]
impl ReportDelete for PersonnelRegister {
    async fn delete(&self, id: i64) -> Result<()> {
        delete_at(&self.gateway, format!("personell/{}", id), self.label()).await
    }
}

/// Fetches `dashboard-stats` and replaces the cached snapshot
pub async fn refresh_dashboard(gateway: &AuthorizedClient) -> Result<DashboardStats> {
    let request = Request::get(gateway.api_url("dashboard-stats")?)
        .on_failure("Error fetching dashboard stats");
    let stats: DashboardStats = gateway.fetch_json(request).await?;
    gateway.session().set_dashboard_stats(stats.clone());
    Ok(stats)
}

pub async fn fetch_profile(gateway: &AuthorizedClient) -> Result<Profile> {
    let request = Request::get(gateway.api_url("profile")?).on_failure("Error fetching profile");
    gateway.fetch_json(request).await
}
