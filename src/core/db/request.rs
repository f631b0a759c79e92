use std::{fmt, future::Future, str::FromStr};

use time::OffsetDateTime;

/// Workflow position of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    /// Photos received, nothing measured yet
    Uploaded,
    /// Every photo has dimensions
    Analyzed,
    /// A quote was sent
    Quoted,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Uploaded => "uploaded",
            RequestStatus::Analyzed => "analyzed",
            RequestStatus::Quoted => "quoted",
        }
    }

    /// Allowed workflow moves. Re-analysis may follow a quote, and an operator
    /// can always reset a request to `Uploaded`.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (_, Uploaded) | (Uploaded, Analyzed) | (Analyzed, Analyzed) | (Analyzed, Quoted) | (Quoted, Analyzed)
        )
    }

    /// Accepts both the stored codes and the legacy labels, for importing old records
    pub fn from_import_label(label: &str) -> anyhow::Result<Self> {
        label.parse().or_else(|e| Self::from_legacy_label(label).ok_or(e))
    }

    /// Parse the localized labels older records were stored with
    pub fn from_legacy_label(label: &str) -> Option<Self> {
        match label.trim() {
            "자료업로드" => Some(RequestStatus::Uploaded),
            "분석완료" => Some(RequestStatus::Analyzed),
            "견적완료" => Some(RequestStatus::Quoted),
            _ => None,
        }
    }
}

impl FromStr for RequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(RequestStatus::Uploaded),
            "analyzed" => Ok(RequestStatus::Analyzed),
            "quoted" => Ok(RequestStatus::Quoted),
            _ => Err(anyhow::anyhow!("Invalid RequestStatus value: {}", s)),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct WindowRequest {
    pub id: i64,
    pub customer_name: String,
    pub phone: String,
    pub status: RequestStatus,
    pub memo: Option<String>,
    pub created_at: OffsetDateTime,
    pub(super) _guard: (),
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub customer_name: String,
    pub phone: String,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestUpdate {
    pub status: Option<RequestStatus>,
    pub memo: Option<Option<String>>,
}

pub trait RequestRepository {
    fn add_request(&self, request: &NewRequest) -> impl Future<Output = anyhow::Result<WindowRequest>>;
    fn get_request(&self, id: i64) -> impl Future<Output = anyhow::Result<Option<WindowRequest>>>;
    /// Newest first
    fn get_requests(&self) -> impl Future<Output = anyhow::Result<Vec<WindowRequest>>>;
    /// Fails if the status change is not an allowed transition
    fn update_request(&self, request: &WindowRequest, update: &RequestUpdate) -> impl Future<Output = anyhow::Result<WindowRequest>>;
    /// Insert a record carried over from the old system. `status_label` may be a
    /// legacy label; it is stored as the current code.
    fn import_request(&self, request: &NewRequest, status_label: &str) -> impl Future<Output = anyhow::Result<WindowRequest>>;
    /// Removes the request together with its images and their files
    fn delete_request(&self, request: WindowRequest) -> impl Future<Output = anyhow::Result<()>>;
}
