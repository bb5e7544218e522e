//! Status helper enum mapping to the `upload_job_statuses` lookup table.
//!
//! Variant discriminants match the seed data order (1-based) in the
//! migration that creates the table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Upload job lifecycle status.
///
/// Legal transitions:
///
/// ```text
/// pending -> uploading -> extracting -> processing -> completed
/// uploading | extracting | processing -> failed
/// pending | uploading | extracting | processing -> cancelled
/// ```
///
/// `completed`, `failed`, and `cancelled` are terminal.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadJobStatus {
    Pending = 1,
    Uploading = 2,
    Extracting = 3,
    Processing = 4,
    Completed = 5,
    Failed = 6,
    Cancelled = 7,
}

/// Terminal statuses: completed, failed, cancelled.
pub const TERMINAL_STATUSES: [StatusId; 3] = [
    UploadJobStatus::Completed as StatusId,
    UploadJobStatus::Failed as StatusId,
    UploadJobStatus::Cancelled as StatusId,
];

impl UploadJobStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Status name as seeded in `upload_job_statuses`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Extracting => "extracting",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse a status from its seeded name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pending" => Some(Self::Pending),
            "uploading" => Some(Self::Uploading),
            "extracting" => Some(Self::Extracting),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Resolve a raw database id back to the enum.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Uploading),
            3 => Some(Self::Extracting),
            4 => Some(Self::Processing),
            5 => Some(Self::Completed),
            6 => Some(Self::Failed),
            7 => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether this status ends the job's lifecycle.
    pub fn is_terminal(self) -> bool {
        TERMINAL_STATUSES.contains(&self.id())
    }
}

impl From<UploadJobStatus> for StatusId {
    fn from(value: UploadJobStatus) -> Self {
        value as StatusId
    }
}

impl std::fmt::Display for UploadJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
