use aiden_model::{EmployeeId, Organisation, OrganisationId, ScanId, User, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(error),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// ===== Scan API Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateScanRequest {
    pub email: String,
    /// Absent is treated like `false`.
    #[serde(default)]
    pub consent: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateScanResponse {
    pub scan_id: ScanId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResultsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorHealthResponse {
    pub reachable: bool,
}

// ===== Organisation API Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganisationResponse {
    pub organisation: Organisation,
}

/// Public view of an admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub organisation_id: OrganisationId,
    pub name: String,
    pub email: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            organisation_id: user.organisation_id,
            name: user.name,
            email: user.email,
        }
    }
}

// ===== Employee API Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkEmployeesRequest<T> {
    pub employees: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkEmployeesResponse {
    pub count: u64,
}

/// Body of the employee OSINT endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeTarget {
    pub employee_id: EmployeeId,
}

// ===== Auth API Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

// ===== Consent API Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecordedResponse {
    pub consent_id: aiden_model::ConsentId,
}
