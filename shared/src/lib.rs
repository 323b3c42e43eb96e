use serde::{Deserialize, Serialize};

/// A quotation with its installment schedule, as served over the wire.
///
/// Built fresh on every read by folding joined quotation/payment rows;
/// never cached or mutated in place. Scalar fields are pass-through: this
/// layer performs no validation, so anything absent in storage is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationAggregate {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date: Option<String>,
    pub designation: Option<String>,
    pub domain: Option<String>,
    pub entitle: Option<String>,
    pub description: Option<String>,
    /// Number of installments in `installments`. Kept as an explicit field
    /// because clients render it directly.
    pub total_installment: u32,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub total: Option<f64>,
    pub discount: Option<f64>,
    pub grand_total: Option<f64>,
    pub input_count: Option<i64>,
    /// Ordered by payment row order; not separately sorted.
    pub installments: Vec<Installment>,
}

/// One scheduled partial payment belonging to a quotation.
///
/// No identity of its own beyond the parent id plus position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub label: String,
    /// A date or relative-due descriptor ("2024-01-01", "on delivery", ...).
    pub due_when: Option<String>,
    pub installment_amount: Option<f64>,
}

/// A submitted quotation: scalar fields plus the full installment schedule.
///
/// Used for both create and update; an update replaces the stored schedule
/// wholesale with `installments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date: Option<String>,
    pub designation: Option<String>,
    pub domain: Option<String>,
    pub entitle: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub total: Option<f64>,
    pub discount: Option<f64>,
    pub grand_total: Option<f64>,
    pub input_count: Option<i64>,
    #[serde(default)]
    pub installments: Vec<Installment>,
}

/// Response to a successful create: the generated quotation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateQuotationResponse {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Employee registration request. Password handling (hashing, tokens) is a
/// collaborator concern; this service stores and compares as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub gender: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request to check whether an email is already registered. Registration
/// forms call this for live feedback before submitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckEmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckEmailResponse {
    pub exists: bool,
}

/// Employee as returned to clients. Never carries the password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub gender: Option<String>,
    pub role: Option<String>,
}
