use crate::aggregate::{self, AggregateError};
use crate::db::DbConnection;
use chrono::Utc;
use shared::{EmployeeProfile, QuotationAggregate, QuotationPayload, RegisterRequest};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("quotation not found")]
    QuotationNotFound,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Service for managing quotations and their installment schedules.
///
/// Reads fold joined rows into aggregates; writes decompose the submitted
/// payload back into relational rows. The service itself holds no state
/// beyond the connection handle.
#[derive(Clone)]
pub struct QuotationService {
    db: DbConnection,
}

impl QuotationService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// List all quotations as nested aggregates, first-seen id order.
    pub async fn list_quotations(&self) -> Result<Vec<QuotationAggregate>, DomainError> {
        let rows = self.db.list_quotation_rows().await?;
        let aggregates = aggregate::fold(rows);
        info!("Listed {} quotations", aggregates.len());
        Ok(aggregates)
    }

    /// Fetch one quotation with its installment schedule.
    pub async fn get_quotation(&self, id: i64) -> Result<QuotationAggregate, DomainError> {
        let rows = self.db.quotation_rows(id).await?;
        match aggregate::fold_single(rows) {
            Ok(aggregate) => Ok(aggregate),
            Err(AggregateError::NotFound) => {
                info!("Quotation {} not found", id);
                Err(DomainError::QuotationNotFound)
            }
        }
    }

    /// Create a quotation from a submitted payload. Returns the generated id.
    pub async fn create_quotation(&self, payload: QuotationPayload) -> Result<i64, DomainError> {
        // The owning id does not exist until the quotation row is inserted;
        // the storage layer tags the installment rows with the generated id
        // inside the same transaction, so the rows go in untagged.
        let row = aggregate::QuotationRow::from_payload(&payload);
        let id = self.db.create_quotation(&row, &payload.installments).await?;
        info!(
            "Created quotation {} with {} installments",
            id,
            payload.installments.len()
        );
        Ok(id)
    }

    /// Replace a quotation's scalar fields and entire installment schedule.
    pub async fn update_quotation(
        &self,
        id: i64,
        payload: QuotationPayload,
    ) -> Result<(), DomainError> {
        let (row, installments) = aggregate::decompose(&payload, id);
        let updated = self.db.update_quotation(id, &row, &installments).await?;
        if !updated {
            info!("Quotation {} not found for update", id);
            return Err(DomainError::QuotationNotFound);
        }
        info!("Updated quotation {} with {} installments", id, installments.len());
        Ok(())
    }

    /// Delete a quotation and its installment schedule.
    pub async fn delete_quotation(&self, id: i64) -> Result<(), DomainError> {
        let deleted = self.db.delete_quotation(id).await?;
        if !deleted {
            info!("Quotation {} not found for delete", id);
            return Err(DomainError::QuotationNotFound);
        }
        info!("Deleted quotation {}", id);
        Ok(())
    }
}

/// Service for employee registration and login.
///
/// Password hashing and token issuance are collaborator concerns and
/// deliberately absent here; the password is stored and compared as
/// received.
#[derive(Clone)]
pub struct EmployeeService {
    db: DbConnection,
}

impl EmployeeService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Register a new employee. Rejects malformed emails and duplicates.
    pub async fn register(&self, request: RegisterRequest) -> Result<EmployeeProfile, DomainError> {
        info!("Registering employee: {}", request.email);

        if !looks_like_email(&request.email) {
            return Err(DomainError::InvalidInput("Invalid email format".to_string()));
        }
        if request.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Name must not be empty".to_string()));
        }

        if self.db.find_employee_by_email(&request.email).await?.is_some() {
            info!("Email already registered: {}", request.email);
            return Err(DomainError::EmailTaken);
        }

        let created_at = Utc::now().to_rfc3339();
        let id = self
            .db
            .insert_employee(
                request.name.trim(),
                &request.email,
                &request.password,
                request.gender.as_deref(),
                request.role.as_deref(),
                &created_at,
            )
            .await?;

        info!("Registered employee {} with ID {}", request.email, id);
        Ok(EmployeeProfile {
            id,
            name: request.name.trim().to_string(),
            email: request.email,
            gender: request.gender,
            role: request.role,
        })
    }

    /// Check whether an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        let exists = self.db.find_employee_by_email(email).await?.is_some();
        info!("Email check for {}: exists={}", email, exists);
        Ok(exists)
    }

    /// Authenticate an employee by email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<EmployeeProfile, DomainError> {
        info!("Login attempt: {}", email);

        let employee = self
            .db
            .find_employee_by_email(email)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        if employee.password != password {
            info!("Password mismatch for {}", email);
            return Err(DomainError::InvalidCredentials);
        }

        Ok(EmployeeProfile {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            gender: employee.gender,
            role: employee.role,
        })
    }
}

// Shape check only; real validation is a collaborator concern.
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Installment;

    async fn setup_services() -> (QuotationService, EmployeeService) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        (QuotationService::new(db.clone()), EmployeeService::new(db))
    }

    fn payload(name: &str, installments: Vec<Installment>) -> QuotationPayload {
        QuotationPayload {
            name: Some(name.to_string()),
            email: None,
            gender: None,
            date: Some("2024-01-01".to_string()),
            designation: None,
            domain: None,
            entitle: Some("Website build".to_string()),
            description: None,
            price: Some(300.0),
            quantity: Some(1.0),
            total: Some(300.0),
            discount: Some(0.0),
            grand_total: Some(300.0),
            input_count: Some(installments.len() as i64),
            installments,
        }
    }

    fn deposit_and_final() -> Vec<Installment> {
        vec![
            Installment {
                label: "Deposit".to_string(),
                due_when: Some("2024-01-01".to_string()),
                installment_amount: Some(100.0),
            },
            Installment {
                label: "Final".to_string(),
                due_when: Some("2024-02-01".to_string()),
                installment_amount: Some(200.0),
            },
        ]
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips_the_payload() {
        let (quotations, _) = setup_services().await;

        let submitted = payload("Alice", deposit_and_final());
        let id = quotations.create_quotation(submitted.clone()).await.unwrap();

        let aggregate = quotations.get_quotation(id).await.unwrap();
        assert_eq!(aggregate.id, id);
        assert_eq!(aggregate.name, submitted.name);
        assert_eq!(aggregate.grand_total, submitted.grand_total);
        assert_eq!(aggregate.total_installment, 2);
        assert_eq!(aggregate.installments, submitted.installments);
    }

    #[tokio::test]
    async fn test_create_with_no_installments() {
        let (quotations, _) = setup_services().await;

        let id = quotations.create_quotation(payload("Bob", Vec::new())).await.unwrap();
        let aggregate = quotations.get_quotation(id).await.unwrap();

        assert_eq!(aggregate.total_installment, 0);
        assert!(aggregate.installments.is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_quotation_is_not_found() {
        let (quotations, _) = setup_services().await;

        let result = quotations.get_quotation(12345).await;
        assert!(matches!(result, Err(DomainError::QuotationNotFound)));
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let (quotations, _) = setup_services().await;

        let first = quotations
            .create_quotation(payload("Alice", deposit_and_final()))
            .await
            .unwrap();
        let second = quotations
            .create_quotation(payload("Bob", Vec::new()))
            .await
            .unwrap();

        let listed = quotations.list_quotations().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[1].id, second);
        assert_eq!(listed[0].total_installment, 2);
        assert_eq!(listed[1].total_installment, 0);
    }

    #[tokio::test]
    async fn test_update_replaces_schedule_wholesale() {
        let (quotations, _) = setup_services().await;

        let id = quotations
            .create_quotation(payload("Alice", deposit_and_final()))
            .await
            .unwrap();

        let replacement = payload(
            "Alicia",
            vec![Installment {
                label: "Single".to_string(),
                due_when: Some("2024-03-01".to_string()),
                installment_amount: Some(300.0),
            }],
        );
        quotations.update_quotation(id, replacement).await.unwrap();

        let aggregate = quotations.get_quotation(id).await.unwrap();
        assert_eq!(aggregate.name.as_deref(), Some("Alicia"));
        assert_eq!(aggregate.total_installment, 1);
        assert_eq!(aggregate.installments[0].label, "Single");
    }

    #[tokio::test]
    async fn test_update_unknown_quotation_is_not_found() {
        let (quotations, _) = setup_services().await;

        let result = quotations.update_quotation(999, payload("Ghost", Vec::new())).await;
        assert!(matches!(result, Err(DomainError::QuotationNotFound)));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (quotations, _) = setup_services().await;

        let id = quotations
            .create_quotation(payload("Alice", deposit_and_final()))
            .await
            .unwrap();
        quotations.delete_quotation(id).await.unwrap();

        let result = quotations.get_quotation(id).await;
        assert!(matches!(result, Err(DomainError::QuotationNotFound)));

        let again = quotations.delete_quotation(id).await;
        assert!(matches!(again, Err(DomainError::QuotationNotFound)));
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
            gender: Some("female".to_string()),
            role: Some("admin".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (_, employees) = setup_services().await;

        let profile = employees
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        assert_eq!(profile.email, "alice@example.com");

        let logged_in = employees.login("alice@example.com", "secret").await.unwrap();
        assert_eq!(logged_in.id, profile.id);
        assert_eq!(logged_in.role.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_email() {
        let (_, employees) = setup_services().await;

        let result = employees.register(register_request("not-an-email")).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let (_, employees) = setup_services().await;

        employees.register(register_request("alice@example.com")).await.unwrap();
        let duplicate = employees.register(register_request("alice@example.com")).await;
        assert!(matches!(duplicate, Err(DomainError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_email_exists_tracks_registration() {
        let (_, employees) = setup_services().await;

        assert!(!employees.email_exists("alice@example.com").await.unwrap());

        employees.register(register_request("alice@example.com")).await.unwrap();

        assert!(employees.email_exists("alice@example.com").await.unwrap());
        assert!(!employees.email_exists("bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email() {
        let (_, employees) = setup_services().await;

        employees.register(register_request("alice@example.com")).await.unwrap();

        let wrong = employees.login("alice@example.com", "nope").await;
        assert!(matches!(wrong, Err(DomainError::InvalidCredentials)));

        let unknown = employees.login("bob@example.com", "secret").await;
        assert!(matches!(unknown, Err(DomainError::InvalidCredentials)));
    }

    #[test]
    fn test_email_shape_check() {
        assert!(looks_like_email("a@example.com"));
        assert!(!looks_like_email("a@nodot"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("plain"));
    }
}
