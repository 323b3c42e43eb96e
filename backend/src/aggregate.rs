//! Folding of flat quotation/payment join rows into nested aggregates, and
//! the inverse decomposition of a submitted quotation into relational rows.
//!
//! Both directions are pure single-pass transformations over their own input.
//! Each call allocates a fresh result, so the functions are reentrant and
//! safe to invoke concurrently without coordination.

use shared::{Installment, QuotationAggregate, QuotationPayload};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use thiserror::Error;

/// One row of the outer join of `quotation` to `payments`.
///
/// Quotation scalars repeat on every row for the same id; the installment
/// columns are NULL when the quotation has no payments.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub quotation_id: i64,
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
    pub label: Option<String>,
    pub due_when: Option<String>,
    pub installment_amount: Option<f64>,
}

/// A quotation's scalar columns, ready for INSERT or UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationRow {
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
}

impl QuotationRow {
    /// Lift a payload's scalar fields into a storable row. No validation;
    /// absent fields stay NULL all the way into the database.
    pub fn from_payload(payload: &QuotationPayload) -> Self {
        Self {
            name: payload.name.clone(),
            email: payload.email.clone(),
            gender: payload.gender.clone(),
            date: payload.date.clone(),
            designation: payload.designation.clone(),
            domain: payload.domain.clone(),
            entitle: payload.entitle.clone(),
            description: payload.description.clone(),
            price: payload.price,
            quantity: payload.quantity,
            total: payload.total,
            discount: payload.discount,
            grand_total: payload.grand_total,
            input_count: payload.input_count,
        }
    }
}

/// One payment row tagged with its owning quotation.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentRow {
    pub quotation_id: i64,
    pub label: String,
    pub due_when: Option<String>,
    pub installment_amount: Option<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    /// The row sequence for a requested quotation id was empty.
    #[error("quotation not found")]
    NotFound,
}

/// Fold joined rows into one aggregate per distinct quotation id.
///
/// The first row seen for an id initializes the aggregate from that row's
/// quotation scalars; rows whose installment label is non-NULL each append
/// one installment and bump the counter. Rows with a NULL label contribute
/// to aggregate creation only (a quotation with zero payments).
///
/// The result preserves first-seen id order, and each aggregate's
/// installment list preserves row order. Every input row is consumed
/// exactly once.
pub fn fold(rows: impl IntoIterator<Item = JoinedRow>) -> Vec<QuotationAggregate> {
    let mut order: Vec<i64> = Vec::new();
    let mut by_id: HashMap<i64, QuotationAggregate> = HashMap::new();

    for row in rows {
        let aggregate = match by_id.entry(row.quotation_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                order.push(row.quotation_id);
                entry.insert(aggregate_from_row(&row))
            }
        };
        if let Some(label) = row.label {
            aggregate.installments.push(Installment {
                label,
                due_when: row.due_when,
                installment_amount: row.installment_amount,
            });
            aggregate.total_installment += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect()
}

/// Fold rows already filtered to a single quotation id.
///
/// Fails with [`AggregateError::NotFound`] when the sequence is empty;
/// otherwise behaves exactly like [`fold`] restricted to that id.
pub fn fold_single(
    rows: impl IntoIterator<Item = JoinedRow>,
) -> Result<QuotationAggregate, AggregateError> {
    fold(rows).into_iter().next().ok_or(AggregateError::NotFound)
}

/// Decompose a submitted quotation into one quotation row and one
/// installment row per payload installment, each tagged with
/// `quotation_id`.
///
/// The caller supplies the owning id: the path id on update, or the id
/// generated by the quotation insert on create. Output length always equals
/// the payload's installment count; repeats are preserved as repeats.
pub fn decompose(
    payload: &QuotationPayload,
    quotation_id: i64,
) -> (QuotationRow, Vec<InstallmentRow>) {
    let row = QuotationRow::from_payload(payload);
    let installments = payload
        .installments
        .iter()
        .map(|i| InstallmentRow {
            quotation_id,
            label: i.label.clone(),
            due_when: i.due_when.clone(),
            installment_amount: i.installment_amount,
        })
        .collect();
    (row, installments)
}

fn aggregate_from_row(row: &JoinedRow) -> QuotationAggregate {
    QuotationAggregate {
        id: row.quotation_id,
        name: row.name.clone(),
        email: row.email.clone(),
        gender: row.gender.clone(),
        date: row.date.clone(),
        designation: row.designation.clone(),
        domain: row.domain.clone(),
        entitle: row.entitle.clone(),
        description: row.description.clone(),
        total_installment: 0,
        price: row.price,
        quantity: row.quantity,
        total: row.total,
        discount: row.discount,
        grand_total: row.grand_total,
        input_count: row.input_count,
        installments: Vec::new(),
    }
}
