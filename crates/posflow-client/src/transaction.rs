//! # Transaction Orchestrator
//!
//! Sequences checkout and shift clock calls against the backend.
//!
//! ## Sale State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   begin_sale()          apply_optimistic(hook)          submit()        │
//! │       │                        │                           │            │
//! │       ▼                        ▼                           ▼            │
//! │   ┌─────────┐   hook runs   ┌────────────────────┐    ┌──────────┐      │
//! │   │ Pending │ ────────────► │ OptimisticApplied  │ ─► │ InFlight │      │
//! │   └────┬────┘    once       └────────────────────┘    └────┬─────┘      │
//! │        │                                                   │            │
//! │        └──────────── submit() without a hook ─────────────►│            │
//! │                                                            │            │
//! │                           ┌────────────────────────────────┤            │
//! │                           ▼                                ▼            │
//! │                     ┌───────────┐                    ┌──────────┐       │
//! │                     │ Succeeded │                    │  Failed  │       │
//! │                     │ SaleResult│                    │SaleFailure       │
//! │                     └───────────┘                    │needs_rollback    │
//! │                                                      └──────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - The optimistic hook runs strictly before the network call.
//! - Exactly one `POST /api/v2/sales/complete` per [`SaleTransaction`];
//!   `submit` consumes the transaction so it cannot be retried implicitly.
//! - `needs_rollback` is true iff the hook ran. Restoring the cart is the
//!   caller's job.
//! - Shift calls have no optimistic phase. `clock_out` validates the shift id
//!   locally and fails without touching the network when it is missing.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use posflow_core::types::{deserialize_opt_id, deserialize_opt_timestamp};
use posflow_core::validation::validate_shift_id;
use posflow_core::{
    ClockInResult, ClockOutResult, LowStockWarning, Money, MonitorStats, Product, SaleRequest,
    SaleResult, Shift, StockDeduction, SALE_GRADES, SHIFT_GRADES,
};

use crate::api::{endpoints, RequestOptions};
use crate::error::{ClientError, ClientResult};
use crate::PosClient;

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

// =============================================================================
// Sale Transaction
// =============================================================================

/// Where a sale is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Pending,
    OptimisticApplied,
    InFlight,
    Succeeded,
    Failed,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionState::Pending => "PENDING",
            TransactionState::OptimisticApplied => "OPTIMISTIC_APPLIED",
            TransactionState::InFlight => "IN_FLIGHT",
            TransactionState::Succeeded => "SUCCEEDED",
            TransactionState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// A failed sale with the timing and rollback metadata the UI needs.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SaleFailure {
    #[source]
    pub error: ClientError,
    /// Time from `begin_sale` to the failure, in milliseconds.
    pub elapsed_ms: f64,
    /// The optimistic hook ran; the caller must restore the cart.
    pub needs_rollback: bool,
}

/// One checkout attempt. Created by [`PosClient::begin_sale`].
pub struct SaleTransaction<'a> {
    client: &'a PosClient,
    id: Uuid,
    request: SaleRequest,
    state: TransactionState,
    started: Instant,
}

impl<'a> SaleTransaction<'a> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn request(&self) -> &SaleRequest {
        &self.request
    }

    /// Runs the caller's synchronous UI update (cart cleared, spinner on).
    ///
    /// The hook runs at most once; later calls are ignored.
    pub fn apply_optimistic<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&SaleRequest),
    {
        if self.state != TransactionState::Pending {
            debug!(txn_id = %self.id, state = %self.state, "Optimistic update already applied");
            return self;
        }

        hook(&self.request);
        self.state = TransactionState::OptimisticApplied;
        debug!(txn_id = %self.id, "Optimistic update applied");
        self
    }

    /// Issues the single atomic backend call.
    pub async fn submit(mut self) -> Result<SaleResult, SaleFailure> {
        let needs_rollback = self.state == TransactionState::OptimisticApplied;
        self.state = TransactionState::InFlight;

        let span = info_span!(
            "complete_sale",
            txn_id = %self.id,
            items = self.request.items.len(),
            total = %self.request.total,
        );

        let outcome = self.send().instrument(span.clone()).await;
        let elapsed = elapsed_ms(self.started);
        let _enter = span.enter();

        match outcome {
            Ok(response) => {
                self.state = TransactionState::Succeeded;
                self.client.product_cache().invalidate();

                let grade = SALE_GRADES.classify(elapsed);
                info!(
                    sale_id = %response.sale_id,
                    elapsed_ms = elapsed,
                    grade = %grade,
                    low_stock = response.low_stock_warnings.len(),
                    "Sale completed"
                );
                for warning in &response.low_stock_warnings {
                    warn!(product_id = %warning.product_id, remaining = warning.remaining, "Low stock");
                }

                Ok(SaleResult {
                    success: true,
                    sale_id: response.sale_id,
                    updated_products: response.updated_products,
                    stock_deductions: response.stock_deductions,
                    low_stock_warnings: response.low_stock_warnings,
                    client_elapsed_ms: elapsed,
                    performance_grade: grade,
                })
            }
            Err(error) => {
                self.state = TransactionState::Failed;
                error!(elapsed_ms = elapsed, needs_rollback, error = %error, "Sale failed");
                Err(SaleFailure {
                    error,
                    elapsed_ms: elapsed,
                    needs_rollback,
                })
            }
        }
    }

    async fn send(&self) -> ClientResult<CompletedSale> {
        let raw: SaleResponse = self
            .client
            .api()
            .request(
                endpoints::SALES_COMPLETE,
                RequestOptions::post_json(&self.request)?,
            )
            .await?;
        raw.into_completed()
    }
}

// =============================================================================
// Backend Response Envelopes
// =============================================================================

/// Decodes the entries of an auxiliary array one by one. Entries that do
/// not match `T` are skipped with a warning; a non-array is treated as empty.
fn lenient_list<T: DeserializeOwned>(field: &'static str, value: Value) -> Vec<T> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Null => return Vec::new(),
        other => {
            warn!(field, kind = json_kind(&other), "Expected an array, ignoring");
            return Vec::new();
        }
    };

    let total = entries.len();
    let parsed: Vec<T> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(field, index, error = %e, "Skipping unreadable entry");
                None
            }
        })
        .collect();
    if parsed.len() < total {
        debug!(field, kept = parsed.len(), total, "Partially decoded");
    }
    parsed
}

/// Decodes an optional nested object, warning and dropping it on mismatch.
fn lenient_item<T: DeserializeOwned>(field: &'static str, value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value)
        .map_err(|e| warn!(field, error = %e, "Ignoring unreadable object"))
        .ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Backend error text, whether sent as a string or as `{ "message": ... }`.
fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

/// Only `success` and `saleId` decide the outcome. The arrays are decoded
/// afterwards and never fail a sale the backend already committed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleResponse {
    #[serde(default)]
    success: Value,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    sale_id: Option<String>,
    #[serde(default)]
    updated_products: Value,
    #[serde(default)]
    stock_deductions: Value,
    #[serde(default)]
    low_stock_warnings: Value,
    #[serde(default)]
    error: Value,
}

struct CompletedSale {
    sale_id: String,
    updated_products: Vec<Product>,
    stock_deductions: Vec<StockDeduction>,
    low_stock_warnings: Vec<LowStockWarning>,
}

impl SaleResponse {
    fn into_completed(self) -> ClientResult<CompletedSale> {
        let succeeded = self.success.as_bool() == Some(true);
        match self.sale_id {
            Some(sale_id) if succeeded && !sale_id.is_empty() => Ok(CompletedSale {
                sale_id,
                updated_products: lenient_list("updatedProducts", self.updated_products),
                stock_deductions: lenient_list("stockDeductions", self.stock_deductions),
                low_stock_warnings: lenient_list("lowStockWarnings", self.low_stock_warnings),
            }),
            _ => Err(ClientError::MalformedResponse(
                error_text(&self.error)
                    .unwrap_or_else(|| "sale response missing saleId".to_string()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClockInResponse {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    shift_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    clock_in_time: Option<DateTime<Utc>>,
    #[serde(default)]
    shift: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClockOutResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    total_sales: Money,
    #[serde(default)]
    total_expenses: Money,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentShiftResponse {
    #[serde(default)]
    shift: Option<Shift>,
}

// =============================================================================
// Orchestrator Operations
// =============================================================================

impl PosClient {
    /// Starts a checkout. Nothing is sent until [`SaleTransaction::submit`].
    pub fn begin_sale(&self, request: SaleRequest) -> SaleTransaction<'_> {
        let id = Uuid::new_v4();
        debug!(txn_id = %id, items = request.items.len(), "Sale started");
        SaleTransaction {
            client: self,
            id,
            request,
            state: TransactionState::Pending,
            started: Instant::now(),
        }
    }

    /// Optimistic hook, one backend call, result or failure.
    pub async fn complete_sale<F>(
        &self,
        request: SaleRequest,
        optimistic: F,
    ) -> Result<SaleResult, SaleFailure>
    where
        F: FnOnce(&SaleRequest),
    {
        self.begin_sale(request).apply_optimistic(optimistic).submit().await
    }

    /// Opens a shift for the signed-in cashier.
    pub async fn clock_in(&self) -> ClientResult<ClockInResult> {
        let span = info_span!("clock_in", txn_id = %Uuid::new_v4());
        let started = Instant::now();

        let outcome = async {
            let raw: ClockInResponse = self
                .api()
                .request(endpoints::CLOCK_IN, RequestOptions::post())
                .await?;
            let shift: Option<Shift> = lenient_item("shift", raw.shift);

            let shift_id = raw
                .shift_id
                .or_else(|| shift.as_ref().map(|s| s.id.clone()))
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    ClientError::MalformedResponse("clock-in response missing shiftId".into())
                })?;
            let clock_in_time = raw
                .clock_in_time
                .or_else(|| shift.as_ref().and_then(|s| s.clock_in_time))
                .unwrap_or_else(|| {
                    warn!(shift_id = %shift_id, "Clock-in time missing or unreadable, using local clock");
                    Utc::now()
                });

            Ok::<_, ClientError>((shift_id, clock_in_time))
        }
        .instrument(span.clone())
        .await;

        let elapsed = elapsed_ms(started);
        let _enter = span.enter();

        match outcome {
            Ok((shift_id, clock_in_time)) => {
                let grade = SHIFT_GRADES.classify(elapsed);
                info!(shift_id = %shift_id, elapsed_ms = elapsed, grade = %grade, "Clocked in");
                Ok(ClockInResult {
                    shift_id,
                    clock_in_time,
                    elapsed_ms: elapsed,
                    performance_grade: grade,
                })
            }
            Err(e) => {
                error!(elapsed_ms = elapsed, error = %e, "Clock-in failed");
                Err(e)
            }
        }
    }

    /// Closes the shift and returns its totals.
    ///
    /// A missing or blank `shift_id` fails with "Shift ID is required"
    /// before any request is made.
    pub async fn clock_out(&self, shift_id: Option<&str>) -> ClientResult<ClockOutResult> {
        let span = info_span!("clock_out", txn_id = %Uuid::new_v4());
        let started = Instant::now();

        let shift_id = match validate_shift_id(shift_id) {
            Ok(id) => id.to_string(),
            Err(e) => {
                let _enter = span.enter();
                error!(error = %e, "Clock-out rejected");
                return Err(e.into());
            }
        };

        let outcome = async {
            let raw: ClockOutResponse = self
                .api()
                .request(
                    endpoints::CLOCK_OUT,
                    RequestOptions::post_json(&json!({ "shiftId": shift_id }))?,
                )
                .await?;

            if raw.success == Some(false) || raw.error.is_some() {
                return Err(ClientError::MalformedResponse(
                    raw.error
                        .unwrap_or_else(|| "clock-out was not acknowledged".to_string()),
                ));
            }
            Ok::<_, ClientError>((raw.total_sales, raw.total_expenses))
        }
        .instrument(span.clone())
        .await;

        let elapsed = elapsed_ms(started);
        let _enter = span.enter();

        match outcome {
            Ok((total_sales, total_expenses)) => {
                let grade = SHIFT_GRADES.classify(elapsed);
                info!(
                    shift_id = %shift_id,
                    total_sales = %total_sales,
                    total_expenses = %total_expenses,
                    elapsed_ms = elapsed,
                    grade = %grade,
                    "Clocked out"
                );
                Ok(ClockOutResult {
                    success: true,
                    total_sales,
                    total_expenses,
                    elapsed_ms: elapsed,
                    performance_grade: grade,
                })
            }
            Err(e) => {
                error!(shift_id = %shift_id, elapsed_ms = elapsed, error = %e, "Clock-out failed");
                Err(e)
            }
        }
    }

    /// The open shift, if the backend has one for this cashier.
    pub async fn current_shift(&self) -> ClientResult<Option<Shift>> {
        let raw: CurrentShiftResponse = self
            .api()
            .get(endpoints::CURRENT_SHIFT)
            .instrument(info_span!("current_shift", txn_id = %Uuid::new_v4()))
            .await?;
        if let Some(shift) = raw.shift.as_ref().filter(|s| s.clock_in_time.is_none()) {
            warn!(shift_id = %shift.id, "Open shift has no readable clock-in time");
        }
        Ok(raw.shift)
    }

    /// Business-wide totals for the monitor view.
    pub async fn monitor_stats(&self) -> ClientResult<MonitorStats> {
        self.api()
            .get(endpoints::MONITOR_STATS)
            .instrument(info_span!("monitor_stats", txn_id = %Uuid::new_v4()))
            .await
    }
}
