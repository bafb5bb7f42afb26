//! # Domain Types
//!
//! Wire types exchanged with the backend REST API.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Wire Types                                      │
//! │                                                                         │
//! │  REQUEST SIDE                         RESPONSE SIDE                     │
//! │  ┌─────────────────┐                  ┌─────────────────────┐           │
//! │  │  SaleRequest    │ ── POST ──────►  │  SaleResult         │           │
//! │  │  items[]        │  /sales/complete │  saleId             │           │
//! │  │  total, tax     │                  │  updatedProducts[]  │           │
//! │  │  discount       │                  │  stockDeductions[]  │           │
//! │  │  taxType        │                  │  lowStockWarnings[] │           │
//! │  │  paymentMethod  │                  │  clientElapsedMs    │           │
//! │  │  shiftId?       │                  │  performanceGrade   │           │
//! │  └─────────────────┘                  └─────────────────────┘           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐         │
//! │  │    Product      │  │     Shift       │  │  MonitorStats   │         │
//! │  │  id, name       │  │  id             │  │  totalSales     │         │
//! │  │  price          │  │  clockInTime    │  │  totalExpenses  │         │
//! │  │  quantity       │  │  totalSales     │  │  netProfit      │         │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - camelCase on the wire, snake_case in Rust
//! - Ids are normalized to `String`; the backend sends integers for some
//!   verticals and strings for others
//! - Money fields are decimal numbers on the wire (see [`crate::money`])

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::performance::PerformanceGrade;

// =============================================================================
// Id Normalization
// =============================================================================

/// Backend ids arrive as JSON strings or integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

/// Deserializes an id sent as a JSON string or integer into a `String`.
pub fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

/// Optional variant of [`deserialize_id`]; pair with `#[serde(default)]`.
pub fn deserialize_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

// =============================================================================
// Timestamp Normalization
// =============================================================================

/// Naive formats some backends emit instead of RFC 3339; read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Epoch values at or above this are milliseconds, below it seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Parses an RFC 3339 timestamp, or a naive `YYYY-MM-DD HH:MM:SS` one as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn timestamp_from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.abs() >= EPOCH_MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Int(i64),
    Float(f64),
    Other(serde::de::IgnoredAny),
}

/// Reads a timestamp leniently: RFC 3339, naive SQL-style text or epoch
/// seconds/milliseconds. Anything unreadable becomes `None` instead of an
/// error; pair with `#[serde(default)]`.
pub fn deserialize_opt_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTimestamp::Text(text)) => parse_timestamp(&text),
        Some(RawTimestamp::Int(n)) => timestamp_from_epoch(n),
        Some(RawTimestamp::Float(f)) if f.is_finite() && f.abs() < i64::MAX as f64 => {
            timestamp_from_epoch(f as i64)
        }
        _ => None,
    })
}

// =============================================================================
// Tax Type
// =============================================================================

/// Whether the item prices already include tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    /// Prices include tax (tax is a portion of the subtotal).
    Inclusive,
    /// Tax is added on top of the subtotal.
    #[default]
    Exclusive,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
///
/// The common methods are named; verticals add their own (insurance at the
/// hospital, fuel cards at the petrol station) and those travel as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
    Credit,
    Other(String),
}

impl From<String> for PaymentMethod {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "card" | "credit_card" | "debit_card" => PaymentMethod::Card,
            "mobile_money" | "mobile" | "mpesa" => PaymentMethod::MobileMoney,
            "credit" => PaymentMethod::Credit,
            _ => PaymentMethod::Other(s),
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => "cash".to_string(),
            PaymentMethod::Card => "card".to_string(),
            PaymentMethod::MobileMoney => "mobile_money".to_string(),
            PaymentMethod::Credit => "credit".to_string(),
            PaymentMethod::Other(s) => s,
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Sale Item / Sale Request
// =============================================================================

/// A cart line as submitted to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub product_id: String,
    pub name: String,
    /// Unit price at the time the item was added to the cart.
    #[ts(type = "number")]
    pub price: Money,
    pub quantity: i64,
}

impl SaleItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        quantity: i64,
    ) -> Self {
        SaleItem {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

/// Everything the backend needs to complete a sale atomically.
///
/// ## Invariant
/// `total` should equal `Σ(price × quantity) + tax amount − discount` at the
/// moment of submission. The client does not re-check it; the backend is
/// authoritative. Use [`SaleRequest::from_cart`] to build a consistent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub items: Vec<SaleItem>,
    #[ts(type = "number")]
    pub total: Money,
    #[ts(type = "number")]
    pub discount: Money,
    /// Tax rate in percent (10.0 = 10%).
    pub tax: f64,
    pub tax_type: TaxType,
    #[ts(type = "string")]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<String>,
}

// =============================================================================
// Product & Stock
// =============================================================================

/// A catalog entry as returned by `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[ts(type = "number")]
    pub price: Money,
    /// Units on hand.
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

/// Stock removed from one product by a completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockDeduction {
    #[serde(alias = "productId", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(alias = "quantity")]
    pub deducted: i64,
}

impl StockDeduction {
    pub fn new(id: impl Into<String>, deducted: i64) -> Self {
        StockDeduction {
            id: id.into(),
            deducted,
        }
    }
}

/// Backend notice that a product dropped under its reorder level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LowStockWarning {
    #[serde(alias = "id", deserialize_with = "deserialize_id")]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "quantity", default)]
    pub remaining: i64,
}

// =============================================================================
// Sale Result
// =============================================================================

/// A completed sale, enriched with client-side timing.
///
/// Only ever produced after the single atomic backend call returned a sale id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleResult {
    pub success: bool,
    pub sale_id: String,
    pub updated_products: Vec<Product>,
    pub stock_deductions: Vec<StockDeduction>,
    pub low_stock_warnings: Vec<LowStockWarning>,
    /// Wall-clock time from invocation to response, in milliseconds.
    pub client_elapsed_ms: f64,
    pub performance_grade: PerformanceGrade,
}

// =============================================================================
// Shifts
// =============================================================================

/// A cashier shift. Owned by the backend; the client only holds copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[serde(alias = "_id", alias = "shiftId", deserialize_with = "deserialize_id")]
    pub id: String,
    /// `None` when the backend omitted the time or sent one we cannot read.
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    #[ts(as = "Option<String>")]
    pub clock_in_time: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(type = "number")]
    pub total_sales: Money,
    #[serde(default)]
    #[ts(type = "number")]
    pub total_expenses: Money,
}

/// Outcome of a clock-in call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClockInResult {
    pub shift_id: String,
    #[ts(as = "String")]
    pub clock_in_time: DateTime<Utc>,
    pub elapsed_ms: f64,
    pub performance_grade: PerformanceGrade,
}

/// Outcome of a clock-out call: the closing totals of the shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClockOutResult {
    pub success: bool,
    #[ts(type = "number")]
    pub total_sales: Money,
    #[ts(type = "number")]
    pub total_expenses: Money,
    pub elapsed_ms: f64,
    pub performance_grade: PerformanceGrade,
}

// =============================================================================
// Statistics
// =============================================================================

/// Business-wide figures from `GET /api/v2/monitor/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorStats {
    #[ts(type = "number")]
    pub total_sales: Money,
    #[ts(type = "number")]
    pub total_expenses: Money,
    #[ts(type = "number")]
    pub net_profit: Money,
    pub transaction_count: i64,
}

/// Day-level figures kept in local storage for the POS headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyStats {
    #[ts(type = "number")]
    pub total_sales: Money,
    pub transaction_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

// =============================================================================
// Users
// =============================================================================

/// Dashboard role of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Cashier,
    Other(String),
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "cashier" => Role::Cashier,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "admin".to_string(),
            Role::Cashier => "cashier".to_string(),
            Role::Other(s) => s,
        }
    }
}

impl Role {
    /// Admins may see business-wide monitor stats.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Retail vertical the account is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Bar,
    Hospital,
    School,
    Kiosk,
    Petrol,
    #[serde(alias = "shoe-store", alias = "shoestore")]
    ShoeStore,
}

/// The signed-in user record persisted next to the bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[ts(type = "string")]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_type: Option<BusinessType>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_request_wire_shape() {
        let request = SaleRequest {
            items: vec![SaleItem::new("p-1", "Lager", Money::from_major(150), 2)],
            total: Money::from_major(310),
            discount: Money::from_major(20),
            tax: 10.0,
            tax_type: TaxType::Exclusive,
            payment_method: PaymentMethod::Cash,
            shift_id: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["total"], 310);
        assert_eq!(json["taxType"], "exclusive");
        assert_eq!(json["paymentMethod"], "cash");
        assert_eq!(json["items"][0]["productId"], "p-1");
        assert!(json.get("shiftId").is_none());
    }

    #[test]
    fn test_product_accepts_numeric_id_and_string_price() {
        let product: Product =
            serde_json::from_str(r#"{"id": 42, "name": "Sneaker", "price": "59.90", "quantity": 3, "color": "red"}"#)
                .unwrap();
        assert_eq!(product.id, "42");
        assert_eq!(product.price.minor(), 5990);
        assert_eq!(product.quantity, 3);
    }

    #[test]
    fn test_stock_deduction_aliases() {
        let d: StockDeduction = serde_json::from_str(r#"{"productId": 7, "quantity": 2}"#).unwrap();
        assert_eq!(d, StockDeduction::new("7", 2));

        let d: StockDeduction = serde_json::from_str(r#"{"id": "a", "deducted": 5}"#).unwrap();
        assert_eq!(d, StockDeduction::new("a", 5));
    }

    #[test]
    fn test_payment_method_strings() {
        let m: PaymentMethod = serde_json::from_str("\"mpesa\"").unwrap();
        assert_eq!(m, PaymentMethod::MobileMoney);

        let m: PaymentMethod = serde_json::from_str("\"insurance\"").unwrap();
        assert_eq!(m, PaymentMethod::Other("insurance".to_string()));
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"insurance\"");
    }

    #[test]
    fn test_user_record_with_role() {
        let user: User = serde_json::from_str(
            r#"{"_id": "u1", "name": "Amina", "role": "cashier", "businessType": "shoe_store"}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Cashier);
        assert!(!user.role.is_admin());
        assert_eq!(user.business_type, Some(BusinessType::ShoeStore));
    }

    #[test]
    fn test_shift_parses_backend_shape() {
        let shift: Shift = serde_json::from_str(
            r#"{"id": 9, "clockInTime": "2024-05-01T08:00:00Z", "totalSales": 1200.5}"#,
        )
        .unwrap();
        assert_eq!(shift.id, "9");
        assert_eq!(shift.total_sales.minor(), 120_050);
        assert_eq!(shift.total_expenses, Money::zero());
        assert_eq!(
            shift.clock_in_time.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-05-01T08:00:00+00:00")
        );
    }

    #[test]
    fn test_shift_clock_in_time_is_lenient() {
        let shift: Shift =
            serde_json::from_str(r#"{"id": 1, "clockInTime": "2024-05-01 08:00:00"}"#).unwrap();
        assert_eq!(
            shift.clock_in_time.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-05-01T08:00:00+00:00")
        );

        let shift: Shift = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(shift.clock_in_time, None);

        let shift: Shift =
            serde_json::from_str(r#"{"id": 1, "clockInTime": "yesterday-ish"}"#).unwrap();
        assert_eq!(shift.clock_in_time, None);

        let shift: Shift = serde_json::from_str(r#"{"id": 1, "clockInTime": null}"#).unwrap();
        assert_eq!(shift.clock_in_time, None);

        let shift: Shift =
            serde_json::from_str(r#"{"id": 1, "clockInTime": {"$date": 1}}"#).unwrap();
        assert_eq!(shift.clock_in_time, None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = "2024-05-01T08:00:00+00:00";
        for text in [
            "2024-05-01T08:00:00Z",
            "2024-05-01T11:00:00+03:00",
            "2024-05-01 08:00:00",
            "2024-05-01T08:00:00",
            " 2024-05-01 08:00:00.000 ",
        ] {
            assert_eq!(parse_timestamp(text).unwrap().to_rfc3339(), expected, "{}", text);
        }
        assert_eq!(parse_timestamp("2024-05-01"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_epoch_timestamps() {
        let from_millis: Shift =
            serde_json::from_str(r#"{"id": 1, "clockInTime": 1714550400000}"#).unwrap();
        let from_secs: Shift =
            serde_json::from_str(r#"{"id": 1, "clockInTime": 1714550400}"#).unwrap();
        assert_eq!(from_millis.clock_in_time, from_secs.clock_in_time);
        assert_eq!(
            from_secs.clock_in_time.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-05-01T08:00:00+00:00")
        );
    }
}
