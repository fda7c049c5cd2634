//! Push-payment callback payloads.
//!
//! The gateway posts `{ Body: { stkCallback: { ... } } }`. Only the fields
//! needed for reconciliation are captured; unknown fields are ignored.
//! Metadata items arrive as an unordered name/value list and are always
//! searched by name.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::domain::billing::PaymentReceipt;
use crate::domain::foundation::ValidationError;

/// Offset of the gateway's local time (East Africa Time, UTC+3).
pub const GATEWAY_UTC_OFFSET_SECS: i32 = 3 * 3600;

/// Result code the gateway uses for a completed payment.
pub const RESULT_CODE_SUCCESS: i64 = 0;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Body")]
    body: EnvelopeBody,
}

#[derive(Debug, Deserialize)]
struct EnvelopeBody {
    #[serde(rename = "stkCallback")]
    stk_callback: StkCallback,
}

/// The `stkCallback` object of a callback.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,

    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,

    #[serde(rename = "ResultCode", deserialize_with = "lenient_code")]
    pub result_code: i64,

    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,

    #[serde(rename = "CallbackMetadata", default, skip_serializing_if = "Option::is_none")]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<CallbackItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CallbackItem {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

/// Settled payment details extracted from a successful callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessfulPayment {
    pub receipt_number: String,
    pub transaction_date: Option<DateTime<Utc>>,
    pub amount: Option<Decimal>,
    pub phone: Option<String>,
}

impl SuccessfulPayment {
    /// Receipt to apply; falls back to `received_at` when the callback
    /// carries no transaction date.
    pub fn receipt(&self, received_at: DateTime<Utc>) -> PaymentReceipt {
        PaymentReceipt {
            receipt_number: self.receipt_number.clone(),
            paid_at: self.transaction_date.unwrap_or(received_at),
        }
    }
}

/// What a callback says happened to the push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Succeeded(SuccessfulPayment),
    Failed { result_code: i64, result_desc: String },
    /// Result code zero but no receipt number in the metadata.
    MissingReceipt,
}

impl StkCallback {
    /// Extracts the callback from a full webhook body.
    pub fn parse(body: &Value) -> Result<Self, ValidationError> {
        let envelope: Envelope = serde_json::from_value(body.clone())
            .map_err(|e| ValidationError::invalid_format("Body.stkCallback", e.to_string()))?;
        let callback = envelope.body.stk_callback;
        if callback.checkout_request_id.trim().is_empty() {
            return Err(ValidationError::empty_field("CheckoutRequestID"));
        }
        Ok(callback)
    }

    pub fn is_success(&self) -> bool {
        self.result_code == RESULT_CODE_SUCCESS
    }

    /// Looks up a metadata item by name.
    pub fn item(&self, name: &str) -> Option<&Value> {
        self.callback_metadata
            .as_ref()?
            .items
            .iter()
            .find(|item| item.name == name)
            .and_then(|item| item.value.as_ref())
    }

    fn item_text(&self, name: &str) -> Option<String> {
        match self.item(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn outcome(&self) -> CallbackOutcome {
        if !self.is_success() {
            return CallbackOutcome::Failed {
                result_code: self.result_code,
                result_desc: self.result_desc.clone(),
            };
        }

        let Some(receipt_number) = self.item_text("MpesaReceiptNumber") else {
            return CallbackOutcome::MissingReceipt;
        };

        CallbackOutcome::Succeeded(SuccessfulPayment {
            receipt_number,
            transaction_date: self
                .item_text("TransactionDate")
                .and_then(|raw| parse_gateway_timestamp(&raw)),
            amount: self
                .item_text("Amount")
                .and_then(|raw| Decimal::from_str(&raw).ok()),
            phone: self.item_text("PhoneNumber"),
        })
    }
}

/// Parses a gateway `YYYYMMDDHHmmss` timestamp (East Africa Time) to UTC.
pub fn parse_gateway_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y%m%d%H%M%S").ok()?;
    let offset = FixedOffset::east_opt(GATEWAY_UTC_OFFSET_SECS)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats a UTC instant as the gateway's `YYYYMMDDHHmmss` local timestamp.
pub fn format_gateway_timestamp(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(GATEWAY_UTC_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset).format("%Y%m%d%H%M%S").to_string(),
        None => at.format("%Y%m%d%H%M%S").to_string(),
    }
}

fn lenient_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("ResultCode is not an integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom("ResultCode is not an integer")),
        _ => Err(serde::de::Error::custom("ResultCode must be a number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn success_body() -> Value {
        json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            { "Name": "Amount", "Value": 500.00 },
                            { "Name": "TransactionDate", "Value": 20240101093000u64 },
                            { "Name": "Balance" },
                            { "Name": "MpesaReceiptNumber", "Value": "QAX123" },
                            { "Name": "PhoneNumber", "Value": 254712345678u64 }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn parses_successful_callback_searching_items_by_name() {
        let cb = StkCallback::parse(&success_body()).unwrap();
        assert_eq!(cb.checkout_request_id, "ws_CO_191220191020363925");
        match cb.outcome() {
            CallbackOutcome::Succeeded(payment) => {
                assert_eq!(payment.receipt_number, "QAX123");
                assert_eq!(payment.phone.as_deref(), Some("254712345678"));
                assert_eq!(payment.amount, Some(Decimal::from(500)));
                assert_eq!(
                    payment.transaction_date,
                    Some(Utc.with_ymd_and_hms(2024, 1, 1, 6, 30, 0).unwrap())
                );
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn failed_callback_has_no_receipt() {
        let body = json!({
            "Body": { "stkCallback": {
                "MerchantRequestID": "m",
                "CheckoutRequestID": "c",
                "ResultCode": 1032,
                "ResultDesc": "Request cancelled by user"
            }}
        });
        let cb = StkCallback::parse(&body).unwrap();
        assert_eq!(
            cb.outcome(),
            CallbackOutcome::Failed {
                result_code: 1032,
                result_desc: "Request cancelled by user".to_string()
            }
        );
    }

    #[test]
    fn success_without_receipt_is_reported() {
        let body = json!({
            "Body": { "stkCallback": {
                "CheckoutRequestID": "c",
                "ResultCode": 0,
                "CallbackMetadata": { "Item": [{ "Name": "Amount", "Value": 1 }] }
            }}
        });
        let cb = StkCallback::parse(&body).unwrap();
        assert_eq!(cb.outcome(), CallbackOutcome::MissingReceipt);
    }

    #[test]
    fn success_without_metadata_is_missing_receipt() {
        let body = json!({ "Body": { "stkCallback": { "CheckoutRequestID": "c", "ResultCode": 0 } } });
        assert_eq!(StkCallback::parse(&body).unwrap().outcome(), CallbackOutcome::MissingReceipt);
    }

    #[test]
    fn string_result_code_is_accepted() {
        let body = json!({ "Body": { "stkCallback": { "CheckoutRequestID": "c", "ResultCode": "1" } } });
        assert_eq!(StkCallback::parse(&body).unwrap().result_code, 1);
    }

    #[test]
    fn missing_envelope_is_rejected() {
        for body in [
            json!({}),
            json!({ "Body": {} }),
            json!({ "Body": { "stkCallback": { "ResultCode": 0 } } }),
            json!({ "Body": { "stkCallback": { "CheckoutRequestID": "", "ResultCode": 0 } } }),
            json!([1, 2, 3]),
        ] {
            assert!(StkCallback::parse(&body).is_err(), "{} should be rejected", body);
        }
    }

    #[test]
    fn gateway_timestamp_round_trip_is_eat() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 21, 15, 5).unwrap();
        let formatted = format_gateway_timestamp(at);
        assert_eq!(formatted, "20240102001505");
        assert_eq!(parse_gateway_timestamp(&formatted), Some(at));
    }

    #[test]
    fn receipt_falls_back_to_received_time() {
        let payment = SuccessfulPayment {
            receipt_number: "R".to_string(),
            transaction_date: None,
            amount: None,
            phone: None,
        };
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(payment.receipt(now).paid_at, now);
    }
}
