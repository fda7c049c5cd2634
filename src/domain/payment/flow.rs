//! Push-payment flows and the gateway transaction types they map to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway transaction type carried in the push request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "CustomerPayBillOnline")]
    PayBill,
    #[serde(rename = "CustomerBuyGoodsOnline")]
    BuyGoods,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::PayBill => "CustomerPayBillOnline",
            TransactionType::BuyGoods => "CustomerBuyGoodsOnline",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which local record a push payment settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFlow {
    Invoice,
    Donation,
}

impl PaymentFlow {
    /// Invoices are paid to the pay bill number, donations to the till.
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            PaymentFlow::Invoice => TransactionType::PayBill,
            PaymentFlow::Donation => TransactionType::BuyGoods,
        }
    }

    /// Path segment of the webhook that receives this flow's callbacks.
    pub fn callback_path(&self) -> &'static str {
        match self {
            PaymentFlow::Invoice => "/api/webhooks/mpesa/invoices",
            PaymentFlow::Donation => "/api/webhooks/mpesa/donations",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFlow::Invoice => "invoice",
            PaymentFlow::Donation => "donation",
        }
    }
}

impl fmt::Display for PaymentFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
