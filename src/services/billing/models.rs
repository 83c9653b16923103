//! Billing entities and their validation rules.

use serde::{Deserialize, Serialize};

use crate::services::Validate;

pub const INVOICES: &str = "Invoice";
pub const CUSTOMERS: &str = "Customer";
pub const VENDORS: &str = "Vendor";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Invoice {
    pub id: String,
    pub customer_id: String,
    pub vendor_id: String,
    pub bike_id: String,
    pub reservation_id: String,
    pub amount: f32,
}

impl Validate for Invoice {
    fn violations(&self) -> Vec<&'static str> {
        let mut violations = Vec::new();
        if !self.id.is_empty() {
            violations.push("Must not specify ID string");
        }
        if self.bike_id.is_empty() {
            violations.push("Must specify BikeID string");
        }
        if self.customer_id.is_empty() {
            violations.push("Must specify CustomerID string");
        }
        if self.reservation_id.is_empty() {
            violations.push("Must specify ReservationID string");
        }
        if self.vendor_id.is_empty() {
            violations.push("Must specify VendorID string");
        }
        violations
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    pub id: String,
    pub user_id: String,
    pub cc_number: String,
    pub cc_expiry: String,
    #[serde(rename = "ccCCV")]
    pub cc_ccv: String,
}

impl Validate for Customer {
    fn violations(&self) -> Vec<&'static str> {
        let mut violations = Vec::new();
        if !self.id.is_empty() {
            violations.push("Must not specify ID string");
        }
        if self.user_id.is_empty() {
            violations.push("Must specify UserID string");
        }
        if self.cc_number.is_empty() {
            violations.push("Must specify CCNumber string");
        }
        if self.cc_expiry.is_empty() {
            violations.push("Must specify CCExpiry string");
        }
        if self.cc_ccv.is_empty() {
            violations.push("Must specify CCCCV string");
        }
        violations
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vendor {
    pub id: String,
    pub user_id: String,
    pub routing_number: String,
    pub account_number: String,
}

impl Validate for Vendor {
    fn violations(&self) -> Vec<&'static str> {
        let mut violations = Vec::new();
        if self.user_id.is_empty() {
            violations.push("Must specify UserID string");
        }
        if self.account_number.is_empty() {
            violations.push("Must specify AccountNumber string");
        }
        if self.routing_number.is_empty() {
            violations.push("Must specify RoutingNumber string");
        }
        violations
    }
}

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_requires_references_and_no_id() {
        let invoice = Invoice {
            id: "preset".into(),
            ..Invoice::default()
        };
        assert_eq!(
            invoice.violations(),
            vec![
                "Must not specify ID string",
                "Must specify BikeID string",
                "Must specify CustomerID string",
                "Must specify ReservationID string",
                "Must specify VendorID string",
            ]
        );
    }

    #[test]
    fn customer_wire_names() {
        let customer: Customer = serde_json::from_str(
            r#"{"userId":"u1","ccNumber":"4111","ccExpiry":"12/30","ccCCV":"123"}"#,
        )
        .unwrap();
        assert!(customer.violations().is_empty());
        assert_eq!(customer.cc_ccv, "123");
    }

    #[test]
    fn vendor_may_carry_an_id() {
        let vendor = Vendor {
            id: "abc".into(),
            user_id: "u1".into(),
            routing_number: "r".into(),
            account_number: "a".into(),
        };
        assert!(vendor.violations().is_empty());
    }
}
