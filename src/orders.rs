/* ===============================================================================
Bar stand ordering kiosk.
Orders wire model. 14 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

use crate::menu::euros;

// ============================================================================
// [Outbound]
// ============================================================================

// Submittable order payload, only positive quantities. The map is ordered so
// repeated conversions of the same cart serialize identically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
   #[serde(rename = "userId")]
   pub user_id: String,
   pub items: BTreeMap<String, u32>,
}

// The first kiosk page posted {size, quantity} instead of an item map.
// The old shape is translated here, at the boundary, and nowhere deeper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyOrderRequest {
   pub size: f64,
   pub quantity: u32,
   #[serde(rename = "userId")]
   pub user_id: String,
}

impl From<LegacyOrderRequest> for OrderRequest {
   fn from(legacy: LegacyOrderRequest) -> Self {
      // Size 0.5 becomes the synthetic item id "beer_0_5"
      let id = format!("beer_{}", legacy.size).replace('.', "_");

      let mut items = BTreeMap::new();
      if legacy.quantity > 0 {
         items.insert(id, legacy.quantity);
      }
      OrderRequest { user_id: legacy.user_id, items }
   }
}

// ============================================================================
// [Inbound]
// ============================================================================

// Server-owned lifecycle status, string-valued and extensible. Unknown
// values survive a round trip unchanged.
#[derive(Clone, Debug, PartialEq, Eq, EnumString, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
   Pending,
   InProgress,
   Completed,
   #[strum(default)]
   Other(String),
}

impl OrderStatus {
   // Everything short of completed stays in the staff queue
   pub fn is_active(&self) -> bool {
      !matches!(self, OrderStatus::Completed)
   }
}

impl From<String> for OrderStatus {
   fn from(s: String) -> Self {
      s.parse().unwrap_or(OrderStatus::Other(s))
   }
}

impl From<OrderStatus> for String {
   fn from(status: OrderStatus) -> Self {
      status.to_string()
   }
}

// One priced line of a server-reported order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
   #[serde(rename = "drinkId", default)]
   pub item_id: Option<String>,
   pub name: String,
   pub quantity: u32,
   #[serde(with = "euros")]
   pub price: u32,
}

impl OrderLine {
   pub fn cost(&self) -> u32 {
      self.quantity * self.price
   }
}

// Server-owned record of a submitted cart. We hold a read-only cached copy,
// the status is never authoritative on our side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
   pub id: String,
   #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
   pub user_id: Option<String>,
   #[serde(default)]
   pub timestamp: Option<NaiveDateTime>,
   #[serde(default)]
   pub items: Vec<OrderLine>,
   #[serde(rename = "totalPrice", with = "euros", default)]
   pub total_price: u32,
   pub status: OrderStatus,
}

// POST /order answers with a thinner shape than the order list does
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Created {
   pub id: String,
   #[serde(default)]
   pub status: Option<OrderStatus>,
   #[serde(default)]
   pub items: BTreeMap<String, u32>,
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn status_strings() {
      assert_eq!("in_progress".parse::<OrderStatus>().unwrap(), OrderStatus::InProgress);
      assert_eq!(OrderStatus::Completed.to_string(), "completed");

      // Unknown statuses are preserved, not rejected
      let status = OrderStatus::from(String::from("on_hold"));
      assert_eq!(status, OrderStatus::Other(String::from("on_hold")));
      assert_eq!(status.to_string(), "on_hold");
      assert!(status.is_active());
      assert!(!OrderStatus::Completed.is_active());
   }

   #[test]
   fn order_from_server_json() {
      let json = r#"{
         "id": "01H5",
         "userId": "u-1",
         "timestamp": "2024-02-14T18:30:05",
         "status": "pending",
         "items": [
            { "drinkId": "vodka", "name": "Vodka (0.02L)", "quantity": 2, "price": 2.30, "line_total": 4.60 }
         ],
         "totalPrice": 4.60
      }"#;

      let order: Order = serde_json::from_str(json).unwrap();
      assert_eq!(order.id, "01H5");
      assert_eq!(order.status, OrderStatus::Pending);
      assert_eq!(order.items[0].cost(), 460);
      assert_eq!(order.total_price, 460);
   }

   #[test]
   fn created_from_server_json() {
      let json = r#"{ "id": "01H6", "status": "pending", "items": { "chips": 1 } }"#;
      let created: Created = serde_json::from_str(json).unwrap();
      assert_eq!(created.id, "01H6");
      assert_eq!(created.items.get("chips"), Some(&1));
   }

   #[test]
   fn legacy_request_translates() {
      let legacy = LegacyOrderRequest { size: 0.5, quantity: 2, user_id: String::from("u-1") };
      let request = OrderRequest::from(legacy);
      assert_eq!(request.items.get("beer_0_5"), Some(&2));

      // Zero quantity translates to an empty request, the submit path rejects it
      let legacy = LegacyOrderRequest { size: 0.3, quantity: 0, user_id: String::from("u-1") };
      assert!(OrderRequest::from(legacy).items.is_empty());
   }

   #[test]
   fn request_wire_shape() {
      let mut items = BTreeMap::new();
      items.insert(String::from("wine"), 1);
      let request = OrderRequest { user_id: String::from("u-1"), items };

      let json = serde_json::to_value(&request).unwrap();
      assert_eq!(json, serde_json::json!({ "userId": "u-1", "items": { "wine": 1 } }));
   }
}
