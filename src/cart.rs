/* ===============================================================================
Bar stand ordering kiosk.
Cart model. 13 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::menu::MenuCatalog;
use crate::orders::OrderRequest;

// Pending, not yet submitted item quantities. Pure in-memory state, no I/O.
// A zero quantity equals absence, such lines are pruned right away.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
   lines: HashMap<String, u32>,
}

impl Cart {
   pub fn new() -> Self {
      Self::default()
   }

   // Zero additions are ignored, a stored line is always positive
   pub fn add_item(&mut self, item_id: &str, qty: u32) {
      if qty == 0 {
         return;
      }
      *self.lines.entry(item_id.to_string()).or_insert(0) += qty;
   }

   pub fn set_quantity(&mut self, item_id: &str, qty: u32) {
      if qty == 0 {
         self.lines.remove(item_id);
      } else {
         self.lines.insert(item_id.to_string(), qty);
      }
   }

   pub fn increment(&mut self, item_id: &str) {
      self.add_item(item_id, 1);
   }

   // Floor at zero, a decrement never goes negative
   pub fn decrement(&mut self, item_id: &str) {
      let qty = self.quantity(item_id).saturating_sub(1);
      self.set_quantity(item_id, qty);
   }

   pub fn clear(&mut self) {
      self.lines.clear();
   }

   pub fn quantity(&self, item_id: &str) -> u32 {
      self.lines.get(item_id).copied().unwrap_or_default()
   }

   pub fn total_items(&self) -> u32 {
      self.lines.values().sum()
   }

   pub fn is_empty(&self) -> bool {
      self.lines.is_empty()
   }

   // Lines sorted by item id for a stable display
   pub fn lines(&self) -> Vec<(&str, u32)> {
      let mut res: Vec<(&str, u32)> = self.lines.iter()
      .map(|(id, qty)| (id.as_str(), *qty))
      .collect();
      res.sort();
      res
   }

   // Priced against the catalog, an unknown item id is an error rather than
   // a silent zero
   pub fn total_price(&self, catalog: &MenuCatalog) -> Result<u32> {
      let mut total = 0u32;
      for (item_id, qty) in &self.lines {
         total += qty * catalog.unit_price(item_id)?;
      }
      Ok(total)
   }

   // Payload for submission, checked before any network call
   pub fn to_order_request(&self, user_id: &str) -> Result<OrderRequest> {
      let items: BTreeMap<String, u32> = self.lines.iter()
      .filter(|(_, qty)| **qty > 0)
      .map(|(id, qty)| (id.clone(), *qty))
      .collect();

      if items.is_empty() {
         return Err(Error::EmptyOrder);
      }
      Ok(OrderRequest { user_id: user_id.to_string(), items })
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::menu::{MenuCatalog, MenuItem};

   fn catalog() -> MenuCatalog {
      MenuCatalog::new(vec![
         MenuItem {
            id: String::from("vodka"),
            name: String::from("Vodka (0.02L)"),
            category: String::from("alcoholic"),
            price: 250,
            description: String::new(),
         },
         MenuItem {
            id: String::from("chips"),
            name: String::from("Chips"),
            category: String::from("snacks"),
            price: 320,
            description: String::new(),
         },
      ])
   }

   #[test]
   fn totals_follow_every_mutation() {
      let mut cart = Cart::new();
      cart.add_item("vodka", 2);
      cart.increment("chips");
      cart.increment("chips");
      cart.decrement("chips");
      assert_eq!(cart.total_items(), 3);
      assert_eq!(cart.quantity("vodka"), 2);
      assert_eq!(cart.quantity("chips"), 1);

      cart.set_quantity("vodka", 5);
      assert_eq!(cart.total_items(), 6);
   }

   #[test]
   fn decrement_floors_at_zero() {
      let mut cart = Cart::new();
      cart.decrement("vodka");
      cart.decrement("vodka");
      assert_eq!(cart.quantity("vodka"), 0);
      assert_eq!(cart.total_items(), 0);

      cart.add_item("vodka", 1);
      cart.decrement("vodka");
      cart.decrement("vodka");
      assert_eq!(cart.quantity("vodka"), 0);
      assert!(cart.is_empty());
   }

   #[test]
   fn zero_add_is_a_no_op() {
      let mut cart = Cart::new();
      cart.add_item("vodka", 0);
      assert!(cart.is_empty());
   }

   #[test]
   fn clear_resets_everything() {
      let mut cart = Cart::new();
      cart.add_item("vodka", 3);
      cart.add_item("chips", 1);
      cart.clear();
      assert_eq!(cart.total_items(), 0);
      assert!(cart.is_empty());
   }

   #[test]
   fn priced_against_the_catalog() {
      // 2 x 2.50 + 1 x 3.20 = 8.20
      let mut cart = Cart::new();
      cart.add_item("vodka", 2);
      cart.add_item("chips", 1);
      assert_eq!(cart.total_price(&catalog()), Ok(820));
   }

   #[test]
   fn unknown_item_fails_pricing() {
      let mut cart = Cart::new();
      cart.add_item("mead", 1);
      assert_eq!(cart.total_price(&catalog()), Err(Error::MissingItem(String::from("mead"))));
   }

   #[test]
   fn empty_cart_never_becomes_a_request() {
      let cart = Cart::new();
      assert_eq!(cart.to_order_request("u-1").unwrap_err(), Error::EmptyOrder);

      // All-zero is the same thing as empty
      let mut cart = Cart::new();
      cart.add_item("vodka", 1);
      cart.decrement("vodka");
      assert_eq!(cart.to_order_request("u-1").unwrap_err(), Error::EmptyOrder);
   }

   #[test]
   fn request_is_idempotent() {
      let mut cart = Cart::new();
      cart.add_item("vodka", 2);
      cart.add_item("chips", 1);

      let first = cart.to_order_request("u-1").unwrap();
      let second = cart.to_order_request("u-1").unwrap();
      assert_eq!(first, second);
      assert_eq!(first.items.len(), 2);
      assert_eq!(
         serde_json::to_string(&first).unwrap(),
         serde_json::to_string(&second).unwrap()
      );
   }
}
