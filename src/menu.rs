/* ===============================================================================
Bar stand ordering kiosk.
Menu catalog. 12 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

// Demo deployment catalog, the same data the kiosk pages ship with
pub const DEMO_MENU: &str = include_str!("../menu.json");

// Money is integer euro cents on our side, the wire speaks decimal euros.
// The conversion happens here and nowhere else.
pub mod euros {
   use serde::{Deserialize, Deserializer, Serializer};

   pub fn serialize<S: Serializer>(cents: &u32, serializer: S) -> Result<S::Ok, S::Error> {
      serializer.serialize_f64(*cents as f64 / 100.0)
   }

   pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
      let value = f64::deserialize(deserializer)?;
      Ok((value * 100.0).round() as u32)
   }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
   pub id: String,
   pub name: String,
   pub category: String,
   #[serde(with = "euros")]
   pub price: u32,
   #[serde(default)]
   pub description: String,
}

// Read-only id lookup over the deployment catalog. Loaded once at startup,
// there is no mutation API.
pub struct MenuCatalog {
   items: Vec<MenuItem>,
   index: HashMap<String, usize>,
}

impl MenuCatalog {
   pub fn new(items: Vec<MenuItem>) -> Self {
      let index = items.iter()
      .enumerate()
      .map(|(i, item)| (item.id.clone(), i))
      .collect();
      Self { items, index }
   }

   pub fn from_json(source: &str) -> Result<Self> {
      let items: Vec<MenuItem> = serde_json::from_str(source)
      .map_err(|err| Error::Storage(format!("menu parse: {}", err)))?;
      Ok(Self::new(items))
   }

   pub fn from_file(path: &Path) -> Result<Self> {
      let source = fs::read_to_string(path)
      .map_err(|err| Error::Storage(format!("menu {}: {}", path.display(), err)))?;
      Self::from_json(&source)
   }

   pub fn demo() -> Self {
      Self::from_json(DEMO_MENU).expect("embedded menu is valid")
   }

   pub fn get(&self, item_id: &str) -> Option<&MenuItem> {
      self.index.get(item_id).map(|i| &self.items[*i])
   }

   pub fn unit_price(&self, item_id: &str) -> Result<u32> {
      self.get(item_id)
      .map(|item| item.price)
      .ok_or_else(|| Error::MissingItem(item_id.to_string()))
   }

   pub fn items(&self) -> &[MenuItem] {
      &self.items
   }

   // Categories in the order of their first appearance
   pub fn categories(&self) -> Vec<&str> {
      let mut res: Vec<&str> = Vec::new();
      for item in &self.items {
         if !res.contains(&item.category.as_str()) {
            res.push(item.category.as_str());
         }
      }
      res
   }

   pub fn items_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a MenuItem> {
      self.items.iter().filter(move |item| item.category == category)
   }

   pub fn len(&self) -> usize {
      self.items.len()
   }

   pub fn is_empty(&self) -> bool {
      self.items.is_empty()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn demo_menu_loads() {
      let catalog = MenuCatalog::demo();
      assert_eq!(catalog.len(), 13);
      assert_eq!(catalog.get("vodka").unwrap().price, 230);
      assert_eq!(catalog.categories(), vec!["alcoholic", "non_alcoholic", "snacks"]);
      assert_eq!(catalog.items_in("snacks").count(), 2);
   }

   #[test]
   fn unknown_item_is_an_error() {
      let catalog = MenuCatalog::demo();
      assert_eq!(catalog.unit_price("mead"), Err(Error::MissingItem(String::from("mead"))));
   }

   #[test]
   fn euros_to_cents_and_back() {
      let item: MenuItem = serde_json::from_str(
         r#"{ "id": "wine", "name": "Wine (0.2L)", "category": "alcoholic", "price": 3.50 }"#
      ).unwrap();
      assert_eq!(item.price, 350);

      let json = serde_json::to_value(&item).unwrap();
      assert_eq!(json["price"], serde_json::json!(3.5));
   }

   #[test]
   fn bad_json_reports_storage_error() {
      assert!(matches!(MenuCatalog::from_json("not json"), Err(Error::Storage(_))));
   }
}
