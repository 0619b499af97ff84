/* ===============================================================================
Bar stand ordering kiosk.
Device registration. 19 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use serde::{Deserialize, Serialize};

use crate::api::OrderApi;
use crate::customer::Identity;
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Room {
   pub id: String,
   pub number: String,
}

// The backend prefers room_number when the room is already known and falls
// back to room_id, never both
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegisterRequest {
   pub name: String,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub room_number: Option<String>,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub room_id: Option<String>,
}

impl RegisterRequest {
   pub fn for_room(name: &str, room: &Room) -> Self {
      Self {
         name: name.trim().to_string(),
         room_number: Some(room.number.clone()),
         room_id: None,
      }
   }

   pub fn for_room_id(name: &str, room_id: &str) -> Self {
      Self {
         name: name.trim().to_string(),
         room_number: None,
         room_id: Some(room_id.to_string()),
      }
   }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Registered {
   pub device_token: String,
   pub device_id: String,
   #[serde(default)]
   pub room_id: String,
   #[serde(default)]
   pub tab_id: String,
}

// Register this device and persist the issued token
pub async fn register(api: &dyn OrderApi, identity: &Identity, request: &RegisterRequest) -> Result<Registered> {
   if request.name.is_empty() {
      return Err(Error::Invalid(String::from("name is required")));
   }
   if request.room_number.is_none() && request.room_id.is_none() {
      return Err(Error::Invalid(String::from("room is required")));
   }

   let registered = api.register(request).await?;
   identity.store_token(&registered.device_token);
   log::info!("registration: device {} registered", registered.device_id);
   Ok(registered)
}

// Liveness check for the stored credential. False means the kiosk has to go
// through registration again, only a 401 forces that.
pub async fn check_device(api: &dyn OrderApi, identity: &Identity) -> Result<bool> {
   if !identity.has_token() {
      return Ok(false);
   }

   match api.tab_ping().await {
      Ok(()) => Ok(true),
      // The transport already dropped the token
      Err(Error::Unauthenticated) => Ok(false),
      Err(err) => {
         log::warn!("registration::check_device: {}", err);
         Ok(true)
      }
   }
}

// Explicit change-device action
pub fn forget_device(identity: &Identity) {
   identity.forget_token();
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn request_carries_one_room_field() {
      let room = Room { id: String::from("r-1"), number: String::from("a11") };

      let json = serde_json::to_value(RegisterRequest::for_room(" John Doe ", &room)).unwrap();
      assert_eq!(json, serde_json::json!({ "name": "John Doe", "room_number": "a11" }));

      let json = serde_json::to_value(RegisterRequest::for_room_id("John", "r-1")).unwrap();
      assert_eq!(json, serde_json::json!({ "name": "John", "room_id": "r-1" }));
   }
}
