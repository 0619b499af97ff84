/* ===============================================================================
Bar stand ordering kiosk.
Persisted customer identity. 16 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};

const USER_ID_FILE: &str = "user_id";
const DEVICE_TOKEN_FILE: &str = "device_token";

// Who this kiosk installation is: an opaque user id generated once and kept
// for good, plus an optional device token the server may revoke at any time.
pub struct Identity {
   user_id: String,
   device_token: RwLock<Option<String>>,
   dir: PathBuf,
}

impl Identity {
   // Load the persisted identity or mint a new one on first run
   pub fn load_or_create(dir: &Path) -> Result<Self> {
      fs::create_dir_all(dir)
      .map_err(|err| Error::Storage(format!("customer::load_or_create {}: {}", dir.display(), err)))?;

      let id_path = dir.join(USER_ID_FILE);
      let user_id = match fs::read_to_string(&id_path) {
         Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
         _ => {
            let id = Uuid::new_v4().to_string();
            fs::write(&id_path, &id)
            .map_err(|err| Error::Storage(format!("customer::load_or_create user id: {}", err)))?;
            log::info!("customer: new user id {}", id);
            id
         }
      };

      let device_token = fs::read_to_string(dir.join(DEVICE_TOKEN_FILE))
      .ok()
      .map(|token| token.trim().to_string())
      .filter(|token| !token.is_empty());

      Ok(Self {
         user_id,
         device_token: RwLock::new(device_token),
         dir: dir.to_path_buf(),
      })
   }

   pub fn user_id(&self) -> &str {
      &self.user_id
   }

   pub fn device_token(&self) -> Option<String> {
      self.device_token.read().unwrap().clone()
   }

   pub fn has_token(&self) -> bool {
      self.device_token.read().unwrap().is_some()
   }

   pub fn store_token(&self, token: &str) {
      *self.device_token.write().unwrap() = Some(token.to_string());
      if let Err(err) = fs::write(self.dir.join(DEVICE_TOKEN_FILE), token) {
         log::error!("customer::store_token: {}", err);
      }
   }

   // Dropped on 401 or an explicit change-device action
   pub fn forget_token(&self) {
      *self.device_token.write().unwrap() = None;
      let _ = fs::remove_file(self.dir.join(DEVICE_TOKEN_FILE));
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn scratch_dir() -> PathBuf {
      std::env::temp_dir().join(format!("barstand-test-{}", Uuid::new_v4()))
   }

   #[test]
   fn user_id_survives_restarts() {
      let dir = scratch_dir();

      let first = Identity::load_or_create(&dir).unwrap();
      let second = Identity::load_or_create(&dir).unwrap();
      assert_eq!(first.user_id(), second.user_id());
      assert!(!first.user_id().is_empty());

      fs::remove_dir_all(&dir).unwrap();
   }

   #[test]
   fn token_is_persisted_and_forgotten() {
      let dir = scratch_dir();

      let identity = Identity::load_or_create(&dir).unwrap();
      assert!(!identity.has_token());

      identity.store_token("secret");
      assert_eq!(identity.device_token().as_deref(), Some("secret"));

      // A fresh load sees the stored token
      let reloaded = Identity::load_or_create(&dir).unwrap();
      assert_eq!(reloaded.device_token().as_deref(), Some("secret"));

      reloaded.forget_token();
      assert!(!reloaded.has_token());
      let reloaded = Identity::load_or_create(&dir).unwrap();
      assert!(!reloaded.has_token());

      fs::remove_dir_all(&dir).unwrap();
   }
}
