/* ===============================================================================
Bar stand ordering kiosk.
Errors. 11 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
   // Local validation, checked before any network call
   #[error("order is empty")]
   EmptyOrder,

   // The cart references an item the catalog does not know
   #[error("no menu entry for '{0}'")]
   MissingItem(String),

   #[error("invalid input: {0}")]
   Invalid(String),

   // Transport failure or non-2xx response, the body message when there is one
   #[error("network: {0}")]
   Network(String),

   // HTTP 401, the stored device token is no longer valid
   #[error("device not registered")]
   Unauthenticated,

   // The push channel died, the session degrades to polling only
   #[error("push channel: {0}")]
   Channel(String),

   // A submit is already in flight for this session
   #[error("submit already in flight")]
   Busy,

   // Operation on a disposed session
   #[error("session terminated")]
   Terminated,

   #[error("storage: {0}")]
   Storage(String),
}

impl From<reqwest::Error> for Error {
   fn from(err: reqwest::Error) -> Self {
      if err.is_timeout() {
         Error::Network(format!("timeout: {}", err))
      } else {
         Error::Network(err.to_string())
      }
   }
}
