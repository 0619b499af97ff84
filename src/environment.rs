/* ===============================================================================
Bar stand ordering kiosk.
Global vars from environment. 09 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use once_cell::sync::OnceCell;
use std::{env, path::PathBuf, time::Duration};

// Settings
pub static VARS: OnceCell<Vars> = OnceCell::new();

const DEF_API_URL: &str = "http://localhost:8000";
const DEF_STATE_DIR: &str = ".barstand";
const DEF_POLL_SECS: u64 = 4;

// Enviroment variables
pub struct Vars {
   // Base URL of the ordering backend
   pub api_url: String,

   // Push channel endpoint, polling only if not set
   pub ws_url: Option<String>,

   // Where the user id and device token live between runs
   pub state_dir: PathBuf,

   // Deployment catalog, embedded demo menu if not set
   pub menu_file: Option<PathBuf>,

   // Cadence of the fallback order list poll
   pub poll_interval: Duration,

   // Price suffix
   pub price_unit: String,
}

impl Vars {
   pub fn from_env() -> Self {
      Vars {
         api_url: {
            match env::var("API_URL") {
               Ok(s) => s,
               Err(_) => {
                  log::info!("There is no environment variable API_URL, using {}", DEF_API_URL);
                  String::from(DEF_API_URL)
               }
            }
         },

         ws_url: {
            match env::var("WS_URL") {
               Ok(s) => Some(s),
               Err(_) => {
                  log::info!("There is no environment variable WS_URL, no push channel");
                  None
               }
            }
         },

         state_dir: {
            match env::var("STATE_DIR") {
               Ok(s) => PathBuf::from(s),
               Err(_) => PathBuf::from(DEF_STATE_DIR),
            }
         },

         menu_file: env::var("MENU_FILE").ok().map(PathBuf::from),

         poll_interval: {
            match env::var("POLL_SECS") {
               Ok(s) => match s.parse::<u64>() {
                  Ok(n) if n > 0 => Duration::from_secs(n),
                  _ => {
                     log::info!("Environment variable POLL_SECS must be positive integer");
                     Duration::from_secs(DEF_POLL_SECS)
                  }
               }
               Err(_) => Duration::from_secs(DEF_POLL_SECS),
            }
         },

         price_unit: {
            match env::var("PRICE_UNIT") {
               Ok(s) => s,
               Err(_) => String::from("€"),
            }
         },
      }
   }
}

// Price with units or bare number if vars are not initialized yet
pub fn price_with_unit(cents: u32) -> String {
   let unit = match VARS.get() {
      Some(vars) => vars.price_unit.as_str(),
      None => "",
   };
   format!("{}.{:02}{}", cents / 100, cents % 100, unit)
}
