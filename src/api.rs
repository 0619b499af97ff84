/* ===============================================================================
Bar stand ordering kiosk.
Remote ordering API. 17 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::customer::Identity;
use crate::error::{Error, Result};
use crate::orders::{Created, LegacyOrderRequest, Order, OrderRequest, OrderStatus};
use crate::registration::{Registered, RegisterRequest, Room};

// Every call is bounded, an expired request counts as a fetch error
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Seam between the session and the backend. The backend is an opaque
// collaborator, everything it owns stays behind this trait.
#[async_trait]
pub trait OrderApi: Send + Sync {
   async fn submit(&self, request: &OrderRequest) -> Result<Created>;

   // Old kiosk shape, translated into the unified request right here
   async fn submit_legacy(&self, request: &LegacyOrderRequest) -> Result<Created> {
      self.submit(&OrderRequest::from(request.clone())).await
   }

   // Whole pending queue without a user filter, one user's orders with it
   async fn orders(&self, user_id: Option<&str>) -> Result<Vec<Order>>;

   async fn order(&self, order_id: &str) -> Result<Order>;

   async fn set_status(&self, order_id: &str, status: &OrderStatus) -> Result<()>;

   async fn rooms(&self) -> Result<Vec<Room>>;

   async fn register(&self, request: &RegisterRequest) -> Result<Registered>;

   // Authenticated liveness ping, 401 means the device token is gone
   async fn tab_ping(&self) -> Result<()>;

   async fn health(&self) -> Result<()>;
}

// reqwest-backed implementation against the configured base URL
pub struct HttpOrderApi {
   http: Client,
   base: String,
   identity: Arc<Identity>,
}

impl HttpOrderApi {
   pub fn new(base: &str, identity: Arc<Identity>) -> Result<Self> {
      let http = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|err| Error::Network(format!("api::new: {}", err)))?;

      Ok(Self {
         http,
         base: base.trim_end_matches('/').to_string(),
         identity,
      })
   }

   fn url(&self, path: &str) -> String {
      format!("{}{}", self.base, path)
   }

   // Attach the device credential and map the response the way every
   // endpoint expects: 401 drops the stored token, any other non-2xx
   // becomes a network error carrying the body message
   async fn send(&self, request: RequestBuilder) -> Result<Response> {
      let request = match self.identity.device_token() {
         Some(token) => request.header("Authorization", format!("Device {}", token)),
         None => request,
      };

      let response = request.send().await?;

      let status = response.status();
      if status == StatusCode::UNAUTHORIZED {
         self.identity.forget_token();
         return Err(Error::Unauthenticated);
      }
      if !status.is_success() {
         let body = response.text().await.unwrap_or_default();
         let text = if body.is_empty() {
            format!("HTTP {}", status.as_u16())
         } else {
            body
         };
         return Err(Error::Network(text));
      }

      Ok(response)
   }

   async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
      let response = self.send(self.http.get(self.url(path))).await?;
      response.json()
      .await
      .map_err(|err| Error::Network(format!("api::get {}: {}", path, err)))
   }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
   async fn submit(&self, request: &OrderRequest) -> Result<Created> {
      let response = self.send(self.http.post(self.url("/order")).json(request)).await?;
      response.json()
      .await
      .map_err(|err| Error::Network(format!("api::submit: {}", err)))
   }

   async fn orders(&self, user_id: Option<&str>) -> Result<Vec<Order>> {
      let mut request = self.http.get(self.url("/orders"));
      if let Some(id) = user_id {
         request = request.query(&[("userID", id)]);
      }

      let response = self.send(request).await?;
      response.json()
      .await
      .map_err(|err| Error::Network(format!("api::orders: {}", err)))
   }

   async fn order(&self, order_id: &str) -> Result<Order> {
      self.get_json(&format!("/orders/{}", order_id)).await
   }

   async fn set_status(&self, order_id: &str, status: &OrderStatus) -> Result<()> {
      let body = serde_json::json!({ "status": status });
      self.send(self.http.patch(self.url(&format!("/orders/{}", order_id))).json(&body)).await?;
      Ok(())
   }

   async fn rooms(&self) -> Result<Vec<Room>> {
      self.get_json("/rooms").await
   }

   async fn register(&self, request: &RegisterRequest) -> Result<Registered> {
      let response = self.send(self.http.post(self.url("/register")).json(request)).await?;
      response.json()
      .await
      .map_err(|err| Error::Network(format!("api::register: {}", err)))
   }

   async fn tab_ping(&self) -> Result<()> {
      self.send(self.http.get(self.url("/me/tab"))).await?;
      Ok(())
   }

   async fn health(&self) -> Result<()> {
      self.send(self.http.get(self.url("/health"))).await?;
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn base_url_is_normalized() {
      let dir = std::env::temp_dir().join(format!("barstand-test-{}", uuid::Uuid::new_v4()));
      let identity = Arc::new(Identity::load_or_create(&dir).unwrap());

      let api = HttpOrderApi::new("http://localhost:8000/", identity).unwrap();
      assert_eq!(api.url("/orders"), "http://localhost:8000/orders");

      std::fs::remove_dir_all(&dir).unwrap();
   }
}
