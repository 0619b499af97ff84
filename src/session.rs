/* ===============================================================================
Bar stand ordering kiosk.
Order session controller. 24 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use strum::AsRefStr;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::api::OrderApi;
use crate::cart::Cart;
use crate::channel::{self, ChannelEvent};
use crate::customer::Identity;
use crate::error::{Error, Result};
use crate::orders::{Created, Order, OrderStatus};

// Poll cadence used when the config does not override it
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

// Connectivity of one session. Terminated is terminal, reconnecting after a
// teardown takes a new session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr)]
pub enum SessionState {
   Disconnected,
   Syncing,
   Live,
   Degraded,
   Terminated,
}

// Whose orders this session watches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionScope {
   // One customer's own orders
   Customer,
   // The whole staff queue
   Staff,
}

// User-visible transient notification, rendered by the UI as a toast
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
   Info(String),
   Error(String),
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
   pub poll_interval: Duration,
   pub ws_url: Option<String>,
   pub scope: SessionScope,
}

impl Default for SessionConfig {
   fn default() -> Self {
      Self {
         poll_interval: DEFAULT_POLL_INTERVAL,
         ws_url: None,
         scope: SessionScope::Customer,
      }
   }
}

struct SessionInner {
   state: SessionState,
   orders: Vec<Order>,
   // Fetches carry a sequence number, a late answer to an old request must
   // not overwrite what a newer one already applied
   fetch_issued: u64,
   fetch_applied: u64,
   submit_in_flight: bool,
   did_connect: bool,
   needs_registration: bool,
   last_error: Option<String>,
}

// Bridges the cart to the remote ordering API and keeps an eventually
// consistent read-only copy of the server's order list. One instance per
// user session, disposed when the surface goes away.
pub struct OrderSession {
   api: Arc<dyn OrderApi>,
   identity: Arc<Identity>,
   config: SessionConfig,
   inner: Mutex<SessionInner>,
   notices: mpsc::UnboundedSender<Notice>,
   tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl OrderSession {
   pub fn new(
      api: Arc<dyn OrderApi>,
      identity: Arc<Identity>,
      config: SessionConfig,
   ) -> (Arc<Self>, UnboundedReceiverStream<Notice>) {
      let (tx, rx) = mpsc::unbounded_channel();

      let session = Arc::new(Self {
         api,
         identity,
         config,
         inner: Mutex::new(SessionInner {
            state: SessionState::Disconnected,
            orders: Vec::new(),
            fetch_issued: 0,
            fetch_applied: 0,
            submit_in_flight: false,
            did_connect: false,
            needs_registration: false,
            last_error: None,
         }),
         notices: tx,
         tasks: Mutex::new(Vec::new()),
      });

      (session, UnboundedReceiverStream::new(rx))
   }

   // ============================================================================
   // [Snapshot accessors]
   // ============================================================================

   pub fn state(&self) -> SessionState {
      self.inner.lock().unwrap().state
   }

   pub fn orders(&self) -> Vec<Order> {
      self.inner.lock().unwrap().orders.clone()
   }

   // Staff queue view: everything short of completed
   pub fn active_orders(&self) -> Vec<Order> {
      self.inner.lock().unwrap().orders.iter()
      .filter(|order| order.status.is_active())
      .cloned()
      .collect()
   }

   pub fn needs_registration(&self) -> bool {
      self.inner.lock().unwrap().needs_registration
   }

   pub fn registered(&self) {
      self.inner.lock().unwrap().needs_registration = false;
   }

   pub fn last_error(&self) -> Option<String> {
      self.inner.lock().unwrap().last_error.clone()
   }

   pub fn user_id(&self) -> &str {
      self.identity.user_id()
   }

   fn notify(&self, notice: Notice) {
      let _ = self.notices.send(notice);
   }

   // 401 invalidates the credential, everything else is a transient failure
   fn note_failure(&self, inner: &mut SessionInner, err: &Error) {
      if matches!(err, Error::Unauthenticated) {
         self.identity.forget_token();
         inner.needs_registration = true;
      }
      inner.last_error = Some(err.to_string());
   }

   // ============================================================================
   // [Cart submission]
   // ============================================================================

   // On success the cart is cleared and the order list refreshed at once.
   // On any failure the cart stays intact so the user can retry.
   pub async fn submit_order(&self, cart: &mut Cart) -> Result<Created> {
      // Local validation happens before any network traffic
      let request = cart.to_order_request(self.identity.user_id())?;

      {
         let mut inner = self.inner.lock().unwrap();
         if inner.state == SessionState::Terminated {
            return Err(Error::Terminated);
         }
         if inner.submit_in_flight {
            return Err(Error::Busy);
         }
         inner.submit_in_flight = true;
      }

      let result = self.api.submit(&request).await;

      let done = {
         let mut inner = self.inner.lock().unwrap();
         inner.submit_in_flight = false;
         if inner.state == SessionState::Terminated {
            return Err(Error::Terminated);
         }
         match result {
            Ok(created) => {
               inner.last_error = None;
               Ok(created)
            }
            Err(err) => {
               self.note_failure(&mut inner, &err);
               Err(err)
            }
         }
      };

      match done {
         Ok(created) => {
            cart.clear();
            self.notify(Notice::Info(String::from("Order placed successfully!")));
            // The server already knows the new order, pull it right away
            let _ = self.refresh_orders().await;
            Ok(created)
         }
         Err(err) => {
            self.notify(Notice::Error(format!("Failed to place order: {}", err)));
            Err(err)
         }
      }
   }

   // ============================================================================
   // [Order list reconciliation]
   // ============================================================================

   // The server is authoritative, the cached list is replaced wholesale.
   // A failed fetch shows an empty queue and an error, never silent staleness.
   pub async fn refresh_orders(&self) -> Result<()> {
      let seq = {
         let mut inner = self.inner.lock().unwrap();
         if inner.state == SessionState::Terminated {
            return Err(Error::Terminated);
         }
         if inner.state == SessionState::Disconnected {
            inner.state = SessionState::Syncing;
         }
         inner.fetch_issued += 1;
         inner.fetch_issued
      };

      let filter = match self.config.scope {
         SessionScope::Customer => Some(self.identity.user_id()),
         SessionScope::Staff => None,
      };
      let result = self.api.orders(filter).await;

      let mut inner = self.inner.lock().unwrap();
      if inner.state == SessionState::Terminated {
         return Err(Error::Terminated);
      }
      // Last writer by issue time wins, a stale answer is dropped
      if seq <= inner.fetch_applied {
         return Ok(());
      }
      inner.fetch_applied = seq;

      match result {
         Ok(orders) => {
            inner.orders = orders;
            inner.state = SessionState::Live;
            inner.last_error = None;
            Ok(())
         }
         Err(err) => {
            inner.orders.clear();
            inner.state = SessionState::Degraded;
            self.note_failure(&mut inner, &err);
            drop(inner);
            self.notify(Notice::Error(format!("Failed to load orders: {}", err)));
            Err(err)
         }
      }
   }

   // ============================================================================
   // [Connectivity]
   // ============================================================================

   // Starts the poll loop and, when configured, the push channel. One poll
   // loop and at most one push channel per session lifetime.
   pub fn connect(self: &Arc<Self>) {
      {
         let mut inner = self.inner.lock().unwrap();
         if inner.did_connect || inner.state == SessionState::Terminated {
            return;
         }
         inner.did_connect = true;
         if inner.state == SessionState::Disconnected {
            inner.state = SessionState::Syncing;
         }
      }

      let mut tasks = self.tasks.lock().unwrap();

      // Durability fallback: periodic pull even while the push channel is
      // healthy, the channel may be dropped silently
      let weak = Arc::downgrade(self);
      let interval = self.config.poll_interval;
      tasks.push(tokio::spawn(async move {
         loop {
            match weak.upgrade() {
               Some(session) => {
                  let _ = session.refresh_orders().await;
                  if session.state() == SessionState::Terminated {
                     break;
                  }
               }
               None => break,
            }
            tokio::time::sleep(interval).await;
         }
      }));

      if let Some(url) = self.config.ws_url.clone() {
         let (tx, rx) = mpsc::unbounded_channel();
         tasks.push(tokio::spawn(channel::run_status_channel(url, tx)));
         tasks.push(tokio::spawn(Self::listen(Arc::downgrade(self), rx)));
      }
   }

   async fn listen(weak: Weak<Self>, mut rx: UnboundedReceiver<ChannelEvent>) {
      while let Some(event) = rx.recv().await {
         let session = match weak.upgrade() {
            Some(session) => session,
            None => break,
         };
         if !session.on_channel_event(event).await {
            break;
         }
      }
   }

   // A pushed frame is a wake-up signal only, reconciliation always goes
   // through a full fetch. Returns false when listening should stop.
   pub(crate) async fn on_channel_event(&self, event: ChannelEvent) -> bool {
      match event {
         ChannelEvent::Status(update) => {
            let text = match &update.status {
               Some(status) if !matches!(status, OrderStatus::Completed) => {
                  format!("Order status: {}", status)
               }
               _ => String::from("Order completed!"),
            };
            self.notify(Notice::Info(text));

            let _ = self.refresh_orders().await;
            self.state() != SessionState::Terminated
         }

         ChannelEvent::Closed(reason) => {
            log::warn!("session: push channel lost: {}", reason);
            let mut inner = self.inner.lock().unwrap();
            if matches!(inner.state, SessionState::Syncing | SessionState::Live) {
               inner.state = SessionState::Degraded;
            }
            inner.last_error = Some(Error::Channel(reason).to_string());
            false
         }
      }
   }

   // ============================================================================
   // [Staff queue]
   // ============================================================================

   // Optimistic: the order leaves the cached queue immediately and comes
   // back to its place when the server rejects the transition
   pub async fn mark_ready(&self, order_id: &str) -> Result<()> {
      let removed = {
         let mut inner = self.inner.lock().unwrap();
         if inner.state == SessionState::Terminated {
            return Err(Error::Terminated);
         }
         match inner.orders.iter().position(|order| order.id == order_id) {
            Some(index) => Some((index, inner.orders.remove(index))),
            None => None,
         }
      };

      let result = self.api.set_status(order_id, &OrderStatus::Completed).await;

      match result {
         Ok(()) => {
            self.notify(Notice::Info(format!("Order {} marked ready", order_id)));
            Ok(())
         }
         Err(err) => {
            {
               let mut inner = self.inner.lock().unwrap();
               if inner.state != SessionState::Terminated {
                  if let Some((index, order)) = removed {
                     let index = index.min(inner.orders.len());
                     inner.orders.insert(index, order);
                  }
                  self.note_failure(&mut inner, &err);
               }
            }
            self.notify(Notice::Error(format!("Failed to mark order {} ready: {}", order_id, err)));
            Err(err)
         }
      }
   }

   // ============================================================================
   // [Teardown]
   // ============================================================================

   // Terminal. In-flight fetches resolve into nothing, the poll loop and the
   // push channel stop. A disposed session is never revived.
   pub fn dispose(&self) {
      {
         let mut inner = self.inner.lock().unwrap();
         if inner.state == SessionState::Terminated {
            return;
         }
         inner.state = SessionState::Terminated;
      }
      for task in self.tasks.lock().unwrap().drain(..) {
         task.abort();
      }
      log::info!("session: terminated for {}", self.identity.user_id());
   }
}
