/* ===============================================================================
Bar stand ordering kiosk.
Status push channel. 21 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use derive_more::From;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::orders::OrderStatus;

// One frame pushed by the backend. Anything but ORDER_STATUS is ignored.
#[derive(Debug, Deserialize)]
struct Frame {
   #[serde(rename = "type")]
   kind: String,
   #[serde(rename = "orderID", default)]
   order_id: Option<String>,
   // The deployed backend spells the status field "order"
   #[serde(default, alias = "order")]
   status: Option<OrderStatus>,
}

// A pushed status change. Pure wake-up signal: the session re-fetches the
// order list, the frame payload itself is never a source of truth.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusUpdate {
   pub order_id: Option<String>,
   pub status: Option<OrderStatus>,
}

#[derive(Clone, Debug, PartialEq, From)]
pub enum ChannelEvent {
   Status(StatusUpdate),
   // The socket is gone, the poll loop carries the session from here
   Closed(String),
}

fn parse_frame(text: &str) -> Option<StatusUpdate> {
   let frame: Frame = serde_json::from_str(text).ok()?;
   if frame.kind != "ORDER_STATUS" {
      return None;
   }
   Some(StatusUpdate {
      order_id: frame.order_id,
      status: frame.status,
   })
}

// Single connection per session lifetime. When it dies we report it once and
// return, reconnection is a new session's business.
pub async fn run_status_channel(url: String, tx: UnboundedSender<ChannelEvent>) {
   let (mut stream, _) = match connect_async(url.as_str()).await {
      Ok(pair) => pair,
      Err(err) => {
         let _ = tx.send(ChannelEvent::Closed(format!("connect {}: {}", url, err)));
         return;
      }
   };
   log::info!("channel: connected to {}", url);

   let reason = loop {
      match stream.next().await {
         Some(Ok(Message::Text(text))) => {
            if let Some(update) = parse_frame(text.as_str()) {
               // The receiving session is gone, nothing left to do
               if tx.send(ChannelEvent::Status(update)).is_err() {
                  return;
               }
            }
         }

         // Read-only loop, so answer pings ourselves
         Some(Ok(Message::Ping(payload))) => {
            if let Err(err) = stream.send(Message::Pong(payload)).await {
               break err.to_string();
            }
         }

         Some(Ok(Message::Close(_))) | None => break String::from("closed by server"),

         // Binary frames are not part of the protocol
         Some(Ok(_)) => {}

         Some(Err(err)) => break err.to_string(),
      }
   };

   log::warn!("channel: {}", reason);
   let _ = tx.send(ChannelEvent::Closed(reason));
}
