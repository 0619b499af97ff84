/* ===============================================================================
Bar stand ordering kiosk.
Main module, demo kiosk over the client core. 08 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

use futures::StreamExt;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::UnboundedReceiverStream;

use barstand::api::{HttpOrderApi, OrderApi};
use barstand::cart::Cart;
use barstand::customer::Identity;
use barstand::environment::{self as env, Vars, VARS};
use barstand::menu::MenuCatalog;
use barstand::orders::Order;
use barstand::registration;
use barstand::session::{Notice, OrderSession, SessionConfig, SessionScope};

// ============================================================================
// [Run!]
// ============================================================================
#[tokio::main]
async fn main() {
   let mut builder = pretty_env_logger::formatted_builder();
   builder.target(pretty_env_logger::env_logger::Target::Stdout);
   builder.init();

   log::info!("Starting...");

   // Settings from environments
   match VARS.set(Vars::from_env()) {
      Ok(_) => log::info!("Settings loaded"),
      _ => log::info!("Something wrong with settings"),
   }
   let vars = VARS.get().unwrap();

   // Persisted kiosk identity
   let identity = match Identity::load_or_create(&vars.state_dir) {
      Ok(identity) => Arc::new(identity),
      Err(err) => {
         log::error!("main: {}", err);
         return;
      }
   };
   log::info!("User id {}", identity.user_id());

   // Catalog is deployment configuration, not derived data
   let catalog = match &vars.menu_file {
      Some(path) => match MenuCatalog::from_file(path) {
         Ok(catalog) => catalog,
         Err(err) => {
            log::error!("main: {}", err);
            return;
         }
      },
      None => MenuCatalog::demo(),
   };

   let api = match HttpOrderApi::new(&vars.api_url, Arc::clone(&identity)) {
      Ok(api) => Arc::new(api),
      Err(err) => {
         log::error!("main: {}", err);
         return;
      }
   };

   // "barstand staff" watches the whole queue instead of one customer
   let staff = std::env::args().any(|arg| arg == "staff");
   let scope = if staff { SessionScope::Staff } else { SessionScope::Customer };

   let config = SessionConfig {
      poll_interval: vars.poll_interval,
      ws_url: vars.ws_url.clone(),
      scope,
   };
   let (session, notices) = OrderSession::new(
      Arc::clone(&api) as Arc<dyn OrderApi>,
      Arc::clone(&identity),
      config,
   );
   session.connect();

   // A stored device token may have been revoked while the kiosk was off
   if !staff && identity.has_token() {
      if let Ok(false) = registration::check_device(api.as_ref(), &identity).await {
         println!("! device registration required, see 'register'");
      }
   }

   repl(&session, api.as_ref(), &identity, &catalog, staff, notices).await;

   session.dispose();
   log::info!("Bye");
}

// ============================================================================
// [Kiosk loop]
// ============================================================================
async fn repl(
   session: &Arc<OrderSession>,
   api: &dyn OrderApi,
   identity: &Identity,
   catalog: &MenuCatalog,
   staff: bool,
   mut notices: UnboundedReceiverStream<Notice>,
) {
   if staff {
      println!("Staff queue. Commands: orders, ready <id>, status <id>, state, ping, quit");
   } else {
      println!("Welcome! Commands: menu, add <id> [qty], del <id>, cart, clear, submit, orders, status <id>, rooms, register <name> <room>, forget, state, ping, quit");
   }

   let mut cart = Cart::new();
   let mut lines = BufReader::new(tokio::io::stdin()).lines();

   loop {
      tokio::select! {
         notice = notices.next() => {
            match notice {
               Some(Notice::Info(text)) => println!("• {}", text),
               Some(Notice::Error(text)) => println!("! {}", text),
               None => break,
            }
         }

         line = lines.next_line() => {
            let line = match line {
               Ok(Some(line)) => line,
               _ => break,
            };
            if !command(line.trim(), session, api, identity, catalog, &mut cart).await {
               break;
            }
         }
      }
   }
}

// One command from the operator, false to exit
async fn command(
   line: &str,
   session: &Arc<OrderSession>,
   api: &dyn OrderApi,
   identity: &Identity,
   catalog: &MenuCatalog,
   cart: &mut Cart,
) -> bool {
   let mut parts = line.split_whitespace();
   let cmd = parts.next().unwrap_or_default();

   match cmd {
      "" => {}

      "menu" => {
         for category in catalog.categories() {
            println!("{}:", category);
            for item in catalog.items_in(category) {
               println!("   {:<14} {:<22} {}", item.id, item.name, env::price_with_unit(item.price));
            }
         }
      }

      "add" => {
         let id = parts.next().unwrap_or_default();
         let qty = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);
         if catalog.get(id).is_none() {
            println!("! no such item, see 'menu'");
         } else {
            cart.add_item(id, qty);
            println!("• added, {} items in cart", cart.total_items());
         }
      }

      "del" => {
         let id = parts.next().unwrap_or_default();
         cart.set_quantity(id, 0);
         println!("• removed, {} items in cart", cart.total_items());
      }

      "cart" => {
         if cart.is_empty() {
            println!("Cart is empty");
         } else {
            for (id, qty) in cart.lines() {
               println!("   {:<14} x {}", id, qty);
            }
            match cart.total_price(catalog) {
               Ok(total) => println!("In cart {} pcs. for total cost {}", cart.total_items(), env::price_with_unit(total)),
               Err(err) => println!("! {}", err),
            }
         }
      }

      "clear" => {
         cart.clear();
         println!("• cart is empty now");
      }

      "submit" => {
         if let Ok(created) = session.submit_order(cart).await {
            println!("• order {} accepted", created.id);
         }
      }

      "orders" => {
         let orders = session.active_orders();
         if orders.is_empty() {
            println!("No orders in queue");
         } else {
            for order in orders {
               print_order(&order);
            }
         }
      }

      "ready" => {
         let id = parts.next().unwrap_or_default();
         if id.is_empty() {
            println!("! usage: ready <order id>");
         } else {
            let _ = session.mark_ready(id).await;
         }
      }

      // Single order lookup, the old status checker page
      "status" => {
         let id = parts.next().unwrap_or_default();
         match api.order(id).await {
            Ok(order) => print_order(&order),
            Err(err) => println!("! {}", err),
         }
      }

      "state" => {
         println!("Session {}, user {}", session.state().as_ref(), session.user_id());
         if session.needs_registration() {
            println!("! device registration required");
         }
      }

      "rooms" => {
         match api.rooms().await {
            Ok(rooms) => {
               for room in rooms {
                  println!("   {:<10} {}", room.number, room.id);
               }
            }
            Err(err) => println!("! {}", err),
         }
      }

      "register" => {
         let name = parts.next().unwrap_or_default();
         let room_id = parts.next().unwrap_or_default();
         let request = registration::RegisterRequest::for_room_id(name, room_id);
         match registration::register(api, identity, &request).await {
            Ok(registered) => {
               session.registered();
               println!("• registered as device {}", registered.device_id);
            }
            Err(err) => println!("! {}", err),
         }
      }

      "forget" => {
         registration::forget_device(identity);
         println!("• device token dropped");
      }

      "ping" => {
         match api.health().await {
            Ok(()) => println!("• backend is up"),
            Err(err) => println!("! {}", err),
         }
      }

      "quit" | "exit" => return false,

      _ => println!("! unknown command"),
   }

   true
}

fn print_order(order: &Order) {
   let when = order.timestamp
   .map(|t| t.format("%H:%M:%S").to_string())
   .unwrap_or_default();
   println!("Order {} — {} {}", order.id, order.status, when);

   for line in &order.items {
      println!("   {:<22} x {} = {}", line.name, line.quantity, env::price_with_unit(line.cost()));
   }
   if order.total_price > 0 {
      println!("   total {}", env::price_with_unit(order.total_price));
   }
}
