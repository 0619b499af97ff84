/* ===============================================================================
Bar stand ordering kiosk.
Client core: catalog, cart and order session against the remote API.
08 Feb 2024.
----------------------------------------------------------------------------
Licensed under the terms of the GPL version 3.
http://www.gnu.org/licenses/gpl-3.0.html
Copyright (c) 2024 by Artem Khomenko _mag12@yahoo.com.
=============================================================================== */

pub mod environment;
pub mod error;
pub mod menu;
pub mod cart;
pub mod orders;
pub mod customer;
pub mod api;
pub mod registration;
pub mod channel;
pub mod session;
