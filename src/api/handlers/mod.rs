// SPDX-License-Identifier: MIT

mod connect;
mod devices;
mod events;
mod health;

pub use connect::connect_handler;
pub use devices::{create_device, delete_device, list_devices, update_device};
pub use events::event_stream;
pub use health::health_check;
