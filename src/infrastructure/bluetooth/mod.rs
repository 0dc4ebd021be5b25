//! Bluetooth Module
//!
//! Provides BLE communication with the micro:bit.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     BridgeService                        │
//! │   (Coordinator - connects, then runs the two loops)      │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼──────────────┐
//!         │             │              │
//!         ▼             ▼              ▼
//! ┌────────────┐ ┌────────────┐ ┌────────────┐
//! │ Connection │ │ Telemetry  │ │ Dispatcher │
//! │            │ │            │ │            │
//! │ - scanning │ │ - notify   │ │ - command  │
//! │ - GATT     │ │   decode   │ │   queue    │
//! │   lookup   │ │ - state    │ │ - GATT     │
//! │            │ │   updates  │ │   writes   │
//! └────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`profile`] - micro:bit GATT UUID table and LED bitmaps
//! - [`codec`] - notification payload decoding
//! - [`connection`] - device discovery, connection, characteristic lookup
//! - [`telemetry`] - notification subscription and state updates
//! - [`dispatcher`] - outgoing command writes
//! - [`service`] - coordinator tying the pieces together

pub mod codec;
pub mod connection;
pub mod dispatcher;
pub mod profile;
pub mod service;
pub mod telemetry;

// Re-export the coordinator entry point for convenience
pub use service::BridgeService;
