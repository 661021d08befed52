//! A bounded print-job queue. Jobs wait in a fixed-capacity store, age toward
//! higher urgency as simulated time advances, and are evicted once they have
//! waited too long. The most urgent waiting job is selected one at a time.
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod fan_out;
pub mod line_reader;
pub mod parser;
pub mod policy;
pub mod render;
pub mod store;
pub mod types;
