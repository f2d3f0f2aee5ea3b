pub mod check;
pub mod config;
pub mod source;

pub use check::{CheckSettings, Delivery, DeliveryReport, Outcome, deliver, run_check};
pub use config::Config;
