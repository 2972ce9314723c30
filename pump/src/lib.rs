#[macro_use]
extern crate log;

pub mod config;
mod error;
mod sweep;

pub use error::SweepError;
pub use sweep::*;
