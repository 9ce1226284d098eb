mod config;
mod database;
mod errors;
mod localization;
mod remote;

pub mod constants;

pub use config::*;
pub use database::*;
pub use errors::*;
pub use localization::*;
pub use remote::*;
