pub mod client;
pub mod limiter;
pub mod prompts;
pub mod worker;

#[cfg(test)]
pub(crate) mod mock;

pub use client::*;
pub use limiter::*;
pub use worker::*;
