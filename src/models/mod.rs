mod filter;
mod stock;

pub use filter::*;
pub use stock::*;
