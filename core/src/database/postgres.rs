pub mod client;
pub mod copy;
pub mod generate;
pub mod pool;
