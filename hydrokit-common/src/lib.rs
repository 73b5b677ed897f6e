pub mod configs;
pub mod utils;
