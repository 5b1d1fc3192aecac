pub mod time;

pub use time::{Duration, Time};

