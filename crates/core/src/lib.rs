#![forbid(unsafe_code)]

pub mod lang;
pub mod model;
pub mod time;

pub use lang::{Language, LocalizedList, LocalizedText};
pub use time::Clock;
