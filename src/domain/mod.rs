pub mod penguin;

pub use penguin::*;
