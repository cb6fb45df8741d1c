pub mod flatten;
pub mod frame;
pub mod retrieve;
