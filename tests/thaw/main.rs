#[path = "../common/mod.rs"]
mod common;

mod flush;
mod thaw;
