#[path = "../common/mod.rs"]
mod common;

mod archive;
mod export;
mod object_store;
mod recovery;
mod transfer_failures;
