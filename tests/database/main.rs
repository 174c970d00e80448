#[path = "../common/mod.rs"]
mod common;

mod test_helpers;
