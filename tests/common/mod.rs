#![allow(dead_code, unused_imports)]

pub use procrun_test_utils::builders::{MemorySinks, sh};
pub use procrun_test_utils::{init_tracing, with_timeout};
