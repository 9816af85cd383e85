#![allow(dead_code)]

pub mod mocks;

pub use mocks::MockSink;

use std::{env::temp_dir, path::PathBuf};

use rand::distr::{Alphanumeric, SampleString};

/// Routes the library's `log` output to the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fresh path in the temporary directory with the given extension.
pub fn temp_path(extension: &str) -> PathBuf {
    let file_name = Alphanumeric.sample_string(&mut rand::rng(), 16);
    temp_dir().join(format!("{}.{}", file_name, extension))
}
