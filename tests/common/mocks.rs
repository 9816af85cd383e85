//! Mock output sink, used to make document writes fail on demand.
use mockall::mock;

use std::io::{self, Write};

mock! {
    pub Sink {}
    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
        fn flush(&mut self) -> io::Result<()>;
    }
}
