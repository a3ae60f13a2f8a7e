use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory console that collects everything written to it.
#[derive(Clone, Default)]
pub(crate) struct TestBuffer(Arc<Mutex<Vec<u8>>>);

pub(crate) struct TestWriter(Arc<Mutex<Vec<u8>>>);

impl TestBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for TestBuffer {
    type Writer = TestWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TestWriter(self.0.clone())
    }
}
