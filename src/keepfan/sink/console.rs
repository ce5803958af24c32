use super::Sink;
use crate::error::{KeepError, Result};
use crate::model::Record;
use crate::render::render_console;
use std::io::{self, Write};
use std::sync::Mutex;

pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn accept(&self, record: &Record) -> Result<()> {
        // render outside the lock; only the write is serialized
        let dump = render_console(record)?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| KeepError::LockPoisoned("console"))?;
        writeln!(out, "{}", dump.trim_end()).map_err(KeepError::Io)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| KeepError::LockPoisoned("console"))?;
        out.flush().map_err(KeepError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shared buffer so the test can read back what the sink wrote.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dumps_each_record() {
        let captured = Captured::default();
        let sink = ConsoleSink::new(Box::new(captured.clone()));

        sink.accept(&Record::new("Keep/a.json", "Alpha").with_body("first"))
            .unwrap();
        sink.accept(&Record::new("Keep/b.json", "Beta")).unwrap();
        sink.flush().unwrap();

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("```note Keep/a.json\nAlpha"));
        assert!(out.contains("first"));
        assert!(out.contains("```note Keep/b.json\nBeta"));
        assert_eq!(out.matches("```\n").count(), 2);
    }
}
