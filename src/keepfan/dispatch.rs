//! # Dispatcher
//!
//! Streams records and offers each one to every sink in parallel, then flushes
//! every sink in parallel once the stream is exhausted.
//!
//! Each record's fan-out is joined before the next record is pulled from the
//! stream. Sinks therefore see records in archive order, which keeps the
//! outline document and the paged batches reproducible from run to run, while
//! different sinks still handle the same record concurrently.
//!
//! A failing sink never stops the run: its error is collected into the
//! [`RunReport`] and the remaining sinks and records carry on. Only a failure of
//! the record stream itself (a fatal archive error) is returned as `Err`, and in
//! that case no sink is flushed.

use crate::error::{KeepError, Result};
use crate::model::Record;
use crate::sink::Sink;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use tracing::{info, warn};

/// One failed `accept` or `flush`.
#[derive(Debug)]
pub struct SinkFailure {
    pub sink: String,
    /// Archive entry of the record, `None` for flush failures.
    pub entry: Option<String>,
    pub error: KeepError,
}

impl fmt::Display for SinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry {
            Some(entry) => write!(f, "[{}] {}: {}", self.sink, entry, self.error),
            None => write!(f, "[{}] flush: {}", self.sink, self.error),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Records handed to the sinks.
    pub records: usize,
    pub failures: Vec<SinkFailure>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Dispatcher {
    sinks: Vec<Box<dyn Sink>>,
    pool: Option<ThreadPool>,
}

impl Dispatcher {
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { sinks, pool: None }
    }

    /// Runs on a dedicated pool of `threads` workers instead of rayon's global one.
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("keepfan-worker-{}", i))
            .build()
            .map_err(|e| KeepError::Config(format!("Cannot start worker pool: {}", e)))?;
        self.pool = Some(pool);
        Ok(self)
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub fn run<I>(&self, records: I) -> Result<RunReport>
    where
        I: IntoIterator<Item = Result<Record>> + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| self.run_inner(records)),
            None => self.run_inner(records),
        }
    }

    fn run_inner<I>(&self, records: I) -> Result<RunReport>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let mut report = RunReport::default();

        for record in records {
            let record = record?;
            let failures = self.offer(&record);
            report.records += 1;
            report.failures.extend(failures);
        }

        report.failures.extend(self.flush_all());
        info!(
            records = report.records,
            failures = report.failures.len(),
            "dispatch finished"
        );
        Ok(report)
    }

    fn offer(&self, record: &Record) -> Vec<SinkFailure> {
        self.sinks
            .par_iter()
            .filter_map(|sink| {
                sink.accept(record).err().map(|error| {
                    warn!(sink = sink.name(), entry = %record.entry, %error, "sink failed");
                    SinkFailure {
                        sink: sink.name().to_string(),
                        entry: Some(record.entry.clone()),
                        error,
                    }
                })
            })
            .collect()
    }

    fn flush_all(&self) -> Vec<SinkFailure> {
        self.sinks
            .par_iter()
            .filter_map(|sink| {
                sink.flush().err().map(|error| {
                    warn!(sink = sink.name(), %error, "flush failed");
                    SinkFailure {
                        sink: sink.name().to_string(),
                        entry: None,
                        error,
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every call; fails on entries containing `fail_on`.
    #[derive(Default)]
    struct Recorder {
        label: &'static str,
        fail_on: Option<&'static str>,
        fail_flush: bool,
        seen: Mutex<Vec<String>>,
        flushes: AtomicUsize,
    }

    impl Recorder {
        fn new(label: &'static str) -> Self {
            Self {
                label,
                ..Default::default()
            }
        }
    }

    impl Sink for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn accept(&self, record: &Record) -> Result<()> {
            if self.fail_on.is_some_and(|f| record.entry.contains(f)) {
                return Err(KeepError::Io(std::io::Error::other("boom")));
            }
            self.seen.lock().unwrap().push(record.entry.clone());
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            if self.fail_flush {
                return Err(KeepError::Io(std::io::Error::other("flush boom")));
            }
            Ok(())
        }
    }

    /// Lets the test inspect a sink after handing ownership to the dispatcher.
    struct Shared(std::sync::Arc<Recorder>);

    impl Sink for Shared {
        fn name(&self) -> &str {
            self.0.name()
        }
        fn accept(&self, record: &Record) -> Result<()> {
            self.0.accept(record)
        }
        fn flush(&self) -> Result<()> {
            self.0.flush()
        }
    }

    fn records(entries: &[&str]) -> Vec<Result<Record>> {
        entries.iter().map(|e| Ok(Record::new(*e, ""))).collect()
    }

    #[test]
    fn test_every_sink_sees_every_record_in_order() {
        let a = std::sync::Arc::new(Recorder::new("a"));
        let b = std::sync::Arc::new(Recorder::new("b"));
        let dispatcher = Dispatcher::new(vec![
            Box::new(Shared(a.clone())),
            Box::new(Shared(b.clone())),
        ]);

        let entries: Vec<String> = (0..50).map(|i| format!("Keep/{}.json", i)).collect();
        let refs: Vec<&str> = entries.iter().map(|s| s.as_str()).collect();
        let report = dispatcher.run(records(&refs)).unwrap();

        assert_eq!(report.records, 50);
        assert!(report.is_clean());
        assert_eq!(*a.seen.lock().unwrap(), entries);
        assert_eq!(*b.seen.lock().unwrap(), entries);
        assert_eq!(a.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(b.flushes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sink_failures_are_collected_not_fatal() {
        let failing = std::sync::Arc::new(Recorder {
            label: "failing",
            fail_on: Some("bad"),
            fail_flush: true,
            ..Default::default()
        });
        let healthy = std::sync::Arc::new(Recorder::new("healthy"));
        let dispatcher = Dispatcher::new(vec![
            Box::new(Shared(failing.clone())),
            Box::new(Shared(healthy.clone())),
        ]);

        let report = dispatcher
            .run(records(&["Keep/ok.json", "Keep/bad.json", "Keep/last.json"]))
            .unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(healthy.seen.lock().unwrap().len(), 3);
        assert_eq!(failing.seen.lock().unwrap().len(), 2);
        assert_eq!(report.failures.len(), 2);

        let accept = report.failures.iter().find(|f| f.entry.is_some()).unwrap();
        assert_eq!(accept.sink, "failing");
        assert_eq!(accept.entry.as_deref(), Some("Keep/bad.json"));
        assert!(accept.to_string().contains("Keep/bad.json"));

        let flush = report.failures.iter().find(|f| f.entry.is_none()).unwrap();
        assert!(flush.to_string().contains("flush"));
    }

    #[test]
    fn test_stream_error_aborts_without_flush() {
        let sink = std::sync::Arc::new(Recorder::new("s"));
        let dispatcher = Dispatcher::new(vec![Box::new(Shared(sink.clone()))]);

        let stream = vec![
            Ok(Record::new("Keep/a.json", "")),
            Err(KeepError::PathTraversal {
                entry: "../x.json".into(),
            }),
            Ok(Record::new("Keep/never.json", "")),
        ];
        let err = dispatcher.run(stream).unwrap_err();

        assert!(matches!(err, KeepError::PathTraversal { .. }));
        assert_eq!(sink.seen.lock().unwrap().len(), 1);
        assert_eq!(sink.flushes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dedicated_pool() {
        let sink = std::sync::Arc::new(Recorder::new("s"));
        let dispatcher = Dispatcher::new(vec![Box::new(Shared(sink.clone()))])
            .with_threads(2)
            .unwrap();
        let report = dispatcher.run(records(&["a.json", "b.json"])).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(dispatcher.sink_names(), vec!["s"]);
    }

    #[test]
    fn test_empty_stream_still_flushes() {
        let sink = std::sync::Arc::new(Recorder::new("s"));
        let dispatcher = Dispatcher::new(vec![Box::new(Shared(sink.clone()))]);
        let report = dispatcher.run(Vec::new()).unwrap();
        assert_eq!(report.records, 0);
        assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
    }
}
