//! Progress reporting

use std::sync::Arc;

/// Callback receiving a completion percentage in `0..=100`
#[derive(Clone)]
pub struct ProgressSink(Arc<dyn Fn(u8) + Send + Sync>);

impl ProgressSink {
    pub fn new(callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    pub fn report(&self, percent: u8) {
        (self.0)(percent.min(100));
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProgressSink")
    }
}

/// Report through an optional sink
pub(crate) fn report(sink: Option<&ProgressSink>, percent: u8) {
    if let Some(sink) = sink {
        sink.report(percent);
    }
}
