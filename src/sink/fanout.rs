//! Fan-out composition of several sinks behind one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error_handling::SinkError;
use crate::record::{Fields, Level, LogRecord};

use super::Sink;

/// Presents an ordered list of sinks as a single sink.
///
/// A record is accepted if any member accepts it, and is written to every
/// member that does. One member failing never stops delivery to the rest;
/// failures are collected and returned together.
#[derive(Clone)]
pub struct FanoutSink {
    members: Vec<Arc<dyn Sink>>,
}

impl FanoutSink {
    pub fn new(members: Vec<Arc<dyn Sink>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn collect<F>(&self, mut op: F) -> Result<(), SinkError>
    where
        F: FnMut(&Arc<dyn Sink>) -> Option<Result<(), SinkError>>,
    {
        let errors: Vec<SinkError> = self
            .members
            .iter()
            .filter_map(|m| op(m))
            .filter_map(Result::err)
            .collect();
        match SinkError::from_many(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Sink for FanoutSink {
    fn accepts_level(&self, level: Level) -> bool {
        self.members.iter().any(|m| m.accepts_level(level))
    }

    fn write(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.collect(|member| {
            member
                .accepts_level(record.level)
                .then(|| member.write(record))
        })
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.collect(|member| Some(member.flush()))
    }

    /// Closes members in order. They share one deadline: a slow member eats
    /// into the time left for the ones after it.
    async fn close(&self, deadline: Duration) -> Result<(), SinkError> {
        let expires = Instant::now() + deadline;
        let mut errors = Vec::new();
        for member in &self.members {
            let remaining = expires.saturating_duration_since(Instant::now());
            if let Err(e) = member.close(remaining).await {
                errors.push(e);
            }
        }
        match SinkError::from_many(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn with_fields(&self, fields: &Fields) -> Arc<dyn Sink> {
        Arc::new(FanoutSink {
            members: self.members.iter().map(|m| m.with_fields(fields)).collect(),
        })
    }
}
