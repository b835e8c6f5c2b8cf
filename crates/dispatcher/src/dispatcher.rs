//! Dispatcher - fan-out of merged frames to the configured sinks

use tracing::{debug, info, instrument, warn};

use contracts::{ContractError, FrameSink, MergedFrame, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::QueuedSink;
use crate::sinks::{LogSink, PngSequenceSink};

/// Sink that forwards every frame to each of its children
///
/// All children are attempted even when one fails; the first failure is
/// reported so the synchronizer does not count the frame as emitted.
pub struct Dispatcher {
    name: String,
    sinks: Vec<Box<dyn FrameSink>>,
}

impl Dispatcher {
    pub fn new(name: impl Into<String>, sinks: Vec<Box<dyn FrameSink>>) -> Self {
        Self {
            name: name.into(),
            sinks,
        }
    }

    /// Names of the child sinks, in dispatch order
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn for_each_sink(
        &mut self,
        op: &str,
        mut f: impl FnMut(&mut dyn FrameSink) -> Result<(), ContractError>,
    ) -> Result<(), ContractError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = f(sink.as_mut()) {
                warn!(sink = %sink.name(), op, error = %e, "Sink operation failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl FrameSink for Dispatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, frame: &MergedFrame) -> Result<(), ContractError> {
        let result = self.for_each_sink("write", |sink| sink.write(frame));
        if frame.frame_index > 0 && frame.frame_index % 100 == 0 {
            debug!(frames = frame.frame_index, "Dispatcher progress");
        }
        result
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        self.for_each_sink("flush", |sink| sink.flush())
    }

    #[instrument(name = "dispatcher_close", skip(self), fields(sinks = self.sinks.len()))]
    fn close(&mut self) -> Result<(), ContractError> {
        let result = self.for_each_sink("close", |sink| sink.close());
        info!("Dispatcher shutdown complete");
        result
    }
}

/// Create one sink from configuration
///
/// Sinks run behind a `QueuedSink` unless `params.queued = "false"`.
#[instrument(
    name = "dispatcher_build_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn build_sink(config: &SinkConfig) -> Result<Box<dyn FrameSink>, DispatcherError> {
    match config.sink_type {
        SinkType::Log => wrap(LogSink::new(&config.name), config),
        SinkType::Png => {
            let sink = PngSequenceSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            wrap(sink, config)
        }
    }
}

fn wrap<S: FrameSink + 'static>(
    sink: S,
    config: &SinkConfig,
) -> Result<Box<dyn FrameSink>, DispatcherError> {
    let queued = !matches!(config.params.get("queued").map(String::as_str), Some("false"));
    if queued {
        Ok(Box::new(QueuedSink::spawn(sink, config.queue_capacity)?))
    } else {
        Ok(Box::new(sink))
    }
}

/// Convenience function to create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs))]
pub fn create_dispatcher(sink_configs: &[SinkConfig]) -> Result<Dispatcher, DispatcherError> {
    let mut sinks = Vec::with_capacity(sink_configs.len());
    for config in sink_configs {
        sinks.push(build_sink(config)?);
    }
    info!(sinks = sinks.len(), "Dispatcher created");
    Ok(Dispatcher::new("dispatcher", sinks))
}
