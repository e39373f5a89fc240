//! Decode and dispatch as a producer/consumer pair
//!
//! The decoder runs on a blocking thread and hands objects over an
//! unbounded channel; the dispatcher consumes them in document order on
//! the calling task. Both sides watch the same cancellation token.

use chartify_core::Config;
use std::io::Read;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::context::{ChartOutput, Context};
use crate::decoder;
use crate::error::{ConvertError, Result};
use crate::object::Object;

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every document was transformed
    Completed(ChartOutput),
    /// The token was cancelled; nothing was produced
    Cancelled,
}

impl RunOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Convert a manifest stream into a chart
pub async fn run<R>(input: R, config: Config, token: CancellationToken) -> Result<RunOutcome>
where
    R: Read + Send + 'static,
{
    let span = tracing::info_span!("convert", chart = %config.chart_name);
    let mut context = Context::new(config, span)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Result<Object>>();
    let producer_token = token.clone();
    let producer =
        tokio::task::spawn_blocking(move || decoder::produce(input, &tx, &producer_token));

    loop {
        if token.is_cancelled() {
            return Ok(cancelled(&mut context, &mut rx));
        }

        let received = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            item = rx.recv() => Some(item),
        };
        let Some(item) = received else {
            return Ok(cancelled(&mut context, &mut rx));
        };

        match item {
            Some(Ok(obj)) => context.submit(obj),
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }

    let sent = producer
        .await
        .map_err(|e| ConvertError::Internal(e.to_string()))?;
    tracing::debug!(sent, "decoder finished");

    Ok(RunOutcome::Completed(context.finalize()?))
}

/// Take in what was already handed off, then discard the run
fn cancelled(
    context: &mut Context,
    rx: &mut mpsc::UnboundedReceiver<Result<Object>>,
) -> RunOutcome {
    rx.close();
    while let Ok(item) = rx.try_recv() {
        match item {
            Ok(obj) => context.submit(obj),
            Err(_) => break,
        }
    }
    tracing::warn!(objects = context.len(), "conversion cancelled, discarding output");
    RunOutcome::Cancelled
}
