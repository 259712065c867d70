//! Supervises a daemon run from topic resolution to queue teardown.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use aws_config::BehaviorVersion;
use camino::Utf8Path;
use s3watch_config::{Config, ConfigError, QUEUE_NAME_PREFIX, UsageRequest};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::dispatch::{ItemDispatcher, RecordDispatcher};
use crate::handler::HandlerInvoker;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::poll::{PollLoop, PollSchedule, PollStats};
use crate::queue::{AwsQueueBackend, Queue, QueueBackend, TransportError, delete_queue_at};
use crate::shutdown::{ShutdownNotice, SignalListener, shutdown_channel};
use crate::telemetry;
use crate::topic::{S3TopicLookup, TopicLookup, resolve_topic};

use super::errors::LaunchError;
use super::{EXIT_FATAL, EXIT_SIGNALLED, PROCESS_TARGET};

/// Collaborators the launcher drives.
pub struct Services {
    /// Queue and subscription operations.
    pub queues: Arc<dyn QueueBackend>,
    /// Bucket notification lookup used when no topic is configured.
    pub topics: Arc<dyn TopicLookup>,
    /// Lifecycle observer.
    pub reporter: Arc<dyn HealthReporter>,
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Termination {
    /// Signal that ended the run.
    pub signal: i32,
}

impl Termination {
    /// Process exit status for a signal-driven shutdown.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        EXIT_SIGNALLED
    }
}

/// Runs the daemon using the production collaborators and maps the outcome
/// onto the process exit status.
///
/// `--help` and `--version` print their text and exit successfully without
/// touching telemetry or AWS.
pub async fn run_daemon() -> ExitCode {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    let outcome = match Config::load_validated() {
        Ok(config) => launch(&config, Arc::clone(&reporter)).await,
        Err(ConfigError::Usage(request)) => return print_usage(&request),
        Err(error) => report_config_failure(error),
    };
    match outcome {
        Ok(termination) => {
            info!(
                target: PROCESS_TARGET,
                signal = termination.signal,
                "shutdown sequence completed"
            );
            ExitCode::from(termination.exit_code())
        }
        Err(error) => {
            reporter.launch_failed(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

fn print_usage(request: &UsageRequest) -> ExitCode {
    match request.print() {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(EXIT_FATAL),
    }
}

fn report_config_failure(error: ConfigError) -> Result<Termination, LaunchError> {
    // Default telemetry so the configuration failure is still reported.
    telemetry::initialise(&Config::default())?;
    Err(error.into())
}

async fn launch(
    config: &Config,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Termination, LaunchError> {
    let telemetry = telemetry::initialise(config)?;
    info!(
        target: PROCESS_TARGET,
        log_format = %telemetry.format(),
        "telemetry installed"
    );

    let sdk = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let services = Services {
        queues: Arc::new(AwsQueueBackend::new(&sdk)),
        topics: Arc::new(S3TopicLookup::new(&sdk)),
        reporter,
    };

    let (trigger, notice) = shutdown_channel();
    let listener = SignalListener::install(trigger)?;
    let outcome = run_daemon_with(config, services, notice).await;
    listener.close().await;
    outcome
}

/// Runs the daemon with injected collaborators until `shutdown` fires or a
/// fatal error occurs.
///
/// Once the queue exists it is deleted exactly once, whichever way the run
/// ends.
///
/// # Errors
///
/// Returns a [`LaunchError`] when the topic cannot be resolved, the queue
/// cannot be provisioned, a receive call fails, or the queue cannot be
/// deleted. A teardown failure takes precedence over a receive failure.
pub async fn run_daemon_with(
    config: &Config,
    services: Services,
    shutdown: ShutdownNotice,
) -> Result<Termination, LaunchError> {
    let run_id = Uuid::new_v4().simple().to_string();
    let span = info_span!(
        target: PROCESS_TARGET,
        "run",
        run_id = %run_id,
        bucket = config.bucket()
    );
    let name = queue_name(&run_id);
    supervise_run(config, services, shutdown, &name)
        .instrument(span)
        .await
}

async fn supervise_run(
    config: &Config,
    services: Services,
    shutdown: ShutdownNotice,
    queue_name: &str,
) -> Result<Termination, LaunchError> {
    let Services {
        queues,
        topics,
        reporter,
    } = services;
    info!(
        target: PROCESS_TARGET,
        bucket = config.bucket(),
        handler = config.handler().map(Utf8Path::as_str),
        "starting daemon run"
    );

    let topic = resolve_topic(config.bucket(), config.topic(), topics.as_ref()).await?;
    reporter.topic_resolved(config.bucket(), &topic);

    if let Some(signal) = shutdown.signal() {
        reporter.shutdown_requested(signal);
        return Ok(Termination { signal });
    }

    let queue = provision(queues, queue_name, &topic).await?;
    reporter.queue_created(&queue);

    let dispatcher = RecordDispatcher::new(
        config.handler().map(HandlerInvoker::new),
        shutdown.clone(),
    );
    let poll = PollLoop::new(
        PollSchedule::new(config.poll_interval()),
        config.delete_policy(),
        dispatcher,
    );
    reporter.polling_started(config.poll_interval(), config.delete_policy());
    let polled = supervise(
        &poll,
        &queue,
        shutdown,
        config.shutdown_grace(),
        reporter.as_ref(),
    )
    .await;

    let name = queue.name().to_owned();
    if let Err(source) = queue.delete().await {
        if let Err(poll_error) = &polled {
            error!(
                target: PROCESS_TARGET,
                error = %poll_error,
                "poll loop failed before teardown"
            );
        }
        return Err(LaunchError::Teardown { source });
    }
    reporter.queue_deleted(&name);

    let signal = polled?;
    Ok(Termination { signal })
}

fn queue_name(run_id: &str) -> String {
    format!("{QUEUE_NAME_PREFIX}-{run_id}")
}

async fn provision(
    backend: Arc<dyn QueueBackend>,
    name: &str,
    topic: &str,
) -> Result<Queue, LaunchError> {
    match Queue::create(Arc::clone(&backend), name, topic).await {
        Ok(queue) => Ok(queue),
        Err(source) => {
            if let Some(url) = source.orphaned_queue_url() {
                match delete_queue_at(backend.as_ref(), url).await {
                    Ok(()) => info!(
                        target: PROCESS_TARGET,
                        queue = name,
                        "deleted queue left behind by the failed subscription"
                    ),
                    Err(cleanup) => warn!(
                        target: PROCESS_TARGET,
                        queue = name,
                        error = %cleanup,
                        "failed to delete queue left behind by the failed subscription"
                    ),
                }
            }
            Err(LaunchError::Provisioning { source })
        }
    }
}

/// Runs the poll loop and, once shutdown is requested, gives it `grace` to
/// stop. An in-flight handler still running after that is killed.
async fn supervise<D>(
    poll: &PollLoop<D>,
    queue: &Queue,
    shutdown: ShutdownNotice,
    grace: Duration,
    reporter: &dyn HealthReporter,
) -> Result<i32, TransportError>
where
    D: ItemDispatcher,
{
    let mut notice = shutdown.clone();
    let run = poll.run(queue, shutdown);
    tokio::pin!(run);

    tokio::select! {
        biased;
        signal = notice.requested() => {
            reporter.shutdown_requested(signal);
            match tokio::time::timeout(grace, &mut run).await {
                Ok(result) => {
                    log_summary(&result?);
                    Ok(signal)
                }
                Err(_elapsed) => {
                    warn!(
                        target: PROCESS_TARGET,
                        signal,
                        ?grace,
                        "poll loop did not stop within the grace period; killing the handler"
                    );
                    Ok(signal)
                }
            }
        }
        result = &mut run => {
            let stats = result?;
            reporter.shutdown_requested(stats.stopped_by);
            log_summary(&stats);
            Ok(stats.stopped_by)
        }
    }
}

fn log_summary(stats: &PollStats) {
    info!(
        target: PROCESS_TARGET,
        ticks = stats.ticks,
        received = stats.received,
        malformed = stats.malformed,
        records = stats.records,
        handler_failures = stats.handler_failures,
        dropped_records = stats.dropped_records,
        delete_failures = stats.delete_failures,
        "poll loop summary"
    );
}
