use anyhow::{Context, Result, bail};
use clap::Parser;
use core_display::{DisplaySink, RecordingSink, WriterSink};
use core_events::{
    EVENT_CHANNEL_CAP, Event, EventSourceRegistry, ScriptEventSource, StdinEventSource, parse_script,
};
use core_runtime::{CapsuleRuntime, RuntimeSettings, simulate};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "capsulyric",
    version,
    about = "Adaptive lyric marquee for notification capsules"
)]
struct Args {
    /// Timed event script. Without it, script lines are read from stdin as they arrive.
    pub script: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `capsulyric.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Replay the script on a virtual clock and print every frame immediately.
    #[arg(long)]
    pub simulate: bool,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn run(&mut self, args: &Args) -> Result<RuntimeSettings> {
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        let config = core_config::load_from(args.config.clone())?;
        let settings = RuntimeSettings::from_config(&config.effective)?;

        let config_path = config.path.as_ref().map(|p| p.display().to_string());
        let script_path = args.script.as_ref().map(|p| p.display().to_string());
        info!(
            target: "runtime.startup",
            config_path = config_path.as_deref(),
            config_override = args.config.is_some(),
            script = script_path.as_deref(),
            simulate = args.simulate,
            max_display_weight = settings.layout.max_display_weight,
            whitelisted = settings.whitelist.entries().len(),
            "bootstrap_complete"
        );
        Ok(settings)
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("capsulyric.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "capsulyric.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    StopEvent,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::StopEvent => "stop_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drive `runtime` from `rx` in real time until a stop event or until every
/// producer has gone away. The tick is re-armed with `sleep_until` from the
/// deadline the runtime hands back.
async fn run_live<S: DisplaySink>(
    runtime: &mut CapsuleRuntime<S>,
    rx: &mut mpsc::Receiver<Event>,
) -> ShutdownReason {
    let loop_span = tracing::debug_span!(target: "runtime", "event_loop");
    let _enter_loop = loop_span.enter();

    let clock = Instant::now();
    let now_ms = || clock.elapsed().as_millis() as u64;
    let mut deadline: Option<Instant> = None;

    loop {
        let due = deadline;
        let sleep = async move {
            match due {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            ev = rx.recv() => {
                let Some(ev) = ev else {
                    return ShutdownReason::ChannelClosed;
                };
                let stop = matches!(ev, Event::Shutdown);
                if let Some(next) = runtime.handle(ev, now_ms()) {
                    deadline = Some(clock + Duration::from_millis(next));
                }
                if !runtime.is_ticking() {
                    deadline = None;
                }
                if stop {
                    return ShutdownReason::StopEvent;
                }
            }
            _ = sleep => {
                let next = runtime.tick(now_ms());
                trace!(target: "runtime", next_ms = next, "tick_rearmed");
                deadline = Some(clock + Duration::from_millis(next));
            }
        }
    }
}

async fn finalize_shutdown(
    reason: ShutdownReason,
    rx: mpsc::Receiver<Event>,
    handles: Vec<tokio::task::JoinHandle<()>>,
) {
    info!(target: "runtime.shutdown", reason = %reason, stage = "begin", "shutdown_stage");
    drop(rx);
    for mut handle in handles {
        match tokio::time::timeout(Duration::from_millis(200), &mut handle).await {
            Ok(Ok(_)) => trace!(target: "runtime.shutdown", "event_source_task_stopped"),
            Ok(Err(err)) if err.is_cancelled() => {
                trace!(target: "runtime.shutdown", "event_source_task_cancelled")
            }
            Ok(Err(err)) => error!(target: "runtime.shutdown", ?err, "event_source_task_error"),
            Err(_) => {
                warn!(target: "runtime.shutdown", "event_source_task_timeout");
                handle.abort();
            }
        }
    }
    info!(target: "runtime.shutdown", reason = %reason, stage = "complete", "shutdown_stage");
}

fn run_simulation(settings: RuntimeSettings, script: &Path) -> Result<()> {
    let content = std::fs::read_to_string(script)
        .with_context(|| format!("reading script {}", script.display()))?;
    let events =
        parse_script(&content).with_context(|| format!("parsing script {}", script.display()))?;
    let mut runtime = CapsuleRuntime::new(settings, RecordingSink::new());
    let frames = simulate(&events, &mut runtime);

    let mut stdout = std::io::stdout();
    let mut sink = WriterSink::new(std::io::stdout());
    for published in &frames {
        write!(stdout, "{:>8}ms  ", published.at_ms)?;
        stdout.flush()?;
        sink.publish(&published.frame)?;
    }
    info!(target: "runtime", frames = frames.len(), "simulation_printed");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    let settings = startup.run(&args)?;

    if args.simulate {
        let Some(script) = args.script.as_deref() else {
            bail!("--simulate needs a script path");
        };
        return run_simulation(settings, script);
    }

    let (tx, mut rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    match args.script.as_deref() {
        Some(path) => registry.register(ScriptEventSource::from_path(path)?),
        None => registry.register(StdinEventSource::new()),
    }
    let handles = registry.spawn_all(&tx);
    drop(tx);

    let mut runtime = CapsuleRuntime::new(settings, WriterSink::new(std::io::stdout()));
    let reason = run_live(&mut runtime, &mut rx).await;
    finalize_shutdown(reason, rx, handles).await;

    let metrics = runtime.publisher().metrics_snapshot();
    info!(
        target: "runtime",
        published = metrics.published,
        unchanged = metrics.unchanged,
        throttled = metrics.throttled,
        failed = metrics.failed,
        "publish_metrics"
    );
    Ok(())
}
