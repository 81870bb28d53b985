use anyhow::{Result, anyhow};
use chrono::Local;
use std::{
    fmt,
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    Layer,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

const DIM: &str = "2";
const CYAN: &str = "36";

/// One line per event: local timestamp, level, crate, fields.
struct LineFormat;

fn paint(
    writer: &mut Writer<'_>,
    code: &str,
    text: impl fmt::Display,
) -> fmt::Result {
    if writer.has_ansi_escapes() {
        write!(writer, "\x1b[{code}m{text}\x1b[0m ")
    } else {
        write!(writer, "{text} ")
    }
}

fn level_code(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "1;31",
        Level::WARN => "1;33",
        Level::INFO => "1;32",
        Level::DEBUG => "1;34",
        Level::TRACE => "1;35",
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
        paint(&mut writer, DIM, stamp)?;
        paint(&mut writer, level_code(meta.level()), format_args!("{:>5}", meta.level()))?;
        let krate = meta.target().split("::").next().unwrap_or_default();
        paint(&mut writer, CYAN, krate)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

type SharedFile = Arc<Mutex<Option<File>>>;

/// Log file that can be opened after the subscriber is installed.
/// Writes before that are dropped.
#[derive(Clone)]
struct LateFile(SharedFile);

struct LateFileGuard<'a>(MutexGuard<'a, Option<File>>);

impl Write for LateFileGuard<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |f| f.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), File::flush)
    }
}

impl<'a> MakeWriter<'a> for LateFile {
    type Writer = LateFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LateFileGuard(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

type Reload = Box<dyn Fn(EnvFilter) -> Result<(), reload::Error> + Send + Sync>;

/// Runtime switches over the installed subscriber.
struct Controls {
    level: Reload,
    stderr: Reload,
    file: SharedFile,
}

static CONTROLS: OnceLock<Controls> = OnceLock::new();

fn controls() -> Result<&'static Controls> {
    CONTROLS
        .get()
        .ok_or_else(|| anyhow!("logging not yet initialized"))
}

fn reloader<S: 'static>(handle: reload::Handle<EnvFilter, S>) -> Reload {
    Box::new(move |filter| handle.reload(filter))
}

/// Replaces the global filter. Takes a bare level ("warn", "debug")
/// or a full EnvFilter directive such as "info,sqlx=warn".
pub fn set_log_level(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| anyhow!("invalid log level '{directive}': {e}"))?;
    (controls()?.level)(filter).map_err(|e| anyhow!("filter reload failed: {e}"))
}

/// Turns terminal output on or off. The log file is unaffected.
pub fn set_stderr_enabled(enabled: bool) -> Result<()> {
    let gate = EnvFilter::new(if enabled { "trace" } else { "off" });
    (controls()?.stderr)(gate).map_err(|e| anyhow!("stderr reload failed: {e}"))
}

/// Appends log output to `path` from now on. The parent directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("cannot open log file '{}': {e}", path.display()))?;
    *controls()?
        .file
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(file);
    Ok(())
}

/// Installs the global subscriber. Call once, before the config is read.
///
/// Terminal output goes to stderr so stdout only carries command output.
/// The level is `RUST_LOG` when set, otherwise `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let (level_layer, level_handle) = reload::Layer::new(filter);
    let (stderr_gate, stderr_handle) = reload::Layer::new(EnvFilter::new("trace"));
    let file: SharedFile = Arc::default();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(stderr_gate);
    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(LateFile(file.clone()));

    let installed = tracing_subscriber::registry()
        .with(level_layer)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    if installed.is_ok() {
        let _ = CONTROLS.set(Controls {
            level: reloader(level_handle),
            stderr: reloader(stderr_handle),
            file,
        });
    }
}

/// Applies the configured level, quiet flag and log file.
/// `RUST_LOG` keeps precedence over the configured level.
pub fn configure(
    level: &str,
    log_file: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        set_log_level(level)?;
    }
    if quiet {
        set_stderr_enabled(false)?;
    }
    if let Some(path) = log_file {
        enable_file_logging(path)?;
    }
    Ok(())
}
