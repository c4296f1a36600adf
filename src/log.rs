// Diagnostic logger, powered by tracing-subscriber.
//
// The logger owns its own `Dispatch` instead of installing a global
// subscriber, so each store logs through whatever it was handed and
// libraries embedding rowbind keep control of their own tracing setup.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogFormat, LogSettings};

/// Error building a logger.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Invalid tracing filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
}

/// Injected diagnostic sink.
#[derive(Clone)]
pub struct Logger {
    dispatch: Option<Dispatch>,
}

impl Logger {
    /// Logger writing to stderr as configured.
    pub fn from_settings(settings: &LogSettings) -> Result<Self, LogError> {
        Self::with_writer(settings, std::io::stderr)
    }

    /// Logger writing to `writer` as configured.
    pub fn with_writer<W>(settings: &LogSettings, writer: W) -> Result<Self, LogError>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_new(&settings.level).map_err(|e| LogError::InvalidFilter {
            filter: settings.level.clone(),
            reason: e.to_string(),
        })?;

        let layer = tracing_subscriber::fmt::layer()
            .event_format(EventFormat {
                format: settings.format,
                fields: settings.fields.clone(),
            })
            .with_writer(writer)
            .with_filter(filter);

        let subscriber = tracing_subscriber::registry().with(layer);
        Ok(Self {
            dispatch: Some(Dispatch::new(subscriber)),
        })
    }

    /// Logger that discards everything.
    pub fn disabled() -> Self {
        Self { dispatch: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.dispatch.is_some()
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::DEBUG, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::INFO, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::WARN, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::ERROR, args);
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let Some(dispatch) = &self.dispatch else {
            return;
        };
        tracing::dispatcher::with_default(dispatch, || {
            if level == Level::ERROR {
                tracing::error!(target: "rowbind", "{}", args);
            } else if level == Level::WARN {
                tracing::warn!(target: "rowbind", "{}", args);
            } else if level == Level::INFO {
                tracing::info!(target: "rowbind", "{}", args);
            } else {
                tracing::debug!(target: "rowbind", "{}", args);
            }
        });
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Renders one event per line, with the configured static fields next to the
/// event's own.
struct EventFormat {
    format: LogFormat,
    fields: BTreeMap<String, String>,
}

impl<S, N> FormatEvent<S, N> for EventFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields: Map<String, JsonValue> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect();
        event.record(&mut FieldCollector(&mut fields));

        let meta = event.metadata();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        match self.format {
            LogFormat::Json => {
                let line = serde_json::json!({
                    "timestamp": timestamp,
                    "level": meta.level().to_string(),
                    "target": meta.target(),
                    "fields": fields,
                });
                writeln!(writer, "{}", line)
            }
            LogFormat::Text => {
                let message = fields.remove("message");
                write!(writer, "{} {:>5} {}:", timestamp, meta.level(), meta.target())?;
                if let Some(JsonValue::String(message)) = message {
                    write!(writer, " {}", message)?;
                }
                for (key, value) in &fields {
                    match value {
                        JsonValue::String(s) => write!(writer, " {}={}", key, s)?,
                        other => write!(writer, " {}={}", key, other)?,
                    }
                }
                writeln!(writer)
            }
        }
    }
}

struct FieldCollector<'a>(&'a mut Map<String, JsonValue>);

impl Visit for FieldCollector<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().into(), value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().into(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().into(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().into(), value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().into(), format!("{:?}", value).into());
    }
}
