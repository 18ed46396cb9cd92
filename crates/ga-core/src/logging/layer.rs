//! Tracing layer that writes one JSON object per event.
//!
//! Output shape:
//! `{"ts", "level", "event", "run_id"?, "dataset_id"?, "stage"?, "message"?, "fields"?}`
//! where `event` is the tracing target and `fields` holds every other
//! recorded field. Correlation IDs come from the event itself or, failing
//! that, from the innermost enclosing span that carries them.

use std::io::Write;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

const CORRELATION_KEYS: [&str; 3] = ["run_id", "dataset_id", "stage"];

/// Correlation IDs attached to a span.
#[derive(Debug, Clone, Default, PartialEq)]
struct Correlation {
    run_id: Option<String>,
    dataset_id: Option<String>,
    stage: Option<String>,
}

impl Correlation {
    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "run_id" => Some(&mut self.run_id),
            "dataset_id" => Some(&mut self.dataset_id),
            "stage" => Some(&mut self.stage),
            _ => None,
        }
    }

    /// Move correlation keys out of `fields`.
    fn take_from(fields: &mut Map<String, Value>) -> Self {
        let mut correlation = Correlation::default();
        for key in CORRELATION_KEYS {
            if let Some(Value::String(v)) = fields.remove(key) {
                if let Some(slot) = correlation.slot(key) {
                    *slot = Some(v);
                }
            }
        }
        correlation
    }

    /// Fill unset IDs from `outer`.
    fn inherit(&mut self, outer: &Correlation) {
        if self.run_id.is_none() {
            self.run_id.clone_from(&outer.run_id);
        }
        if self.dataset_id.is_none() {
            self.dataset_id.clone_from(&outer.dataset_id);
        }
        if self.stage.is_none() {
            self.stage.clone_from(&outer.stage);
        }
    }
}

/// Records span or event fields as JSON values.
#[derive(Default)]
struct FieldVisitor {
    fields: Map<String, Value>,
    message: Option<String>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `%value` fields arrive here as Display wrappers, so no extra quotes
        let s = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(s);
        } else {
            self.insert(field, Value::String(s));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON number form
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.insert(field, Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }
}

/// JSONL tracing layer over any writer (stderr in the CLI).
pub struct JsonlLayer<W> {
    writer: Mutex<W>,
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

fn render(level: &tracing::Level, target: &str, visitor: FieldVisitor, ids: Correlation) -> Value {
    let mut obj = Map::new();
    obj.insert("ts".into(), Value::String(Utc::now().to_rfc3339()));
    obj.insert("level".into(), Value::String(level.as_str().to_lowercase()));
    obj.insert("event".into(), Value::String(target.to_string()));
    for (key, value) in [
        ("run_id", ids.run_id),
        ("dataset_id", ids.dataset_id),
        ("stage", ids.stage),
        ("message", visitor.message),
    ] {
        if let Some(v) = value {
            obj.insert(key.into(), Value::String(v));
        }
    }
    if !visitor.fields.is_empty() {
        obj.insert("fields".into(), Value::Object(visitor.fields));
    }
    Value::Object(obj)
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        let correlation = Correlation::take_from(&mut visitor.fields);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(correlation);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let mut ids = Correlation::take_from(&mut visitor.fields);

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(outer) = span.extensions().get::<Correlation>() {
                    ids.inherit(outer);
                }
            }
        }

        let meta = event.metadata();
        let line = render(meta.level(), meta.target(), visitor, ids);
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}
