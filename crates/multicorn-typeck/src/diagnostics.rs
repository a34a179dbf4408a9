//! Ariadne-based diagnostic rendering for type errors.
//!
//! A request has no source text of its own, so diagnostics are rendered
//! against its printed s-expression (see [`multicorn_requests::printer`]),
//! with the offending node's span taken from the printer's span table.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use multicorn_requests::printer::{print, Printed};
use multicorn_requests::{NodePath, Request};

use crate::error::TypeError;

/// How diagnostics are emitted.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiagnosticOptions {
    pub color: bool,
    /// One JSON object per diagnostic instead of an ariadne report.
    pub json: bool,
}

impl DiagnosticOptions {
    pub fn colorless() -> Self {
        DiagnosticOptions {
            color: false,
            json: false,
        }
    }
}

// ── Error Codes ────────────────────────────────────────────────────────

pub fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::UnresolvedKind { .. } => "E0001",
        TypeError::UnknownField { .. } => "E0002",
        TypeError::ContextUnderflow { .. } => "E0003",
        TypeError::MalformedOperands { .. } => "E0004",
    }
}

// ── Labels ─────────────────────────────────────────────────────────────

struct Annotation {
    label: String,
    help: Option<String>,
    /// A secondary span with its label.
    related: Option<(NodePath, String)>,
}

fn annotate(error: &TypeError) -> Annotation {
    match error {
        TypeError::UnresolvedKind { kind, .. } => Annotation {
            label: format!("no rule registered for `{}` or its fallback kinds", kind),
            help: Some(format!(
                "register a rule for `{}`, or declare it with a fallback kind that has one",
                kind
            )),
            related: None,
        },
        TypeError::UnknownField {
            field,
            record,
            path,
        } => {
            let available: Vec<&str> = record
                .fields()
                .map(|fields| fields.keys().map(String::as_str).collect())
                .unwrap_or_default();
            Annotation {
                label: format!("no field `{}`", field),
                help: (!available.is_empty())
                    .then(|| format!("available fields: {}", available.join(", "))),
                related: Some((path.child(0), format!("this has type `{}`", record))),
            }
        }
        TypeError::ContextUnderflow {
            depth, available, ..
        } => Annotation {
            label: format!("refers to enclosing scope {}", depth),
            help: Some(if *available == 0 {
                "context references are only valid inside `map` or `groupby`".to_string()
            } else {
                format!("valid depths here are 1 to {}", available)
            }),
            related: None,
        },
        TypeError::MalformedOperands { reason, .. } => Annotation {
            label: reason.clone(),
            help: None,
            related: None,
        },
    }
}

/// The span of `path` in the printed request, clamped to a non-empty range
/// inside the text.
fn node_span(printed: &Printed, path: &NodePath) -> Range<usize> {
    let len = printed.text.len();
    let span = printed.span(path).unwrap_or(0..len);
    let start = span.start.min(len);
    let end = span.end.min(len).max(start);
    if start == end {
        start..(end + 1).min(len)
    } else {
        start..end
    }
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Render a type error raised for `request`.
///
/// With `options.json` the result is a single-line JSON object; otherwise
/// an ariadne report over the printed request.
pub fn render_diagnostic(
    error: &TypeError,
    request: &Request,
    filename: &str,
    options: &DiagnosticOptions,
) -> String {
    let printed = print(request);
    let annotation = annotate(error);
    let span = node_span(&printed, error.path());
    let code = error_code(error);

    if options.json {
        let mut spans = vec![serde_json::json!({
            "start": span.start,
            "end": span.end,
            "label": annotation.label,
        })];
        if let Some((path, label)) = &annotation.related {
            let related = node_span(&printed, path);
            spans.push(serde_json::json!({
                "start": related.start,
                "end": related.end,
                "label": label,
            }));
        }
        return serde_json::json!({
            "code": code,
            "severity": "error",
            "message": error.to_string(),
            "file": filename,
            "path": error.path().to_string(),
            "request": printed.text,
            "spans": spans,
            "fix": annotation.help,
        })
        .to_string();
    }

    let config = if options.color {
        Config::default()
    } else {
        Config::default().with_color(false)
    };

    let mut builder = Report::build(ReportKind::Error, span.clone())
        .with_code(code)
        .with_message(error.to_string())
        .with_config(config)
        .with_label(
            Label::new(span)
                .with_message(&annotation.label)
                .with_color(Color::Red),
        );
    if let Some((path, label)) = &annotation.related {
        builder = builder.with_label(
            Label::new(node_span(&printed, path))
                .with_message(label)
                .with_color(Color::Blue),
        );
    }
    if let Some(help) = &annotation.help {
        builder = builder.with_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    if report.write(Source::from(printed.text.as_str()), &mut buf).is_err() {
        return format!("error[{}]: {}", code, error);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
