//! Gauge registry shared between the publisher and the HTTP endpoint.

use std::fmt::Write;
use std::sync::Arc;

use parking_lot::RwLock;

/// One labeled value of a gauge family.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Label values, in the order of the family's label names.
    pub label_values: Vec<String>,
    pub value: f64,
}

/// A named gauge with a fixed set of label names.
///
/// A family without label names holds at most one sample, the plain gauge
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeFamily {
    name: &'static str,
    help: &'static str,
    label_names: &'static [&'static str],
    samples: Vec<Sample>,
}

impl GaugeFamily {
    /// Create a family with no samples.
    pub fn new(name: &'static str, help: &'static str, label_names: &'static [&'static str]) -> Self {
        Self {
            name,
            help,
            label_names,
            samples: Vec::new(),
        }
    }

    /// Create an unlabeled gauge holding `value`.
    pub fn gauge(name: &'static str, help: &'static str, value: f64) -> Self {
        let mut family = Self::new(name, help, &[]);
        family.set(Vec::new(), value);
        family
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    pub fn label_names(&self) -> &'static [&'static str] {
        self.label_names
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Set the value for a label set.
    ///
    /// A sample with identical label values is overwritten in place, so each
    /// label set appears once.
    pub fn set(&mut self, label_values: Vec<String>, value: f64) {
        debug_assert_eq!(
            label_values.len(),
            self.label_names.len(),
            "label cardinality mismatch for {}",
            self.name
        );

        match self.samples.iter_mut().find(|s| s.label_values == label_values) {
            Some(sample) => sample.value = value,
            None => self.samples.push(Sample {
                label_values,
                value,
            }),
        }
    }

    /// Look up the value for a label set.
    pub fn get(&self, label_values: &[&str]) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.label_values.iter().map(String::as_str).eq(label_values.iter().copied()))
            .map(|s| s.value)
    }

    /// Append this family in Prometheus exposition format.
    fn render_into(&self, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", self.name, self.help);
        let _ = writeln!(out, "# TYPE {} gauge", self.name);

        for sample in &self.samples {
            out.push_str(self.name);
            if !self.label_names.is_empty() {
                out.push('{');
                for (i, (name, value)) in self.label_names.iter().zip(&sample.label_values).enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{}=\"{}\"", name, escape_label_value(value));
                }
                out.push('}');
            }
            let _ = writeln!(out, " {}", format_value(sample.value));
        }
    }
}

/// Thread-safe collection of gauge families.
///
/// Cloning yields another handle to the same families. Writers replace the
/// whole family set at once, so a reader never sees half of an update.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    families: Arc<RwLock<Vec<GaugeFamily>>>,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new set of families, dropping all previous ones.
    pub fn replace_all(&self, families: Vec<GaugeFamily>) {
        *self.families.write() = families;
    }

    /// Get a copy of a family by name.
    pub fn family(&self, name: &str) -> Option<GaugeFamily> {
        self.families.read().iter().find(|f| f.name == name).cloned()
    }

    /// Look up a single value by metric name and label values.
    pub fn value(&self, name: &str, label_values: &[&str]) -> Option<f64> {
        self.families
            .read()
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.get(label_values))
    }

    /// Names of the registered families, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.families.read().iter().map(|f| f.name).collect()
    }

    /// Render all families in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let families = self.families.read();
        let mut out = String::new();
        for family in families.iter() {
            family.render_into(&mut out);
        }
        out
    }
}

/// Escape a label value for Prometheus format.
/// Backslash, double-quote, and newline must be escaped.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
