//! Plot layouts: a declarative set of axes and signals a producer registers up front.
//!
//! ```toml
//! [[axes]]
//! id = 1
//! title = "Accelerometer"
//! x_label = "Time (samples)"
//! y_label = "Acceleration (m/s^2)"
//! samples = 300
//!
//! [[axes.signals]]
//! id = 10
//! name = "Accel X"
//! color = "r"
//! ```
//!
//! The `configure` subcommand uploads a layout with [`crate::grpc::PlotClient::apply_layout`];
//! `simulate` streams synthetic samples for every signal it declares.

use crate::data::registry::{AxisId, AxisSpec, SignalId, SignalSpec};
use crate::error::{PlotError, PlotResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

fn default_samples() -> i32 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalLayout {
    pub id: SignalId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisLayout {
    pub id: AxisId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub x_label: String,
    #[serde(default)]
    pub y_label: String,
    #[serde(default = "default_samples")]
    pub samples: i32,
    #[serde(default)]
    pub signals: Vec<SignalLayout>,
}

impl AxisLayout {
    pub fn axis_spec(&self) -> AxisSpec {
        AxisSpec {
            id: self.id,
            samples: i64::from(self.samples),
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
        }
    }

    pub fn signal_specs(&self) -> impl Iterator<Item = SignalSpec> + '_ {
        self.signals.iter().map(move |s| SignalSpec {
            axis_id: self.id,
            signal_id: s.id,
            name: s.name.clone(),
            color: s.color.clone(),
        })
    }
}

/// Axes and signals to register, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub axes: Vec<AxisLayout>,
}

impl Layout {
    /// Reads and validates a TOML layout file.
    pub fn load<P: AsRef<Path>>(path: P) -> PlotResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        text.parse()
    }

    /// Rejects layouts that reuse an axis id or a signal id.
    pub fn validate(&self) -> PlotResult<()> {
        let mut axes = HashSet::new();
        let mut signals = HashSet::new();
        for axis in &self.axes {
            if !axes.insert(axis.id) {
                return Err(PlotError::Configuration(format!(
                    "axis id {} declared twice",
                    axis.id
                )));
            }
            for signal in &axis.signals {
                if !signals.insert(signal.id) {
                    return Err(PlotError::Configuration(format!(
                        "signal id {} declared twice",
                        signal.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Every signal id in declaration order.
    pub fn signal_ids(&self) -> Vec<SignalId> {
        self.axes
            .iter()
            .flat_map(|a| a.signals.iter().map(|s| s.id))
            .collect()
    }

    pub fn signal_count(&self) -> usize {
        self.axes.iter().map(|a| a.signals.len()).sum()
    }
}

impl std::str::FromStr for Layout {
    type Err = PlotError;

    fn from_str(s: &str) -> PlotResult<Self> {
        let layout: Layout = toml::from_str(s)?;
        layout.validate()?;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_AXES: &str = r#"
[[axes]]
id = 1
title = "Accelerometer"
samples = 300

[[axes.signals]]
id = 10
name = "Accel X"
color = "r"

[[axes.signals]]
id = 11

[[axes]]
id = 2
title = "Gyroscope"
"#;

    #[test]
    fn parses_axes_and_signals() {
        let layout: Layout = TWO_AXES.parse().unwrap();
        assert_eq!(layout.axes.len(), 2);
        assert_eq!(layout.signal_ids(), vec![10, 11]);
        assert_eq!(layout.signal_count(), 2);

        let accel = &layout.axes[0];
        assert_eq!(accel.axis_spec().samples, 300);
        let specs: Vec<_> = accel.signal_specs().collect();
        assert_eq!(specs[0].axis_id, 1);
        assert_eq!(specs[0].color.as_deref(), Some("r"));
        assert_eq!(specs[1].color, None);
        assert!(specs[1].name.is_empty());

        assert_eq!(layout.axes[1].samples, 100);
        assert!(layout.axes[1].signals.is_empty());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let dup_signal = r#"
[[axes]]
id = 1
[[axes.signals]]
id = 10
[[axes]]
id = 2
[[axes.signals]]
id = 10
"#;
        assert!(matches!(
            dup_signal.parse::<Layout>(),
            Err(PlotError::Configuration(_))
        ));

        let dup_axis = "[[axes]]\nid = 1\n[[axes]]\nid = 1\n";
        assert!(dup_axis.parse::<Layout>().is_err());
    }

    #[test]
    fn malformed_toml_is_a_layout_error() {
        assert!(matches!(
            "[[axes]]\nid = \"one\"\n".parse::<Layout>(),
            Err(PlotError::Layout(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_AXES.as_bytes()).unwrap();
        let layout = Layout::load(file.path()).unwrap();
        assert_eq!(layout.axes[0].title, "Accelerometer");

        assert!(matches!(
            Layout::load("/nonexistent/layout.toml"),
            Err(PlotError::Io(_))
        ));
    }

    #[test]
    fn bundled_imu_layout_is_valid() {
        let layout = Layout::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/imu.toml")).unwrap();
        assert_eq!(layout.signal_ids(), vec![10, 11, 12, 20, 21, 22]);
        assert!(layout.axes.iter().all(|a| a.samples == 300));
    }
}
