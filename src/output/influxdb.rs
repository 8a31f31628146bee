//! InfluxDB line protocol output formatter.

use crate::measurement::Measurement;
use crate::output::OutputFormatter;
use std::collections::BTreeMap;
use std::fmt;
#[cfg(test)]
use std::time::Duration;
use std::time::SystemTime;

/// Field values for InfluxDB line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    #[allow(dead_code)] // Used in tests
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(num) => write!(f, "{num}"),
            FieldValue::String(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
    pub timestamp: Option<SystemTime>,
}

fn fmt_tags(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    for (key, value) in data_point.tag_set.iter() {
        write!(fmt, ",{}={}", key, value)?;
    }
    Ok(())
}

fn fmt_fields(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    let mut first = true;
    for (key, value) in data_point.field_set.iter() {
        if first {
            first = false;
        } else {
            write!(fmt, ",")?;
        }
        write!(fmt, "{}={}", key, value)?;
    }
    Ok(())
}

fn fmt_timestamp(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    if let Some(time) = data_point.timestamp {
        let nanos = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("Time went backwards")
            .as_nanos();
        write!(fmt, " {}", nanos)?;
    }
    Ok(())
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.measurement)?;
        fmt_tags(self, fmt)?;
        write!(fmt, " ")?;
        fmt_fields(self, fmt)?;
        fmt_timestamp(self, fmt)
    }
}

/// InfluxDB line protocol formatter.
///
/// Formats measurements according to the InfluxDB line protocol specification
/// with a configurable measurement name.
pub struct InfluxDbFormatter {
    /// The measurement name in InfluxDB
    measurement_name: String,
}

impl InfluxDbFormatter {
    /// Create a new InfluxDB formatter.
    ///
    /// # Arguments
    /// * `measurement_name` - The measurement name to use in the line protocol
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    /// Build the tag set for InfluxDB line protocol.
    ///
    /// Tags are the MAC address and the resolved display name.
    fn tag_set(&self, measurement: &Measurement, name: &str) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert("mac".to_string(), measurement.mac.to_string());
        tags.insert("name".to_string(), name.to_string());
        tags
    }

    /// Build the field set for InfluxDB line protocol.
    ///
    /// The v2 frame always carries temperature, gravity, acceleration and
    /// battery; velocity is omitted when absent.
    fn field_set(&self, m: &Measurement) -> BTreeMap<String, FieldValue> {
        let mut fields = BTreeMap::new();

        fields.insert("temperature".into(), FieldValue::Float(m.temperature));
        fields.insert("gravity".into(), FieldValue::Float(m.gravity));

        if let Some(velocity) = m.velocity {
            fields.insert("velocity".into(), FieldValue::Float(velocity));
        }

        let (x, y, z) = m.acceleration;
        fields.insert("acceleration_x".into(), FieldValue::Float(x));
        fields.insert("acceleration_y".into(), FieldValue::Float(y));
        fields.insert("acceleration_z".into(), FieldValue::Float(z));

        fields.insert("battery".into(), FieldValue::Float(m.battery));

        fields
    }

    fn to_data_point(&self, measurement: &Measurement, name: &str) -> DataPoint {
        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set: self.tag_set(measurement, name),
            field_set: self.field_set(measurement),
            timestamp: Some(measurement.timestamp),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(&self, measurement: &Measurement, name: &str) -> String {
        format!("{}", self.to_data_point(measurement, name))
    }
}
