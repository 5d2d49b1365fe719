//! Time-series accumulator: independent id/timestamp/value setters form one
//! sample; samples sharing (timestamp, object id, value kind) merge into one
//! record with parallel stream/value arrays.

use hashbrown::HashMap;
use log::warn;

use super::validate_stream_matches_metadata;
use crate::data::{Metadata, TimeSeriesState, TimeSeriesValues};
use crate::types::Category;

/// One observed value, tagged by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum TimeSeriesValue {
    String(String),
    Bool(bool),
    Int32(i32),
    Double(f64),
}

impl TimeSeriesValue {
    /// Wire field name of the parallel array this value lands in. Also the
    /// grouping key component, so mixed kinds never share a record.
    fn field_name(&self) -> &'static str {
        match self {
            TimeSeriesValue::String(_) => "strings",
            TimeSeriesValue::Bool(_) => "bools",
            TimeSeriesValue::Int32(_) => "int32s",
            TimeSeriesValue::Double(_) => "doubles",
        }
    }
}

impl From<&str> for TimeSeriesValue {
    fn from(v: &str) -> Self {
        TimeSeriesValue::String(v.to_string())
    }
}

impl From<String> for TimeSeriesValue {
    fn from(v: String) -> Self {
        TimeSeriesValue::String(v)
    }
}

impl From<bool> for TimeSeriesValue {
    fn from(v: bool) -> Self {
        TimeSeriesValue::Bool(v)
    }
}

impl From<i32> for TimeSeriesValue {
    fn from(v: i32) -> Self {
        TimeSeriesValue::Int32(v)
    }
}

impl From<f64> for TimeSeriesValue {
    fn from(v: f64) -> Self {
        TimeSeriesValue::Double(v)
    }
}

/// Grouping key: timestamp bits keep f64 usable in a hash map; the stored
/// group carries the original value for output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SampleKey {
    timestamp_bits: u64,
    object_id: String,
    field: &'static str,
}

#[derive(Clone, Debug)]
struct SampleGroup {
    timestamp: f64,
    streams: Vec<String>,
    values: Vec<TimeSeriesValue>,
}

#[derive(Clone, Debug)]
pub struct TimeSeriesBuilder {
    metadata: Metadata,
    stream_id: String,
    id: Option<String>,
    value: Option<TimeSeriesValue>,
    timestamp: Option<f64>,
    data: HashMap<SampleKey, SampleGroup>,
}

impl TimeSeriesBuilder {
    pub fn new(metadata: Metadata) -> Self {
        TimeSeriesBuilder {
            metadata,
            stream_id: String::new(),
            id: None,
            value: None,
            timestamp: None,
            data: HashMap::new(),
        }
    }

    /// Flush the pending sample, then report through `stream_id`.
    pub fn stream(&mut self, stream_id: impl Into<String>) -> &mut Self {
        if !self.stream_id.is_empty() {
            self.flush();
        }
        self.stream_id = stream_id.into();
        self
    }

    pub fn id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = Some(id.into());
        self
    }

    pub fn value(&mut self, value: impl Into<TimeSeriesValue>) -> &mut Self {
        self.value = Some(value.into());
        self
    }

    pub fn timestamp(&mut self, timestamp: f64) -> &mut Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// A sample only commits once id, timestamp and value are all set.
    pub fn is_data_pending(&self) -> bool {
        self.id.is_some() && self.timestamp.is_some() && self.value.is_some()
    }

    /// Commit the pending sample if complete; a partial sample is silently
    /// dropped either way.
    fn flush(&mut self) {
        if self.is_data_pending() {
            validate_stream_matches_metadata(&self.metadata, &self.stream_id, Category::TimeSeries);
            self.commit_sample();
        } else if self.id.is_some() || self.timestamp.is_some() || self.value.is_some() {
            warn!(
                "Dropping incomplete time-series sample on stream {}: id, timestamp and value \
                 must all be set",
                self.stream_id
            );
        }
        self.id = None;
        self.value = None;
        self.timestamp = None;
    }

    fn commit_sample(&mut self) {
        // Guarded by is_data_pending; the takes below always succeed.
        let (Some(id), Some(timestamp), Some(value)) =
            (self.id.take(), self.timestamp.take(), self.value.take())
        else {
            return;
        };
        let key = SampleKey {
            timestamp_bits: timestamp.to_bits(),
            object_id: id,
            field: value.field_name(),
        };
        let group = self.data.entry(key).or_insert_with(|| SampleGroup {
            timestamp,
            streams: Vec::new(),
            values: Vec::new(),
        });
        group.streams.push(self.stream_id.clone());
        group.values.push(value);
    }

    /// Flush and drain, flattening the grouped samples into one record per
    /// (timestamp, object id, value kind). Output is deterministic: sorted
    /// by timestamp, then object id, then kind.
    pub fn get_data(&mut self) -> Vec<TimeSeriesState> {
        self.flush();

        let mut entries: Vec<(SampleKey, SampleGroup)> = self.data.drain().collect();
        entries.sort_by(|(ka, ga), (kb, gb)| {
            ga.timestamp
                .total_cmp(&gb.timestamp)
                .then_with(|| ka.object_id.cmp(&kb.object_id))
                .then_with(|| ka.field.cmp(kb.field))
        });

        entries
            .into_iter()
            .map(|(key, group)| {
                let mut values = TimeSeriesValues::default();
                for value in group.values {
                    match value {
                        TimeSeriesValue::String(v) => values.strings.push(v),
                        TimeSeriesValue::Bool(v) => values.bools.push(v),
                        TimeSeriesValue::Int32(v) => values.int32s.push(v),
                        TimeSeriesValue::Double(v) => values.doubles.push(v),
                    }
                }
                TimeSeriesState {
                    timestamp: group.timestamp,
                    object_id: key.object_id,
                    streams: group.streams,
                    values,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> TimeSeriesBuilder {
        TimeSeriesBuilder::new(Metadata::default())
    }

    #[test]
    fn complete_samples_commit() {
        let mut b = builder();
        b.stream("/vehicle/velocity")
            .id("car")
            .timestamp(10.0)
            .value(21.5);
        let data = b.get_data();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].object_id, "car");
        assert_eq!(data[0].streams, vec!["/vehicle/velocity"]);
        assert_eq!(data[0].values.doubles, vec![21.5]);
    }

    #[test]
    fn shared_keys_merge_into_parallel_arrays() {
        let mut b = builder();
        b.stream("/vehicle/velocity").id("car").timestamp(10.0).value(21.5);
        b.stream("/vehicle/acceleration").id("car").timestamp(10.0).value(1.2);
        let data = b.get_data();
        assert_eq!(data.len(), 1);
        assert_eq!(
            data[0].streams,
            vec!["/vehicle/velocity", "/vehicle/acceleration"]
        );
        assert_eq!(data[0].values.doubles, vec![21.5, 1.2]);
    }

    #[test]
    fn distinct_kinds_do_not_merge() {
        let mut b = builder();
        b.stream("/a").id("car").timestamp(10.0).value(1.0);
        b.stream("/b").id("car").timestamp(10.0).value(true);
        let data = b.get_data();
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn output_is_sorted_by_timestamp_then_id() {
        let mut b = builder();
        b.stream("/a").id("zebra").timestamp(20.0).value(1.0);
        b.stream("/a").id("ant").timestamp(20.0).value(2.0);
        b.stream("/a").id("car").timestamp(10.0).value(3.0);
        let data = b.get_data();
        assert_eq!(data[0].timestamp, 10.0);
        assert_eq!(data[1].object_id, "ant");
        assert_eq!(data[2].object_id, "zebra");
    }

    #[test]
    fn partial_samples_are_dropped_on_stream_switch() {
        let mut b = builder();
        b.stream("/a").id("car").timestamp(10.0);
        b.stream("/b").id("car").timestamp(10.0).value(1.0);
        let data = b.get_data();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].streams, vec!["/b"]);
    }

    #[test]
    fn get_data_drains_state() {
        let mut b = builder();
        b.stream("/a").id("car").timestamp(10.0).value(1.0);
        assert_eq!(b.get_data().len(), 1);
        assert!(b.get_data().is_empty());
    }
}
