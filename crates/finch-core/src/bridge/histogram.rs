//! The HistogramRecord message carried in bridge frames.
//!
//! Field numbers: 1 record_type, 2 histogram_name, 3 sample, 4 min, 5 max,
//! 6 num_buckets. Every set field is written, including zero values.

use std::fmt;

use super::frame::{decode_varint, encode_varint, FrameError};

pub const PARSING_LOG_RESULT_HISTOGRAM: &str =
    "Android.WebView.NonEmbeddedMetrics.ParsingLogResult";
pub const RETRIEVE_STATUS_HISTOGRAM: &str =
    "Android.WebView.NonEmbeddedMetrics.RetrieveMetricsTaskStatus";
pub const DROPPED_RECORDS_HISTOGRAM: &str =
    "Android.WebView.NonEmbeddedMetrics.DroppedRecordsCount";

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LEN: u64 = 2;
const WIRE_FIXED32: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Boolean = 0,
    Exponential = 1,
    Linear = 2,
    Sparse = 3,
}

impl RecordType {
    fn from_wire(v: u64) -> Option<Self> {
        match v {
            0 => Some(RecordType::Boolean),
            1 => Some(RecordType::Exponential),
            2 => Some(RecordType::Linear),
            3 => Some(RecordType::Sparse),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Boolean => "boolean",
            RecordType::Exponential => "exponential",
            RecordType::Linear => "linear",
            RecordType::Sparse => "sparse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramRecord {
    pub record_type: RecordType,
    pub name: String,
    pub sample: i64,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub num_buckets: Option<i64>,
}

impl HistogramRecord {
    pub fn boolean(name: impl Into<String>, sample: bool) -> Self {
        Self {
            record_type: RecordType::Boolean,
            name: name.into(),
            sample: i64::from(sample),
            min: None,
            max: None,
            num_buckets: None,
        }
    }

    pub fn sparse(name: impl Into<String>, sample: i64) -> Self {
        Self {
            record_type: RecordType::Sparse,
            name: name.into(),
            sample,
            min: None,
            max: None,
            num_buckets: None,
        }
    }

    pub fn linear(
        name: impl Into<String>,
        sample: i64,
        min: i64,
        max: i64,
        num_buckets: i64,
    ) -> Self {
        Self {
            record_type: RecordType::Linear,
            name: name.into(),
            sample,
            min: Some(min),
            max: Some(max),
            num_buckets: Some(num_buckets),
        }
    }

    pub fn exponential(
        name: impl Into<String>,
        sample: i64,
        min: i64,
        max: i64,
        num_buckets: i64,
    ) -> Self {
        Self {
            record_type: RecordType::Exponential,
            ..Self::linear(name, sample, min, max, num_buckets)
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.name.len() + 24);
        put_varint_field(&mut out, 1, self.record_type as u64);
        encode_varint((2 << 3) | WIRE_LEN, &mut out);
        encode_varint(self.name.len() as u64, &mut out);
        out.extend_from_slice(self.name.as_bytes());
        // int32 fields: negative values are sign-extended to ten bytes.
        put_varint_field(&mut out, 3, self.sample as u64);
        for (field, value) in [(4, self.min), (5, self.max), (6, self.num_buckets)] {
            if let Some(v) = value {
                put_varint_field(&mut out, field, v as u64);
            }
        }
        out
    }

    /// Decode a record. Unknown fields are skipped; the name is required.
    pub fn decode(mut buf: &[u8]) -> Result<Self, FrameError> {
        let mut record_type = RecordType::Boolean;
        let mut name = None;
        let mut sample = 0i64;
        let (mut min, mut max, mut num_buckets) = (None, None, None);

        while !buf.is_empty() {
            let (tag, n) = decode_varint(buf)?;
            buf = &buf[n..];
            let field = tag >> 3;
            match tag & 7 {
                WIRE_VARINT => {
                    let (v, n) = decode_varint(buf)?;
                    buf = &buf[n..];
                    match field {
                        1 => {
                            record_type = RecordType::from_wire(v)
                                .ok_or(FrameError::Parse("unknown record type"))?
                        }
                        3 => sample = int32(v),
                        4 => min = Some(int32(v)),
                        5 => max = Some(int32(v)),
                        6 => num_buckets = Some(int32(v)),
                        _ => {}
                    }
                }
                WIRE_LEN => {
                    let (len, n) = decode_varint(buf)?;
                    buf = &buf[n..];
                    let len = usize::try_from(len)
                        .ok()
                        .filter(|l| *l <= buf.len())
                        .ok_or(FrameError::Parse("truncated field"))?;
                    if field == 2 {
                        let s = std::str::from_utf8(&buf[..len])
                            .map_err(|_| FrameError::Parse("histogram name is not utf-8"))?;
                        name = Some(s.to_string());
                    }
                    buf = &buf[len..];
                }
                WIRE_FIXED64 => buf = skip(buf, 8)?,
                WIRE_FIXED32 => buf = skip(buf, 4)?,
                _ => return Err(FrameError::Parse("unsupported wire type")),
            }
        }

        Ok(Self {
            record_type,
            name: name.ok_or(FrameError::Parse("missing histogram name"))?,
            sample,
            min,
            max,
            num_buckets,
        })
    }
}

impl fmt::Display for HistogramRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} sample={}", self.record_type.as_str(), self.name, self.sample)?;
        if let (Some(min), Some(max), Some(buckets)) = (self.min, self.max, self.num_buckets) {
            write!(f, " range=[{min},{max}] buckets={buckets}")?;
        }
        Ok(())
    }
}

fn put_varint_field(out: &mut Vec<u8>, field: u64, value: u64) {
    encode_varint((field << 3) | WIRE_VARINT, out);
    encode_varint(value, out);
}

fn int32(v: u64) -> i64 {
    i64::from(v as u32 as i32)
}

fn skip(buf: &[u8], n: usize) -> Result<&[u8], FrameError> {
    buf.get(n..).ok_or(FrameError::Parse("truncated field"))
}

/// Outcome of loading the records file at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingLogResult {
    Success = 0,
    MalformedRecord = 1,
    IoException = 2,
}

impl ParsingLogResult {
    pub const COUNT: i64 = 3;

    pub fn record(self) -> HistogramRecord {
        self_metric(PARSING_LOG_RESULT_HISTOGRAM, self as i64, Self::COUNT)
    }
}

/// Outcome of a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveMetricsTaskStatus {
    Success = 0,
    IoException = 1,
    Interrupted = 2,
}

impl RetrieveMetricsTaskStatus {
    pub const COUNT: i64 = 3;

    pub fn record(self) -> HistogramRecord {
        self_metric(RETRIEVE_STATUS_HISTOGRAM, self as i64, Self::COUNT)
    }
}

/// Frames that could not be persisted since the last drain.
pub fn dropped_records_record(count: u64) -> HistogramRecord {
    let sample = i64::try_from(count).unwrap_or(i64::MAX);
    HistogramRecord::exponential(DROPPED_RECORDS_HISTOGRAM, sample, 1, 1_000, 50)
}

fn self_metric(name: &str, sample: i64, count: i64) -> HistogramRecord {
    HistogramRecord::linear(name, sample, 1, count, count + 1)
}
