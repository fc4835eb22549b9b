//! Timestamped sample and its ASCII wire line.
//!
//! One line per reading: `e<ecg> p<ppg> r<0|1> b<0|1> t<timestamp>`, fields
//! separated by single spaces and terminated by `\r\n`.

use core::fmt::Write;

use heapless::String;

use crate::config::LINE_CAPACITY;

pub type LineBuf = String<LINE_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct SampleReading {
    pub ecg: i32,
    pub ppg: i32,
    pub is_r_peak: bool,
    pub is_pulse_valley: bool,
    /// Monotonic milliseconds since boot.
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum LineError {
    MissingField(char),
    UnexpectedField { expected: char },
    BadNumber(char),
    BadFlag(char),
    TrailingData,
}

impl SampleReading {
    /// Write the line body, without terminator.
    pub fn write_line<W: Write>(&self, out: &mut W) -> core::fmt::Result {
        write!(
            out,
            "e{} p{} r{} b{} t{}",
            self.ecg,
            self.ppg,
            u8::from(self.is_r_peak),
            u8::from(self.is_pulse_valley),
            self.timestamp
        )
    }

    /// Line body followed by `\r\n`, ready for the transport.
    pub fn to_line(&self) -> LineBuf {
        let mut line = LineBuf::new();
        // LINE_CAPACITY covers the widest i32/u64 rendering, so neither
        // write can overflow.
        let _ = self.write_line(&mut line);
        let _ = line.push_str("\r\n");
        line
    }

    /// Decode a line produced by [`SampleReading::to_line`].
    pub fn parse_line(line: &str) -> Result<Self, LineError> {
        let body = line.trim_end_matches(|c| c == '\r' || c == '\n');
        let mut fields = body.split(' ');

        let ecg = number(field(fields.next(), 'e')?, 'e')?;
        let ppg = number(field(fields.next(), 'p')?, 'p')?;
        let is_r_peak = flag(field(fields.next(), 'r')?, 'r')?;
        let is_pulse_valley = flag(field(fields.next(), 'b')?, 'b')?;
        let timestamp = number(field(fields.next(), 't')?, 't')?;

        if fields.next().is_some() {
            return Err(LineError::TrailingData);
        }

        Ok(Self {
            ecg,
            ppg,
            is_r_peak,
            is_pulse_valley,
            timestamp,
        })
    }
}

fn field(raw: Option<&str>, tag: char) -> Result<&str, LineError> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or(LineError::MissingField(tag))?;
    raw.strip_prefix(tag)
        .ok_or(LineError::UnexpectedField { expected: tag })
}

fn number<T: core::str::FromStr>(value: &str, tag: char) -> Result<T, LineError> {
    value.parse().map_err(|_| LineError::BadNumber(tag))
}

fn flag(value: &str, tag: char) -> Result<bool, LineError> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(LineError::BadFlag(tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_reading() -> SampleReading {
        SampleReading {
            ecg: 512,
            ppg: 300,
            is_r_peak: true,
            is_pulse_valley: false,
            timestamp: 123_456,
        }
    }

    #[test]
    fn formats_reference_line() {
        assert_eq!(
            reference_reading().to_line().as_str(),
            "e512 p300 r1 b0 t123456\r\n"
        );
    }

    #[test]
    fn widest_values_fit_line_buffer() {
        let reading = SampleReading {
            ecg: i32::MIN,
            ppg: i32::MIN,
            is_r_peak: true,
            is_pulse_valley: true,
            timestamp: u64::MAX,
        };
        let line = reading.to_line();
        assert!(line.ends_with("\r\n"));
        assert_eq!(SampleReading::parse_line(&line), Ok(reading));
    }

    #[test]
    fn parses_line_with_or_without_terminator() {
        assert_eq!(
            SampleReading::parse_line("e512 p300 r1 b0 t123456"),
            Ok(reference_reading())
        );
        assert_eq!(
            SampleReading::parse_line("e512 p300 r1 b0 t123456\r\n"),
            Ok(reference_reading())
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            SampleReading::parse_line("e512 p300 r1 b0"),
            Err(LineError::MissingField('t'))
        );
        assert_eq!(
            SampleReading::parse_line("p300 e512 r1 b0 t1"),
            Err(LineError::UnexpectedField { expected: 'e' })
        );
        assert_eq!(
            SampleReading::parse_line("e5x2 p300 r1 b0 t1"),
            Err(LineError::BadNumber('e'))
        );
        assert_eq!(
            SampleReading::parse_line("e512 p300 r2 b0 t1"),
            Err(LineError::BadFlag('r'))
        );
        assert_eq!(
            SampleReading::parse_line("e512 p300 r1 b0 t-1"),
            Err(LineError::BadNumber('t'))
        );
        assert_eq!(
            SampleReading::parse_line("e512 p300 r1 b0 t1 x"),
            Err(LineError::TrailingData)
        );
        assert_eq!(
            SampleReading::parse_line("e512  p300 r1 b0 t1"),
            Err(LineError::MissingField('p'))
        );
    }
}
