//! Test-vector driver
//!
//! [`Encoder`] reads `key value` tokens into a record and, on each `.`,
//! prints the record line followed by the hex bytes of its format 0x2b
//! encoding. A record still pending at end of input gets one final emit.
//! Unknown keys are reported on the diagnostic writer and skipped; a value
//! that fails to parse stops the run with no further output. A key left
//! without a value at end of input reads as zero.
//!
//! [`Decoder`] goes the other way, turning hex vectors back into record
//! lines so fixture files can be checked against the codec.

use std::io::{BufRead, Write};
use std::str::FromStr;

use compost_core::{decode, encode, CompostTemp, Field, Measurement};
use tracing::{debug, trace, warn};

use crate::error::{DriverError, Result};
use crate::render::{parse_hex_byte, parse_hex_line, HexBytes};
use crate::tokens::Tokens;

/// Prompt shown on interactive input
pub const BANNER: &str = "Input one or more lines of name/value tuples, ended by '.'";

/// End-of-record sentinel
const END_OF_RECORD: &str = ".";

/// What a completed run produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Records written to the output
    pub records: usize,
    /// Unknown keys reported and skipped
    pub unknown_keys: usize,
    /// Non-vector lines passed over in decode mode
    pub skipped_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Accumulating,
    Emit,
    Finalize,
}

/// Text records in, test vectors out
pub struct Encoder<R, W, E> {
    tokens: Tokens<R>,
    out: W,
    diag: E,
    record: Measurement,
    summary: Summary,
}

impl<R: BufRead, W: Write, E: Write> Encoder<R, W, E> {
    pub fn new(input: R, out: W, diag: E) -> Self {
        Self {
            tokens: Tokens::new(input),
            out,
            diag,
            record: Measurement::new(),
            summary: Summary::default(),
        }
    }

    /// Process the whole input
    pub fn run(mut self) -> Result<Summary> {
        let mut state = State::Accumulating;
        loop {
            trace!(?state, "step");
            state = match state {
                State::Accumulating => self.accumulate()?,
                State::Emit => {
                    self.emit()?;
                    State::Accumulating
                }
                State::Finalize => {
                    if !self.record.is_empty() {
                        self.emit()?;
                    }
                    self.out.flush()?;
                    return Ok(self.summary);
                }
            };
        }
    }

    fn accumulate(&mut self) -> Result<State> {
        let Some(key) = self.tokens.next_token()? else {
            return Ok(State::Finalize);
        };

        if key == END_OF_RECORD {
            return Ok(State::Emit);
        }

        let Some(field) = Field::from_key(&key) else {
            warn!(%key, "unknown key");
            writeln!(self.diag, "unknown key: {}", key)?;
            self.summary.unknown_keys += 1;
            return Ok(State::Accumulating);
        };

        let Some(value) = self.tokens.next_token()? else {
            // input ended mid-pair: the field reads as zero
            assign(&mut self.record, field, "0")?;
            return Ok(State::Finalize);
        };
        assign(&mut self.record, field, &value)?;
        debug!(field = field.key(), %value, "field set");

        Ok(State::Accumulating)
    }

    fn emit(&mut self) -> Result<()> {
        let msg = encode(&self.record);
        debug!(flags = self.record.flags(), len = msg.len(), "emit");

        writeln!(self.out, "{}", self.record)?;
        writeln!(self.out, "{}", HexBytes(&msg))?;

        self.record.clear();
        self.summary.records += 1;
        Ok(())
    }
}

/// Parse `value` for `field` and store it in `record`
pub fn assign(record: &mut Measurement, field: Field, value: &str) -> Result<()> {
    match field {
        Field::Vbat => record.vbat = Some(parse_reading(value)?),
        Field::Vbus => record.vbus = Some(parse_reading(value)?),
        // read wide, keep the low byte like the on-air counter
        Field::Boot => record.boot = Some(parse::<u32>(value)? as u8),
        Field::CompostTemp => {
            record.compost_temp = Some(CompostTemp {
                degrees: parse_reading(value)?,
            })
        }
    }
    Ok(())
}

fn parse<T: FromStr>(token: &str) -> Result<T> {
    token.parse().map_err(|_| DriverError::parse(token))
}

/// Readings must be finite: `nan`, `inf` and out-of-range exponents are
/// rejected rather than quantized
fn parse_reading(token: &str) -> Result<f32> {
    let value: f32 = parse(token)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DriverError::parse(token))
    }
}

/// Hex vectors in, record lines out
///
/// Lines whose first token is not a hex byte (record lines, comments) are
/// skipped, so encoder output can be fed straight back in.
pub struct Decoder<R, W> {
    input: R,
    out: W,
    summary: Summary,
}

impl<R: BufRead, W: Write> Decoder<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self {
            input,
            out,
            summary: Summary::default(),
        }
    }

    pub fn run(mut self) -> Result<Summary> {
        let mut line = String::new();
        let mut number = 0;

        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            number += 1;

            let Some(first) = line.split_whitespace().next() else {
                continue;
            };
            if parse_hex_byte(first).is_none() {
                trace!(line = number, "not a vector, skipped");
                self.summary.skipped_lines += 1;
                continue;
            }

            let bytes = parse_hex_line(&line).map_err(|token| DriverError::Hex {
                line: number,
                token: token.to_owned(),
            })?;
            let m = decode(&bytes).map_err(|source| DriverError::Decode {
                line: number,
                source,
            })?;

            debug!(line = number, flags = m.flags(), "decoded");
            writeln!(self.out, "{}", m)?;
            self.summary.records += 1;
        }

        self.out.flush()?;
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compost_core::DecodeError;

    struct Run {
        result: Result<Summary>,
        out: String,
        diag: String,
    }

    fn encode_text(input: &str) -> Run {
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let result = Encoder::new(input.as_bytes(), &mut out, &mut diag).run();
        Run {
            result,
            out: String::from_utf8(out).unwrap(),
            diag: String::from_utf8(diag).unwrap(),
        }
    }

    fn decode_text(input: &str) -> (Result<Summary>, String) {
        let mut out = Vec::new();
        let result = Decoder::new(input.as_bytes(), &mut out).run();
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_voltages() {
        let run = encode_text("Vbat 3.3 Vbus 5.0 .\n");
        assert_eq!(run.out, "Vbat 3.3 Vbus 5 .\n2b 03 34 cd 50 00\n");
        assert_eq!(run.result.unwrap().records, 1);
        assert!(run.diag.is_empty());
    }

    #[test]
    fn test_boot_only() {
        let run = encode_text("Boot 7 .\n");
        assert_eq!(run.out, "Boot 7 .\n2b 04 07\n");
    }

    #[test]
    fn test_sparse_record() {
        let run = encode_text("Vbat 3.3 Boot 7 CompostTemp 25.5 .\n");
        assert_eq!(
            run.out,
            "Vbat 3.3 Boot 7 CompostTemp 25.5 .\n2b 0d 34 cd 07 19 80\n"
        );
    }

    #[test]
    fn test_empty_record() {
        let run = encode_text(".\n");
        assert_eq!(run.out, ".\n2b 00\n");
    }

    #[test]
    fn test_fields_print_in_fixed_order() {
        let run = encode_text("CompostTemp 25.5 Boot 7 Vbat 3.3 .");
        assert_eq!(
            run.out,
            "Vbat 3.3 Boot 7 CompostTemp 25.5 .\n2b 0d 34 cd 07 19 80\n"
        );
    }

    #[test]
    fn test_unknown_key_is_skipped() {
        let run = encode_text("Frobnicate 1 .\n");
        // the stray value is itself read as a key
        assert_eq!(run.diag, "unknown key: Frobnicate\nunknown key: 1\n");
        assert_eq!(run.out, ".\n2b 00\n");
        let summary = run.result.unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(summary.unknown_keys, 2);
    }

    #[test]
    fn test_parse_error_stops_run() {
        let run = encode_text("Vbat abc");
        match run.result {
            Err(DriverError::Parse { token }) => assert_eq!(token, "abc"),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(run.out.is_empty());
    }

    #[test]
    fn test_parse_error_keeps_earlier_records() {
        let run = encode_text("Boot 7 .\nVbat 3.3 Vbus x\n");
        assert!(matches!(run.result, Err(DriverError::Parse { .. })));
        assert_eq!(run.out, "Boot 7 .\n2b 04 07\n");
    }

    #[test]
    fn test_parse_error_message() {
        let err = encode_text("CompostTemp warm .").result.unwrap_err();
        assert_eq!(err.to_string(), "parse error: warm");
    }

    #[test]
    fn test_non_finite_values_rejected() {
        for token in ["nan", "NaN", "inf", "-inf", "infinity", "1e39"] {
            let run = encode_text(&format!("Vbat {} .", token));
            match run.result {
                Err(DriverError::Parse { token: t }) => assert_eq!(t, token),
                other => panic!("expected parse error for {}, got {:?}", token, other),
            }
            assert!(run.out.is_empty());
        }

        let run = encode_text("CompostTemp inf .");
        assert!(matches!(run.result, Err(DriverError::Parse { .. })));
    }

    #[test]
    fn test_trailing_garbage_is_parse_error() {
        let run = encode_text("Boot 7 . Vbat 3.3abc .");
        match run.result {
            Err(DriverError::Parse { token }) => assert_eq!(token, "3.3abc"),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert_eq!(run.out, "Boot 7 .\n2b 04 07\n");
        assert!(run.diag.is_empty());
    }

    #[test]
    fn test_missing_value_at_end() {
        let run = encode_text("Boot 7 Vbat");
        assert_eq!(run.out, "Vbat 0 Boot 7 .\n2b 05 00 00 07\n");
        assert_eq!(run.result.unwrap().records, 1);

        let run = encode_text("Boot 7 . CompostTemp\n");
        assert_eq!(run.out, "Boot 7 .\n2b 04 07\nCompostTemp 0 .\n2b 08 00 00\n");
    }

    #[test]
    fn test_pending_record_emitted_at_end() {
        let run = encode_text("Vbat 3.3\nVbus 5.0\n");
        assert_eq!(run.out, "Vbat 3.3 Vbus 5 .\n2b 03 34 cd 50 00\n");
    }

    #[test]
    fn test_no_final_emit_without_fields() {
        let run = encode_text("Boot 7 .\nFrobnicate\n");
        assert_eq!(run.out, "Boot 7 .\n2b 04 07\n");
        assert_eq!(run.result.unwrap().records, 1);

        let run = encode_text("");
        assert!(run.out.is_empty());
        assert_eq!(run.result.unwrap(), Summary::default());
    }

    #[test]
    fn test_record_reset_between_emits() {
        let run = encode_text("Vbat 3.3 . Boot 7 .");
        assert_eq!(run.out, "Vbat 3.3 .\n2b 01 34 cd\nBoot 7 .\n2b 04 07\n");
    }

    #[test]
    fn test_later_value_wins() {
        let run = encode_text("Boot 1 Boot 7 .");
        assert_eq!(run.out, "Boot 7 .\n2b 04 07\n");
    }

    #[test]
    fn test_boot_narrowed_to_byte() {
        let run = encode_text("Boot 263 .");
        assert_eq!(run.out, "Boot 7 .\n2b 04 07\n");

        let run = encode_text("Boot -1 .");
        assert!(matches!(run.result, Err(DriverError::Parse { .. })));
    }

    #[test]
    fn test_saturated_voltage() {
        let run = encode_text("Vbat 9 Vbus -9 .");
        assert_eq!(run.out, "Vbat 9 Vbus -9 .\n2b 03 7f ff 80 00\n");
    }

    #[test]
    fn test_output_is_deterministic() {
        let input = "Vbat 3.3 Vbus 5.0 . Boot 7 CompostTemp -4.75 .";
        assert_eq!(encode_text(input).out, encode_text(input).out);
    }

    #[test]
    fn test_decode_vectors() {
        let (result, out) = decode_text("2b 04 07\n2b 00\n2b 0d 34 cd 07 19 80\n");
        assert_eq!(out, "Boot 7 .\n.\nVbat 3.30005 Boot 7 CompostTemp 25.5 .\n");
        assert_eq!(result.unwrap().records, 3);
    }

    #[test]
    fn test_decode_encoder_output() {
        let encoded = encode_text("Vbus 5 Boot 7 .\n.\n").out;
        let (result, out) = decode_text(&encoded);
        assert_eq!(out, "Vbus 5 Boot 7 .\n.\n");
        let summary = result.unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.skipped_lines, 2);
    }

    #[test]
    fn test_decode_bad_hex() {
        let (result, out) = decode_text("2b 04 07\n2b 0g\n");
        match result {
            Err(DriverError::Hex { line, token }) => {
                assert_eq!(line, 2);
                assert_eq!(token, "0g");
            }
            other => panic!("expected hex error, got {:?}", other),
        }
        assert_eq!(out, "Boot 7 .\n");
    }

    #[test]
    fn test_decode_bad_message() {
        let (result, _) = decode_text("\n2c 00\n");
        match result {
            Err(DriverError::Decode { line, source }) => {
                assert_eq!(line, 2);
                assert_eq!(source, DecodeError::UnknownFormat(0x2c));
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }
}
