use std::io;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, Serializer};
use sha2::{Digest, Sha256};

use super::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, TIMESTAMP_FORMAT};
use crate::transaction::Transaction;

/// A sealed block. Field order here is the order written to the chain file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based height; the genesis block is 1.
    pub index: u64,
    /// Creation time snapshot. Informational, never validated.
    pub timestamp: String,
    pub proof: u64,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis() -> Self {
        Self::new(
            1,
            GENESIS_PROOF,
            GENESIS_PREVIOUS_HASH.to_string(),
            Vec::new(),
        )
    }

    /// Create a block stamped with the current local time.
    pub fn new(
        index: u64,
        proof: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            index,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            proof,
            previous_hash,
            transactions,
        }
    }

    /// SHA-256 of the block's canonical JSON, as 64 lowercase hex chars.
    ///
    /// The preimage is every field (timestamp and transactions included)
    /// with object keys sorted, `", "` / `": "` separators, non-ASCII
    /// escaped as `\uXXXX` and floats in shortest `repr` form (`1e-05`,
    /// `1e+16`, `5.0`), so chain files written by other nodes of this
    /// ledger hash to the same value.
    pub fn digest(&self) -> String {
        // String keys only, and non-finite floats become null in `Value`.
        let bytes = self.canonical_bytes().expect("serialize block");
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        // `Value` objects are BTreeMap-backed, which gives sorted keys.
        let value = serde_json::to_value(self)?;
        let mut ser = Serializer::with_formatter(Vec::new(), CanonicalFormatter);
        value.serialize(&mut ser)?;
        Ok(ser.into_inner())
    }
}

/// Shortest round-trip digits, positional for decimal exponents in
/// `-4..16` (always with a fractional part), otherwise `d.ddde±XX`.
fn float_repr(value: f64) -> String {
    let sci = format!("{value:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return value.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return value.to_string();
    };
    if !(-4..16).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.unsigned_abs());
    }

    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    if exp < 0 {
        let zeros = "0".repeat(exp.unsigned_abs() as usize - 1);
        return format!("{sign}0.{zeros}{digits}");
    }

    let int_len = exp as usize + 1;
    if digits.len() <= int_len {
        let pad = "0".repeat(int_len - digits.len());
        format!("{sign}{digits}{pad}.0")
    } else {
        let (int_part, frac_part) = digits.split_at(int_len);
        format!("{sign}{int_part}.{frac_part}")
    }
}

struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() && ch != '\x7f' {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
