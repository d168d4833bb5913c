//! Reader and writer for the AIGER circuit format.
//!
//! Both the ASCII (`aag`) and the binary (`aig`) variant are accepted on
//! input. Output is always ASCII: a reduced circuit with dropped inputs is
//! not representable in the binary form's implicit literal numbering.

use crate::aig::{Aig, AndGate, Input, Latch, Lit, Output, StructureError, Var};
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("binary and gate {index}: {message}")]
    BinaryAnd { index: usize, message: String },
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error(transparent)]
    Structure(#[from] StructureError),
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            line: 0,
        }
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.bytes.get(self.pos).copied()?;
        self.pos += 1;
        Some(byte)
    }

    fn next_line(&mut self) -> Result<&'a str, ParseError> {
        if self.at_eof() {
            return Err(ParseError::UnexpectedEof);
        }
        self.line += 1;
        let start = self.pos;
        let end = self.bytes[start..]
            .iter()
            .position(|byte| *byte == b'\n')
            .map(|offset| start + offset)
            .unwrap_or(self.bytes.len());
        self.pos = (end + 1).min(self.bytes.len());
        let raw = &self.bytes[start..end];
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        std::str::from_utf8(raw).map_err(|_| self.malformed("line is not valid utf-8"))
    }

    fn malformed(&self, message: &str) -> ParseError {
        ParseError::Malformed {
            line: self.line,
            message: message.to_string(),
        }
    }
}

struct Header {
    binary: bool,
    max_var: Var,
    inputs: usize,
    latches: usize,
    outputs: usize,
    ands: usize,
}

pub fn parse(bytes: &[u8]) -> Result<Aig, ParseError> {
    let mut cursor = Cursor::new(bytes);
    let header = parse_header(&mut cursor)?;
    let mut aig = Aig {
        max_var: header.max_var,
        ..Aig::default()
    };
    if header.binary {
        parse_binary_body(&mut cursor, &header, &mut aig)?;
    } else {
        parse_ascii_body(&mut cursor, &header, &mut aig)?;
    }
    parse_symbols_and_comments(&mut cursor, &mut aig)?;
    aig.check()?;
    Ok(aig)
}

fn parse_header(cursor: &mut Cursor) -> Result<Header, ParseError> {
    let line = cursor.next_line()?;
    let mut tokens = line.split_ascii_whitespace();
    let binary = match tokens.next() {
        Some("aag") => false,
        Some("aig") => true,
        _ => return Err(cursor.malformed("expected 'aag' or 'aig' magic")),
    };
    let mut counts = [0usize; 5];
    for slot in &mut counts {
        let token = tokens
            .next()
            .ok_or_else(|| cursor.malformed("header needs five counts: M I L O A"))?;
        *slot = token
            .parse()
            .map_err(|_| cursor.malformed("header count is not a number"))?;
    }
    if tokens.next().is_some() {
        return Err(cursor.malformed("trailing tokens after header"));
    }
    let [max_var, inputs, latches, outputs, ands] = counts;
    Ok(Header {
        binary,
        max_var: max_var as Var,
        inputs,
        latches,
        outputs,
        ands,
    })
}

fn parse_literals<const N: usize>(
    cursor: &mut Cursor,
    what: &str,
) -> Result<[Lit; N], ParseError> {
    let line = cursor.next_line()?;
    let mut tokens = line.split_ascii_whitespace();
    let mut lits = [Lit::FALSE; N];
    for slot in &mut lits {
        let token = tokens
            .next()
            .ok_or_else(|| cursor.malformed(&format!("{what} is missing a literal")))?;
        let raw: u32 = token
            .parse()
            .map_err(|_| cursor.malformed(&format!("{what} literal is not a number")))?;
        *slot = Lit::from_raw(raw);
    }
    if tokens.next().is_some() {
        return Err(cursor.malformed(&format!("trailing tokens after {what}")));
    }
    Ok(lits)
}

fn parse_ascii_body(cursor: &mut Cursor, header: &Header, aig: &mut Aig) -> Result<(), ParseError> {
    for _ in 0..header.inputs {
        let [lit] = parse_literals(cursor, "input")?;
        aig.inputs.push(Input { lit, name: None });
    }
    for _ in 0..header.latches {
        let [lit, next] = parse_literals(cursor, "latch")?;
        aig.latches.push(Latch {
            lit,
            next,
            name: None,
        });
    }
    for _ in 0..header.outputs {
        let [lit] = parse_literals(cursor, "output")?;
        aig.outputs.push(Output { lit, name: None });
    }
    for _ in 0..header.ands {
        let [lhs, rhs0, rhs1] = parse_literals(cursor, "and gate")?;
        aig.ands.push(AndGate { lhs, rhs0, rhs1 });
    }
    Ok(())
}

fn parse_binary_body(
    cursor: &mut Cursor,
    header: &Header,
    aig: &mut Aig,
) -> Result<(), ParseError> {
    // Input and latch definition literals are implicit and consecutive.
    for idx in 0..header.inputs {
        aig.inputs.push(Input {
            lit: Lit::new(idx as Var + 1, false),
            name: None,
        });
    }
    for idx in 0..header.latches {
        let [next] = parse_literals(cursor, "latch")?;
        aig.latches.push(Latch {
            lit: Lit::new((header.inputs + idx) as Var + 1, false),
            next,
            name: None,
        });
    }
    for _ in 0..header.outputs {
        let [lit] = parse_literals(cursor, "output")?;
        aig.outputs.push(Output { lit, name: None });
    }
    for idx in 0..header.ands {
        let lhs = Lit::new((header.inputs + header.latches + idx) as Var + 1, false);
        let delta0 = decode_delta(cursor, idx)?;
        let delta1 = decode_delta(cursor, idx)?;
        let rhs0 = lhs.raw().checked_sub(delta0).ok_or_else(|| {
            ParseError::BinaryAnd {
                index: idx,
                message: "first delta exceeds the left-hand side".to_string(),
            }
        })?;
        let rhs1 = rhs0.checked_sub(delta1).ok_or_else(|| ParseError::BinaryAnd {
            index: idx,
            message: "second delta exceeds the first operand".to_string(),
        })?;
        aig.ands.push(AndGate {
            lhs,
            rhs0: Lit::from_raw(rhs0),
            rhs1: Lit::from_raw(rhs1),
        });
    }
    Ok(())
}

// 7-bit chunks, least significant first, high bit marks continuation.
fn decode_delta(cursor: &mut Cursor, index: usize) -> Result<u32, ParseError> {
    let mut value: u32 = 0;
    let mut shift = 0;
    loop {
        let byte = cursor.next_byte().ok_or(ParseError::UnexpectedEof)?;
        let chunk = (byte & 0x7f) as u32;
        if shift >= 32 || chunk.checked_shl(shift).map(|v| v >> shift) != Some(chunk) {
            return Err(ParseError::BinaryAnd {
                index,
                message: "delta code overflows 32 bits".to_string(),
            });
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

fn parse_symbols_and_comments(cursor: &mut Cursor, aig: &mut Aig) -> Result<(), ParseError> {
    while !cursor.at_eof() {
        let line = cursor.next_line()?;
        if line == "c" {
            while !cursor.at_eof() {
                let comment = cursor.next_line()?;
                aig.comments.push(comment.to_string());
            }
            return Ok(());
        }
        if line.is_empty() {
            continue;
        }
        let kind = line.as_bytes()[0];
        let rest = line
            .get(1..)
            .ok_or_else(|| cursor.malformed("symbol entry needs a position and a name"))?;
        let (position, name) = rest
            .split_once(' ')
            .ok_or_else(|| cursor.malformed("symbol entry needs a position and a name"))?;
        let position: usize = position
            .parse()
            .map_err(|_| cursor.malformed("symbol position is not a number"))?;
        let slot = match kind {
            b'i' => aig.inputs.get_mut(position).map(|input| &mut input.name),
            b'l' => aig.latches.get_mut(position).map(|latch| &mut latch.name),
            b'o' => aig.outputs.get_mut(position).map(|output| &mut output.name),
            _ => return Err(cursor.malformed("unknown symbol kind")),
        };
        match slot {
            Some(slot) => *slot = Some(name.to_string()),
            None => return Err(cursor.malformed("symbol position out of range")),
        }
    }
    Ok(())
}

/// Serializes a circuit in the ASCII AIGER form.
pub fn write(aig: &Aig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "aag {} {} {} {} {}",
        aig.max_var,
        aig.inputs.len(),
        aig.latches.len(),
        aig.outputs.len(),
        aig.ands.len()
    );
    for input in &aig.inputs {
        let _ = writeln!(out, "{}", input.lit);
    }
    for latch in &aig.latches {
        let _ = writeln!(out, "{} {}", latch.lit, latch.next);
    }
    for output in &aig.outputs {
        let _ = writeln!(out, "{}", output.lit);
    }
    for and in &aig.ands {
        let _ = writeln!(out, "{} {} {}", and.lhs, and.rhs0, and.rhs1);
    }
    for (idx, input) in aig.inputs.iter().enumerate() {
        if let Some(name) = &input.name {
            let _ = writeln!(out, "i{idx} {name}");
        }
    }
    for (idx, latch) in aig.latches.iter().enumerate() {
        if let Some(name) = &latch.name {
            let _ = writeln!(out, "l{idx} {name}");
        }
    }
    for (idx, output) in aig.outputs.iter().enumerate() {
        if let Some(name) = &output.name {
            let _ = writeln!(out, "o{idx} {name}");
        }
    }
    if !aig.comments.is_empty() {
        let _ = writeln!(out, "c");
        for comment in &aig.comments {
            let _ = writeln!(out, "{comment}");
        }
    }
    out
}
