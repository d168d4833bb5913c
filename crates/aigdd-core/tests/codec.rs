use aigdd_core::codec::{self, ParseError};
use aigdd_core::{Lit, StructureError};

const SAMPLE: &str = "aag 5 2 0 2 3\n\
2\n\
4\n\
10\n\
7\n\
6 2 4\n\
8 3 5\n\
10 6 9\n\
i0 x\n\
i1 y\n\
o0 sum\n\
c\n\
hand-built sample\n";

#[test]
fn parses_ascii_with_symbols_and_comments() {
    let aig = codec::parse(SAMPLE.as_bytes()).expect("parse");
    assert_eq!(aig.max_var, 5);
    assert_eq!(aig.inputs.len(), 2);
    assert_eq!(aig.inputs[0].lit, Lit::from_raw(2));
    assert_eq!(aig.inputs[0].name.as_deref(), Some("x"));
    assert_eq!(aig.inputs[1].name.as_deref(), Some("y"));
    assert_eq!(aig.latches.len(), 0);
    assert_eq!(aig.outputs.len(), 2);
    assert_eq!(aig.outputs[0].lit, Lit::from_raw(10));
    assert_eq!(aig.outputs[0].name.as_deref(), Some("sum"));
    assert_eq!(aig.outputs[1].lit, Lit::from_raw(7));
    assert_eq!(aig.ands.len(), 3);
    assert_eq!(aig.ands[1].lhs, Lit::from_raw(8));
    assert_eq!(aig.ands[1].rhs0, Lit::from_raw(3));
    assert_eq!(aig.ands[1].rhs1, Lit::from_raw(5));
    assert_eq!(aig.comments, vec!["hand-built sample".to_string()]);
}

#[test]
fn ascii_round_trip_is_exact() {
    let aig = codec::parse(SAMPLE.as_bytes()).expect("parse");
    assert_eq!(codec::write(&aig), SAMPLE);
    let again = codec::parse(codec::write(&aig).as_bytes()).expect("reparse");
    assert_eq!(again, aig);
}

#[test]
fn parses_latches() {
    let text = "aag 3 1 1 1 1\n2\n4 6\n4\nl0 state\n";
    // One latch, next-state literal 6 undefined without the gate.
    let aig = codec::parse(b"aag 3 1 1 1 1\n2\n4 6\n4\n6 2 5\nl0 state\n").expect("parse");
    assert_eq!(aig.latches.len(), 1);
    assert_eq!(aig.latches[0].lit, Lit::from_raw(4));
    assert_eq!(aig.latches[0].next, Lit::from_raw(6));
    assert_eq!(aig.latches[0].name.as_deref(), Some("state"));
    assert!(matches!(
        codec::parse(text.as_bytes()),
        Err(ParseError::Structure(StructureError::Undefined(_)))
    ));
}

#[test]
fn parses_binary_variant() {
    let bytes = b"aig 5 2 0 2 3\n10\n7\n\x02\x02\x03\x02\x01\x03";
    let aig = codec::parse(bytes).expect("parse binary");
    assert_eq!(aig.max_var, 5);
    assert_eq!(aig.inputs[0].lit, Lit::from_raw(2));
    assert_eq!(aig.inputs[1].lit, Lit::from_raw(4));
    assert_eq!(aig.outputs[0].lit, Lit::from_raw(10));
    assert_eq!(aig.outputs[1].lit, Lit::from_raw(7));
    let gates: Vec<(u32, u32, u32)> = aig
        .ands
        .iter()
        .map(|and| (and.lhs.raw(), and.rhs0.raw(), and.rhs1.raw()))
        .collect();
    assert_eq!(gates, vec![(6, 4, 2), (8, 5, 3), (10, 9, 6)]);
}

#[test]
fn binary_deltas_span_multiple_bytes() {
    let mut bytes = b"aig 101 100 0 1 1\n202\n".to_vec();
    // delta0 = 200 (two 7-bit chunks), delta1 = 0.
    bytes.extend([0xc8, 0x01, 0x00]);
    let aig = codec::parse(&bytes).expect("parse");
    assert_eq!(aig.inputs.len(), 100);
    let and = aig.ands[0];
    assert_eq!(and.lhs.raw(), 202);
    assert_eq!(and.rhs0.raw(), 2);
    assert_eq!(and.rhs1.raw(), 2);
}

#[test]
fn rejects_unknown_magic() {
    assert!(matches!(
        codec::parse(b"agg 0 0 0 0 0\n"),
        Err(ParseError::Malformed { line: 1, .. })
    ));
}

#[test]
fn rejects_negated_definition() {
    assert_eq!(
        codec::parse(b"aag 1 1 0 0 0\n3\n"),
        Err(ParseError::Structure(StructureError::NegatedDefinition(
            Lit::from_raw(3)
        )))
    );
}

#[test]
fn rejects_literal_beyond_max_var() {
    assert_eq!(
        codec::parse(b"aag 1 1 0 0 0\n4\n"),
        Err(ParseError::Structure(StructureError::OutOfRange(
            Lit::from_raw(4),
            1
        )))
    );
}

#[test]
fn rejects_duplicate_definition() {
    assert_eq!(
        codec::parse(b"aag 2 2 0 0 0\n2\n2\n"),
        Err(ParseError::Structure(StructureError::Redefined(
            Lit::from_raw(2)
        )))
    );
}

#[test]
fn rejects_truncated_file() {
    assert_eq!(
        codec::parse(b"aag 2 2 0 0 0\n2\n"),
        Err(ParseError::UnexpectedEof)
    );
}

#[test]
fn rejects_truncated_binary_gates() {
    assert_eq!(
        codec::parse(b"aig 3 2 0 1 1\n6\n\x02"),
        Err(ParseError::UnexpectedEof)
    );
}

#[test]
fn rejects_symbol_position_out_of_range() {
    assert!(matches!(
        codec::parse(b"aag 1 1 0 0 0\n2\ni5 ghost\n"),
        Err(ParseError::Malformed { .. })
    ));
}
