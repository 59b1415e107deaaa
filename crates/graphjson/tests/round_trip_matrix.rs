use std::collections::BTreeSet;

use graphjson::{
    from_text, graph_equal, to_text, Codec, EnumShape, FloatWidth, Heap, IntWidth, RecordShape,
    Registry, Shape, Value,
};

fn round_trip(registry: &Registry, shape: &Shape, value: &Value) -> (String, Value) {
    let codec = Codec::new(registry);
    let text = codec.store(shape, value, &Heap::new()).expect("store must succeed");
    let decoded = codec
        .load(&text, shape, &mut Heap::new())
        .expect("load must succeed");
    (text, decoded)
}

#[test]
fn fixed_string_grid_round_trips() {
    let grid: [[String; 5]; 5] =
        std::array::from_fn(|_| ["test", "1", "2", "3", "4"].map(String::from));
    let text = to_text(&grid).expect("to_text must succeed");
    let row = r#"["test", "1", "2", "3", "4"]"#;
    assert_eq!(text, format!("[{}]", [row; 5].join(", ")));
    let decoded: [[String; 5]; 5] = from_text(&text).expect("from_text must succeed");
    assert_eq!(decoded, grid);
}

#[test]
fn named_record_has_exact_text() {
    let registry = Registry::new();
    let shape = Shape::Record(
        RecordShape::new("Person")
            .field("name", Shape::String)
            .field("s", Shape::int(IntWidth::I32)),
    );
    let value = Value::record([("name", Value::str("tuple test")), ("s", Value::Int(56))]);
    let (text, decoded) = round_trip(&registry, &shape, &value);
    assert_eq!(text, r#"{"name": "tuple test", "s": 56}"#);
    assert_eq!(decoded, value);
}

#[test]
fn absent_and_empty_sequences_stay_distinct() {
    let registry = Registry::new();
    let shape = Shape::seq(Shape::int(IntWidth::I64));

    let (text, decoded) = round_trip(&registry, &shape, &Value::Seq(None));
    assert_eq!(text, "null");
    assert_eq!(decoded, Value::Seq(None));

    let (text, decoded) = round_trip(&registry, &shape, &Value::Seq(Some(vec![])));
    assert_eq!(text, "[]");
    assert_eq!(decoded, Value::Seq(Some(vec![])));

    let (text, decoded) = round_trip(&registry, &Shape::String, &Value::Str(None));
    assert_eq!(text, "null");
    assert_eq!(decoded, Value::Str(None));

    let (text, decoded) = round_trip(&registry, &Shape::String, &Value::str(""));
    assert_eq!(text, r#""""#);
    assert_eq!(decoded, Value::str(""));
}

#[test]
fn invalid_utf8_string_falls_back_to_bytes() {
    let registry = Registry::new();
    let raw = vec![b'o', b'k', 0xc3, 0x28, 0xff];
    let (text, decoded) = round_trip(&registry, &Shape::String, &Value::bytes(raw.clone()));
    assert_eq!(text, "[111, 107, 195, 40, 255]");
    assert_eq!(decoded, Value::bytes(raw));
}

#[test]
fn composite_kinds_round_trip() {
    let mut registry = Registry::new();
    let color = Shape::Enum(EnumShape::new("Color", ["red", "green", "blue"]));
    registry.define("Color", color.clone());
    let shape = Shape::Record(
        RecordShape::new("Everything")
            .field("flag", Shape::Bool)
            .field("letter", Shape::Char)
            .field("wide", Shape::Char)
            .field("small", Shape::int(IntWidth::I8))
            .field("big", Shape::int(IntWidth::U64))
            .field("single", Shape::Float(FloatWidth::F32))
            .field("double", Shape::float())
            .field("color", Shape::named("Color"))
            .field("palette", Shape::set(Shape::named("Color")))
            .field("digits", Shape::range(Shape::int(IntWidth::U8), 0, 9))
            .field("pair", Shape::Record(RecordShape::tuple([Shape::String, Shape::Bool])))
            .field("handle", Shape::Opaque),
    );
    let value = Value::record([
        ("flag", Value::Bool(true)),
        ("letter", Value::Char('q')),
        ("wide", Value::Char('\u{1F600}')),
        ("small", Value::Int(-7)),
        ("big", Value::UInt(u64::MAX)),
        ("single", Value::Float(f64::from(1.5f32))),
        ("double", Value::Float(-0.25)),
        ("color", Value::Enum(2)),
        ("palette", Value::set([0, 2])),
        ("digits", Value::UInt(7)),
        (
            "pair",
            Value::record([("Field0", Value::str("x")), ("Field1", Value::Bool(false))]),
        ),
        ("handle", Value::Opaque(Some(0xdead))),
    ]);
    let (text, decoded) = round_trip(&registry, &shape, &value);
    assert_eq!(
        text,
        concat!(
            r#"{"flag": true, "letter": "q", "wide": 128512, "small": -7, "#,
            r#""big": 18446744073709551615, "single": 1.5, "double": -0.25, "#,
            r#""color": "blue", "palette": [0, 2], "digits": 7, "#,
            r#""pair": {"Field0": "x", "Field1": false}, "handle": 57005}"#,
        )
    );
    assert_eq!(decoded, value);
}

#[test]
fn non_finite_floats_round_trip() {
    let registry = Registry::new();
    let shape = Shape::seq(Shape::float());
    let value = Value::seq([
        Value::Float(f64::NAN),
        Value::Float(f64::INFINITY),
        Value::Float(f64::NEG_INFINITY),
    ]);
    let (text, decoded) = round_trip(&registry, &shape, &value);
    assert_eq!(text, r#"["NaN", "Infinity", "-Infinity"]"#);
    let heap = Heap::new();
    assert!(graph_equal(&registry, &shape, (&value, &heap), (&decoded, &heap)).unwrap());
}

#[test]
fn native_collections_round_trip() {
    let nested: Vec<Option<Vec<String>>> = vec![None, Some(vec![]), Some(vec!["a\"b".into()])];
    let text = to_text(&nested).unwrap();
    assert_eq!(text, r#"[null, [], ["a\"b"]]"#);
    assert_eq!(from_text::<Vec<Option<Vec<String>>>>(&text).unwrap(), nested);

    let flags: BTreeSet<u8> = [3, 1, 200].into_iter().collect();
    let text = to_text(&flags).unwrap();
    assert_eq!(text, "[1, 3, 200]");
    assert_eq!(from_text::<BTreeSet<u8>>(&text).unwrap(), flags);
}

#[test]
fn store_to_writes_the_same_text() {
    let registry = Registry::new();
    let codec = Codec::new(&registry);
    let shape = Shape::seq(Shape::String);
    let value = Value::seq([Value::str("a"), Value::str("b")]);
    let mut out = Vec::new();
    let written = codec.store_to(&shape, &value, &Heap::new(), &mut out).unwrap();
    assert_eq!(written, out.len());
    assert_eq!(out, br#"["a", "b"]"#);

    let decoded = codec
        .load_from(out.as_slice(), &shape, &mut Heap::new())
        .unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn load_into_keeps_fields_missing_from_text() {
    let registry = Registry::new();
    let shape = Shape::Record(
        RecordShape::new("R")
            .field("a", Shape::int(IntWidth::I32))
            .field("b", Shape::String),
    );
    let mut target = Value::record([("a", Value::Int(1)), ("b", Value::str("kept"))]);
    Codec::new(&registry)
        .load_into(r#"{"a": 5}"#, &shape, &mut target, &mut Heap::new())
        .unwrap();
    assert_eq!(
        target,
        Value::record([("a", Value::Int(5)), ("b", Value::str("kept"))])
    );
}
