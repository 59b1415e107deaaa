use graphjson::{
    Codec, EnumShape, ErrorKind, Field, Heap, IntWidth, MarshalError, RecordShape, Registry, Shape,
    Value, Variant,
};

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.define(
        "Mode",
        Shape::Enum(EnumShape::new("Mode", ["blah", "bah", "other"])),
    );
    registry.define(
        "Obj",
        Shape::Record(
            RecordShape::new("Obj").field("name", Shape::String).variant(
                Variant::new("mode", Shape::named("Mode"))
                    .branch([0], vec![Field::new("x", Shape::int(IntWidth::I32))])
                    .branch(
                        [1],
                        vec![Field::new("y", Shape::String), Field::new("z", Shape::Bool)],
                    )
                    .otherwise(vec![]),
            ),
        ),
    );
    registry.define(
        "Base",
        Shape::Record(RecordShape::new("Base").field("id", Shape::int(IntWidth::I32))),
    );
    registry.define(
        "Derived",
        Shape::Record(
            RecordShape::new("Derived")
                .extends(Shape::named("Base"))
                .field("extra", Shape::String),
        ),
    );
    registry
}

#[test]
fn variant_record_writes_active_arm_only() {
    let registry = registry();
    let codec = Codec::new(&registry);
    let shape = Shape::named("Obj");
    let value = Value::record([
        ("name", Value::str("n")),
        ("mode", Value::Enum(0)),
        ("x", Value::Int(3)),
        ("y", Value::str("inactive")),
    ]);
    let text = codec.store(&shape, &value, &Heap::new()).unwrap();
    assert_eq!(text, r#"{"name": "n", "mode": "blah", "x": 3}"#);

    let decoded = codec.load(&text, &shape, &mut Heap::new()).unwrap();
    assert_eq!(
        decoded,
        Value::record([
            ("name", Value::str("n")),
            ("mode", Value::Enum(0)),
            ("x", Value::Int(3)),
        ])
    );

    let other = Value::record([("name", Value::str("o")), ("mode", Value::Enum(2))]);
    let text = codec.store(&shape, &other, &Heap::new()).unwrap();
    assert_eq!(text, r#"{"name": "o", "mode": "other"}"#);
}

#[test]
fn unknown_enumeration_member_is_rejected() {
    let registry = registry();
    let err = Codec::new(&registry)
        .load(
            r#"{"name": "n", "mode": "nope", "x": 3}"#,
            &Shape::named("Obj"),
            &mut Heap::new(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownMember);
    match err {
        MarshalError::NoSuchMember {
            enumeration,
            name,
            pos,
        } => {
            assert_eq!(enumeration, "Mode");
            assert_eq!(name, "nope");
            assert_eq!(pos.column, 23);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn decoded_tag_switches_the_arm() {
    let registry = registry();
    let decoded = Codec::new(&registry)
        .load(
            r#"{"name": "n", "mode": "bah", "y": "q", "z": true}"#,
            &Shape::named("Obj"),
            &mut Heap::new(),
        )
        .unwrap();
    assert_eq!(
        decoded,
        Value::record([
            ("name", Value::str("n")),
            ("mode", Value::Enum(1)),
            ("y", Value::str("q")),
            ("z", Value::Bool(true)),
        ])
    );
    assert!(decoded.field("x").is_none());
}

#[test]
fn fields_of_an_unselected_arm_are_unknown() {
    let registry = registry();
    let err = Codec::new(&registry)
        .load(
            r#"{"name": "n", "mode": "blah", "z": true}"#,
            &Shape::named("Obj"),
            &mut Heap::new(),
        )
        .unwrap_err();
    assert!(matches!(err, MarshalError::NoSuchField { ref name, .. } if name == "z"));
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn derived_fields_are_omitted_under_base_shape() {
    let registry = registry();
    let codec = Codec::new(&registry);
    let value = Value::record([("id", Value::Int(1)), ("extra", Value::str("e"))]);

    let text = codec.store(&Shape::named("Base"), &value, &Heap::new()).unwrap();
    assert_eq!(text, r#"{"id": 1}"#);
    let decoded = codec.load(&text, &Shape::named("Base"), &mut Heap::new()).unwrap();
    assert_eq!(decoded, Value::record([("id", Value::Int(1))]));

    let text = codec.store(&Shape::named("Derived"), &value, &Heap::new()).unwrap();
    assert_eq!(text, r#"{"id": 1, "extra": "e"}"#);
    let decoded = codec.load(&text, &Shape::named("Derived"), &mut Heap::new()).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn missing_declared_field_fails_to_store() {
    let registry = registry();
    let err = Codec::new(&registry)
        .store(
            &Shape::named("Derived"),
            &Value::record([("id", Value::Int(1))]),
            &Heap::new(),
        )
        .unwrap_err();
    assert!(matches!(err, MarshalError::MissingField { ref field, .. } if field == "extra"));
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[test]
fn duplicate_keys_keep_the_last_value() {
    let registry = registry();
    let decoded = Codec::new(&registry)
        .load(
            r#"{"id": 1, "id": 2}"#,
            &Shape::named("Base"),
            &mut Heap::new(),
        )
        .unwrap();
    assert_eq!(decoded.field("id"), Some(&Value::Int(2)));

    let outer = Shape::Record(RecordShape::new("Outer").field("inner", Shape::named("Derived")));
    let decoded = Codec::new(&registry)
        .load(
            r#"{"inner": {"id": 1, "extra": "stale"}, "inner": {"id": 3}}"#,
            &outer,
            &mut Heap::new(),
        )
        .unwrap();
    assert_eq!(
        decoded.field("inner"),
        Some(&Value::record([("id", Value::Int(3)), ("extra", Value::Str(None))]))
    );
}

#[test]
fn unknown_shape_name_is_reported() {
    let registry = registry();
    let err = Codec::new(&registry)
        .store(&Shape::named("Missing"), &Value::Bool(true), &Heap::new())
        .unwrap_err();
    assert!(matches!(err, MarshalError::UnknownShape(ref name) if name == "Missing"));
}
