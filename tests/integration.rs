//! Integration tests: encode, type maps, decode, typed records, frames and transport.

use flatwire::{
    build_typemap, decode, decode_str, derive_code_sequence, encode, take_record, ByteSink, ByteSource, CodecError,
    ContainerKind, FieldTag, FormatString, Frame, MemoryChannel, PrimitiveType, Record, RecordCodec, RecordSchema,
    TypeMap, Value, WireRecord,
};

fn person(name: &str, age: i16, height: f32) -> Value {
    Value::Record(Record::new("Person").with("name", name).with("age", age).with("height", height))
}

fn round_trip(v: &Value) -> Value {
    let enc = encode(v).expect("encode");
    let map = build_typemap(v).expect("type map");
    decode(&enc.bytes, &enc.format, &map).expect("decode")
}

#[test]
fn test_record_scenario() {
    let v = person("ab", 12, 1.5);
    let enc = encode(&v).expect("encode");
    assert_eq!(enc.format.to_string(), "2shf");
    assert_eq!(enc.format.packer_format(), "!2shf");
    assert_eq!(enc.bytes.len(), 2 + 2 + 4);
    assert_eq!(enc.format.byte_len(), enc.bytes.len());

    let map = build_typemap(&v).expect("type map");
    let back = decode(&enc.bytes, &enc.format, &map).expect("decode");
    let r = back.as_record().expect("record");
    assert_eq!(r.get("name").and_then(Value::as_str), Some("ab"));
    assert_eq!(r.get("age").and_then(Value::as_i16), Some(12));
    assert_eq!(r.get("height").and_then(Value::as_f32), Some(1.5));
}

#[test]
fn test_nested_tuple_scenario() {
    let v = Value::Tuple(vec![
        Value::List(vec![Value::I16(1), Value::I16(2), Value::I16(3)]),
        Value::Tuple(vec![Value::Float(4.0), Value::Float(5.0), Value::Float(6.0)]),
    ]);
    let map = build_typemap(&v).expect("type map");
    let TypeMap::Container(c) = &map else { panic!("expected container") };
    assert_eq!(c.element_count(), 2);
    assert_eq!(c.children.iter().map(TypeMap::size).collect::<Vec<_>>(), vec![3, 3]);
    assert_eq!(map.size(), 6);

    let back = round_trip(&v);
    assert_eq!(back, v);
    // Kinds survive: the list stays a list, the inner tuple stays a tuple.
    let Value::Tuple(items) = back else { panic!("expected tuple") };
    assert!(matches!(items[0], Value::List(_)));
    assert!(matches!(items[1], Value::Tuple(_)));
}

#[test]
fn test_non_ascii_string_scenario() {
    let v = Value::Record(Record::new("Label").with("text", "Ærø ✓").with("n", 1i16));
    let enc = encode(&v).expect("encode");
    // Æ, ø: 2 bytes each; r, space: 1 each; ✓: 3 bytes.
    assert_eq!(enc.format.to_string(), "9sh");
    assert_eq!(enc.bytes.len(), 11);
    assert_eq!(round_trip(&v), v);
}

#[test]
fn test_round_trip_mixed_shapes() {
    let axis = Record::new("Axis").with("id", "Q1").with("pos", 45.0f32).with("vel", 0.0f32).with("acc", 0.0f32);
    let values = vec![
        Value::Bool(true),
        Value::from("x"),
        Value::from(""),
        Value::from(b'\n'),
        Value::Double(-0.125),
        Value::List(vec![]),
        Value::Tuple(vec![Value::from(vec![11i16, 22, 33]), Value::Record(axis.clone()), Value::I16(2)]),
        Value::List(vec![
            Value::Tuple(vec![Value::from("jan"), Value::I16(18), Value::Float(9.9), Value::Bool(false)]),
            Value::List(vec![Value::List(vec![Value::List(vec![Value::Double(1.0)])])]),
        ]),
        Value::Record(Record::new("Outer").with("inner", axis).with("flags", vec![true, false, true])),
    ];
    for v in &values {
        assert_eq!(&round_trip(v), v, "round trip of {:?}", v);
    }
}

#[test]
fn test_size_invariant() {
    let v = Value::Tuple(vec![
        person("olsen", 33, 1.7),
        Value::from(vec![1.852f64, 77.0, 995.0]),
        Value::List(vec![Value::Tuple(vec![Value::from(b'a'), Value::Bool(true)])]),
    ]);
    let map = build_typemap(&v).expect("type map");
    let fmt = derive_code_sequence(&v).expect("format");
    assert_eq!(map.size(), fmt.leaf_count());
    assert_eq!(map.size(), fmt.stripped().len());
    assert_eq!(map.expected_format(), fmt.stripped());
}

#[test]
fn test_format_determinism() {
    let a = person("ab", 1, 2.0);
    let b = person("cd", -7, 99.5);
    assert_eq!(derive_code_sequence(&a).expect("a"), derive_code_sequence(&a).expect("a again"));
    assert_eq!(derive_code_sequence(&a).expect("a"), derive_code_sequence(&b).expect("b"));
    assert_eq!(build_typemap(&a).expect("a"), build_typemap(&b).expect("b"));
}

#[test]
fn test_template_map_decodes_other_string_lengths() {
    let template = person("", 0, 0.0);
    let map = build_typemap(&template).expect("type map");
    for name in ["", "a", "jens", "a much longer name than the template"] {
        let v = person(name, 35, 1.92);
        let enc = encode(&v).expect("encode");
        assert_eq!(decode(&enc.bytes, &enc.format, &map).expect("decode"), v);
    }
}

#[test]
fn test_mismatch_detection() {
    let v = person("ab", 12, 1.5);
    let enc = encode(&v).expect("encode");
    let map = build_typemap(&v).expect("type map");
    for bad in ["2shd", "2sfh", "2sh", "2shff", "h2sf", "?hf"] {
        let fmt = FormatString::parse(bad).expect("parse");
        let err = decode(&enc.bytes, &fmt, &map).expect_err(bad);
        assert!(matches!(err, CodecError::FormatMismatch { .. }), "{}: {}", bad, err);
    }
}

#[test]
fn test_stale_type_map_is_rejected() {
    let v = Value::Record(Record::new("R").with("a", vec![1i16, 2, 3]));
    let old_map = build_typemap(&Value::Record(Record::new("R").with("a", vec![0i16, 0]))).expect("type map");
    let enc = encode(&v).expect("encode");
    assert!(matches!(
        decode(&enc.bytes, &enc.format, &old_map),
        Err(CodecError::FormatMismatch { .. })
    ));
}

#[test]
fn test_truncated_payload() {
    let v = person("ab", 12, 1.5);
    let enc = encode(&v).expect("encode");
    let map = build_typemap(&v).expect("type map");
    let err = decode(&enc.bytes[..7], &enc.format, &map).expect_err("short payload");
    assert!(matches!(err, CodecError::Unpack(_)));
}

#[test]
fn test_decode_from_text_format() {
    let v = person("ab", 12, 1.5);
    let enc = encode(&v).expect("encode");
    let map = build_typemap(&v).expect("type map");
    assert_eq!(decode_str(&enc.bytes, "!2shf", &map).expect("decode"), v);
    assert_eq!(decode_str(&enc.bytes, "2s h f", &map).expect("decode"), v);
    assert!(matches!(decode_str(&enc.bytes, "<2shf", &map), Err(CodecError::FormatParse(_))));
}

#[test]
fn test_sets_rejected() {
    let set = Value::Set(vec![Value::I16(1), Value::I16(2)]);
    let nested = Value::Record(Record::new("R").with("tags", set.clone()));
    for v in [&set, &nested] {
        assert!(matches!(encode(v), Err(CodecError::UnsupportedShape(_))));
        assert!(matches!(build_typemap(v), Err(CodecError::UnsupportedShape(_))));
        assert!(matches!(derive_code_sequence(v), Err(CodecError::UnsupportedShape(_))));
    }
}

#[test]
fn test_unsupported_leaf_type() {
    let v = Value::Tuple(vec![Value::Bytes(vec![1, 2, 3])]);
    assert!(matches!(encode(&v), Err(CodecError::UnsupportedType(_))));
    assert!(matches!(build_typemap(&v), Err(CodecError::UnsupportedType(_))));
    assert!(matches!(build_typemap(&Value::Bytes(vec![])), Err(CodecError::UnsupportedType(_))));
}

#[test]
fn test_record_kind_in_type_map() {
    let map = build_typemap(&person("", 0, 0.0)).expect("type map");
    let TypeMap::Container(c) = map else { panic!("expected container") };
    match c.kind {
        ContainerKind::Record { name, fields } => {
            assert_eq!(name, "Person");
            assert_eq!(fields, vec!["name", "age", "height"]);
        }
        other => panic!("unexpected kind {:?}", other),
    }
}

// ==================== Typed records ====================

#[derive(Debug, Clone, PartialEq)]
struct Joystick {
    id: String,
    x: f32,
    y: f32,
    pb: bool,
}

impl Default for Joystick {
    fn default() -> Self {
        Joystick { id: "L".to_string(), x: 0.0, y: 0.0, pb: false }
    }
}

impl WireRecord for Joystick {
    fn schema() -> RecordSchema {
        RecordSchema::new("Joystick")
            .field("id", FieldTag::Primitive(PrimitiveType::Str))
            .field("x", FieldTag::Primitive(PrimitiveType::Float))
            .field("y", FieldTag::Primitive(PrimitiveType::Float))
            .field("pb", FieldTag::Primitive(PrimitiveType::Bool))
    }

    fn to_record(&self) -> Record {
        Record::new("Joystick").with("id", self.id.clone()).with("x", self.x).with("y", self.y).with("pb", self.pb)
    }

    fn from_record(mut r: Record) -> Result<Self, CodecError> {
        Ok(Joystick { id: r.take("id")?, x: r.take("x")?, y: r.take("y")?, pb: r.take("pb")? })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Gamepad {
    stick: Joystick,
    trims: Vec<f64>,
    seq: i16,
}

impl Default for Gamepad {
    fn default() -> Self {
        Gamepad { stick: Joystick::default(), trims: vec![0.0; 3], seq: 0 }
    }
}

impl WireRecord for Gamepad {
    fn schema() -> RecordSchema {
        RecordSchema::new("Gamepad")
            .field("stick", FieldTag::Record("Joystick"))
            .field("trims", FieldTag::List)
            .field("seq", FieldTag::Primitive(PrimitiveType::I16))
    }

    fn to_record(&self) -> Record {
        Record::new("Gamepad")
            .with("stick", self.stick.to_record())
            .with("trims", self.trims.clone())
            .with("seq", self.seq)
    }

    fn from_record(mut r: Record) -> Result<Self, CodecError> {
        Ok(Gamepad { stick: take_record(&mut r, "stick")?, trims: r.take("trims")?, seq: r.take("seq")? })
    }
}

#[test]
fn test_record_codec_round_trip() {
    let codec = RecordCodec::<Gamepad>::new().expect("codec");
    assert_eq!(codec.type_map().size(), 8);
    assert_eq!(codec.type_map().expected_format(), "sff?dddh");

    let pad = Gamepad {
        stick: Joystick { id: "R".into(), x: 0.25, y: -1.0, pb: true },
        trims: vec![0.1, 0.2, 0.3],
        seq: 42,
    };
    let enc = codec.encode(&pad).expect("encode");
    assert_eq!(enc.format.to_string(), "1sff?dddh");
    assert_eq!(codec.decode(&enc.bytes, &enc.format).expect("decode"), pad);
}

#[test]
fn test_record_codec_rejects_changed_list_length() {
    let codec = RecordCodec::<Gamepad>::new().expect("codec");
    let pad = Gamepad { trims: vec![1.0, 2.0], ..Gamepad::default() };
    let enc = codec.encode(&pad).expect("encode");
    assert!(matches!(codec.decode(&enc.bytes, &enc.format), Err(CodecError::FormatMismatch { .. })));
}

#[test]
fn test_record_codec_decode_into_keeps_target_on_error() {
    let codec = RecordCodec::<Joystick>::new().expect("codec");
    let mut target = Joystick { id: "keep".into(), x: 1.0, y: 2.0, pb: true };
    let before = target.clone();
    let enc = codec.encode(&Joystick::default()).expect("encode");
    let err = codec.decode_into(&mut target, &enc.bytes[..3], &enc.format).expect_err("short");
    assert!(matches!(err, CodecError::Unpack(_)));
    assert_eq!(target, before);
}

// ==================== Concurrency ====================

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_codec_types_are_send_sync() {
    assert_send_sync::<Value>();
    assert_send_sync::<TypeMap>();
    assert_send_sync::<FormatString>();
    assert_send_sync::<RecordCodec<Gamepad>>();
}

#[test]
fn test_shared_type_map_across_threads() {
    let template = person("", 0, 0.0);
    let map = build_typemap(&template).expect("type map");
    let inputs: Vec<Value> = (0..8i16).map(|i| person(&"x".repeat(i as usize), i, i as f32 * 0.5)).collect();

    let decoded: Vec<Value> = std::thread::scope(|s| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|v| {
                let map = &map;
                s.spawn(move || {
                    let enc = encode(v).expect("encode");
                    decode(&enc.bytes, &enc.format, map).expect("decode")
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("thread")).collect()
    });
    assert_eq!(decoded, inputs);
}

// ==================== Frames and transport ====================

#[test]
fn test_frame_over_memory_channel() {
    let codec = RecordCodec::<Joystick>::new().expect("codec");
    let stick = Joystick { id: "left".into(), x: 0.5, y: 0.75, pb: false };

    let mut channel = MemoryChannel::new();
    let frame = Frame::from_value(&Value::Record(stick.to_record())).expect("frame");
    channel.send(&frame.to_bytes().expect("bytes")).expect("send");

    let received = Frame::decode(&channel.receive(512).expect("receive")).expect("frame decode");
    let value = received.to_value(codec.type_map()).expect("decode");
    let Value::Record(r) = value else { panic!("expected record") };
    assert_eq!(Joystick::from_record(r).expect("typed"), stick);
}

#[test]
fn test_format_and_payload_sent_separately() {
    let v = person("ab", 12, 1.5);
    let map = build_typemap(&v).expect("type map");
    let enc = encode(&v).expect("encode");

    let mut channel = MemoryChannel::new();
    channel.send(enc.format.packer_format().as_bytes()).expect("send format");
    channel.send(&enc.bytes).expect("send payload");

    let fmt_text = String::from_utf8(channel.receive(64).expect("format")).expect("utf8");
    let payload = channel.receive(64).expect("payload");
    assert_eq!(decode_str(&payload, &fmt_text, &map).expect("decode"), v);
}
