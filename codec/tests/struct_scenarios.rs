use codec::{
    read_from_slice, to_bytes, BinaryStruct, CodecError, CodecResult, FieldDescriptor, FieldRef,
    FieldValue, StructDefinitionError, StructReader, StructWriter, ValueKind,
};

#[derive(Debug, Default, PartialEq)]
struct TwoInts {
    first: u32,
    second: u32,
}

impl BinaryStruct for TwoInts {
    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::int(1, "first", 32),
            FieldDescriptor::int(2, "second", 32),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "first" => Some(FieldRef::int(self.first)),
            "second" => Some(FieldRef::int(self.second)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "first" => self.first = value.into_int()?,
            "second" => self.second = value.into_int()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct TwoBools {
    first: bool,
    second: bool,
}

impl BinaryStruct for TwoBools {
    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::bool(1, "first"),
            FieldDescriptor::bool(2, "second"),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "first" => Some(FieldRef::Bool(self.first)),
            "second" => Some(FieldRef::Bool(self.second)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "first" => self.first = value.into_bool()?,
            "second" => self.second = value.into_bool()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct Greeting {
    text: String,
}

impl BinaryStruct for Greeting {
    fn describe() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::string(1, "text", 12)]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        (name == "text").then_some(FieldRef::Str(&self.text))
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "text" => self.text = value.into_string()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct NibbleFlags {
    nibble: u8,
    a: bool,
    b: bool,
    c: bool,
    d: bool,
}

impl BinaryStruct for NibbleFlags {
    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::int(1, "nibble", 4),
            FieldDescriptor::bool(2, "a"),
            FieldDescriptor::bool(3, "b"),
            FieldDescriptor::bool(4, "c"),
            FieldDescriptor::bool(5, "d"),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        let value = match name {
            "nibble" => return Some(FieldRef::int(self.nibble)),
            "a" => self.a,
            "b" => self.b,
            "c" => self.c,
            "d" => self.d,
            _ => return None,
        };
        Some(FieldRef::Bool(value))
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "nibble" => self.nibble = value.into_int()?,
            "a" => self.a = value.into_bool()?,
            "b" => self.b = value.into_bool()?,
            "c" => self.c = value.into_bool()?,
            "d" => self.d = value.into_bool()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct Twelve {
    first: u16,
    second: u16,
}

impl BinaryStruct for Twelve {
    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::int(1, "first", 12),
            FieldDescriptor::int(2, "second", 12),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "first" => Some(FieldRef::int(self.first)),
            "second" => Some(FieldRef::int(self.second)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "first" => self.first = value.into_int()?,
            "second" => self.second = value.into_int()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct Sized8 {
    len: u8,
    text: String,
}

impl BinaryStruct for Sized8 {
    fn describe() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::int(1, "len", 8),
            FieldDescriptor::variable(2, "text", ValueKind::Str, "len"),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "len" => Some(FieldRef::int(self.len)),
            "text" => Some(FieldRef::Str(&self.text)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "len" => self.len = value.into_int()?,
            "text" => self.text = value.into_string()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct Nibble {
    value: u8,
}

impl BinaryStruct for Nibble {
    fn describe() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::int(1, "value", 4)]
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        (name == "value").then_some(FieldRef::int(self.value))
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> CodecResult<()> {
        match name {
            "value" => self.value = value.into_int()?,
            _ => return Err(CodecError::unknown_field::<Self>(name)),
        }
        Ok(())
    }
}

#[test]
fn two_32_bit_ints() {
    let value = TwoInts {
        first: 1,
        second: 2,
    };
    let bytes = to_bytes(&value).unwrap();
    assert_eq!(bytes, [0, 0, 0, 1, 0, 0, 0, 2]);

    let mut decoded = TwoInts::default();
    assert_eq!(read_from_slice(&mut decoded, &bytes).unwrap(), 8);
    assert_eq!(decoded, value);
}

#[test]
fn two_one_bit_bools() {
    let value = TwoBools {
        first: false,
        second: true,
    };
    let bytes = to_bytes(&value).unwrap();
    assert_eq!(bytes, [0b0100_0000]);

    let mut decoded = TwoBools::default();
    read_from_slice(&mut decoded, &bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn twelve_byte_string() {
    let value = Greeting {
        text: "hello world!".to_owned(),
    };
    let bytes = to_bytes(&value).unwrap();
    assert_eq!(bytes, b"hello world!");

    let mut decoded = Greeting::default();
    read_from_slice(&mut decoded, &bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn nibble_then_flags() {
    let value = NibbleFlags {
        nibble: 6,
        a: true,
        b: true,
        c: false,
        d: true,
    };
    let bytes = to_bytes(&value).unwrap();
    assert_eq!(bytes, [0b0110_1101]);

    let mut decoded = NibbleFlags::default();
    read_from_slice(&mut decoded, &bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn twelve_bit_fields_cross_byte_boundary() {
    let value = Twelve {
        first: 1,
        second: 2048,
    };
    let bytes = to_bytes(&value).unwrap();
    assert_eq!(bytes, [0x00, 0x18, 0x00]);

    let mut decoded = Twelve::default();
    read_from_slice(&mut decoded, &bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn variable_length_reads_declared_bytes_only() {
    let mut data = b"0123456".to_vec();
    data[0] = 3;

    let mut decoded = Sized8::default();
    let consumed = read_from_slice(&mut decoded, &data).unwrap();
    assert_eq!(decoded.len, 3);
    assert_eq!(decoded.text, "123");
    assert_eq!(consumed, 4);
}

#[test]
fn variable_length_writes_and_round_trips() {
    let value = Sized8 {
        len: 5,
        text: "topic".to_owned(),
    };
    let bytes = to_bytes(&value).unwrap();
    assert_eq!(bytes, b"\x05topic");

    let mut decoded = Sized8::default();
    read_from_slice(&mut decoded, &bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn variable_length_must_agree_with_length_field() {
    let value = Sized8 {
        len: 3,
        text: "ab".to_owned(),
    };
    let err = to_bytes(&value).unwrap_err();
    assert!(matches!(
        err,
        CodecError::LengthMismatch {
            field: "text",
            expected: 3,
            actual: 2
        }
    ));
}

#[test]
fn exhausted_source_is_an_error() {
    let mut decoded = TwoInts::default();
    let err = read_from_slice(&mut decoded, &[0, 0, 0, 1, 0, 0]).unwrap_err();
    assert!(matches!(
        err,
        CodecError::IncompleteData {
            field: "second",
            needed: 32,
            available: 16
        }
    ));

    let mut decoded = Sized8::default();
    let err = read_from_slice(&mut decoded, &[5, b'a']).unwrap_err();
    assert!(matches!(err, CodecError::IncompleteData { field: "text", .. }));

    let mut decoded = TwoBools::default();
    let err = read_from_slice(&mut decoded, &[]).unwrap_err();
    assert!(err.is_eof());
}

#[test]
fn partial_byte_carries_into_next_struct() {
    let mut reader = StructReader::new(&[0xAB][..]);
    let first: Nibble = reader.read_new().unwrap();
    assert!(!reader.cursor().is_aligned());

    let mut second = Nibble::default();
    let consumed = reader.read(&mut second).unwrap();
    assert_eq!(first.value, 0xA);
    assert_eq!(second.value, 0xB);
    assert_eq!(consumed, 0);
    assert_eq!(reader.bytes_read(), 1);

    let mut writer = StructWriter::new(Vec::new());
    writer.write(&first).unwrap();
    assert_eq!(writer.bytes_written(), 0);
    writer.write(&second).unwrap();
    assert_eq!(writer.close().unwrap(), [0xAB]);
}

#[test]
fn sub_byte_fields_occupy_ceil_total_bits() {
    let mut writer = StructWriter::new(Vec::new());
    for _ in 0..3 {
        writer
            .write(&Twelve {
                first: 0xFFF,
                second: 0,
            })
            .unwrap();
    }
    writer.write(&Nibble { value: 0xF }).unwrap();
    // 3 * 24 + 4 bits
    assert_eq!(writer.close().unwrap().len(), 10);
}

#[test]
fn wrong_value_kind_is_a_type_error() {
    #[derive(Default)]
    struct Confused {
        flag: bool,
    }

    impl BinaryStruct for Confused {
        fn describe() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::int(1, "flag", 8)]
        }

        fn field(&self, _name: &str) -> Option<FieldRef<'_>> {
            Some(FieldRef::Bool(self.flag))
        }

        fn set_field(&mut self, _name: &str, value: FieldValue) -> CodecResult<()> {
            self.flag = value.into_bool()?;
            Ok(())
        }
    }

    let err = to_bytes(&Confused { flag: true }).unwrap_err();
    assert!(matches!(
        err,
        CodecError::TypeMismatch {
            expected: ValueKind::Int,
            found: ValueKind::Bool
        }
    ));

    let err = read_from_slice(&mut Confused::default(), &[1]).unwrap_err();
    assert!(matches!(
        err,
        CodecError::TypeMismatch {
            expected: ValueKind::Bool,
            found: ValueKind::Int
        }
    ));
}

#[test]
fn invalid_definition_surfaces_on_use() {
    #[derive(Default)]
    struct Clash;

    impl BinaryStruct for Clash {
        fn describe() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::int(1, "a", 8), FieldDescriptor::int(1, "b", 8)]
        }

        fn field(&self, _name: &str) -> Option<FieldRef<'_>> {
            Some(FieldRef::Int(0))
        }

        fn set_field(&mut self, _name: &str, _value: FieldValue) -> CodecResult<()> {
            Ok(())
        }
    }

    let err = to_bytes(&Clash).unwrap_err();
    assert!(matches!(
        err,
        CodecError::Definition(StructDefinitionError::DuplicateIndex { index: 1, .. })
    ));
    let err = read_from_slice(&mut Clash, &[0, 0]).unwrap_err();
    assert!(matches!(err, CodecError::Definition(_)));
}

#[test]
fn missing_accessor_is_unknown_field() {
    #[derive(Default)]
    struct Forgetful;

    impl BinaryStruct for Forgetful {
        fn describe() -> Vec<FieldDescriptor> {
            vec![FieldDescriptor::int(1, "a", 8)]
        }

        fn field(&self, _name: &str) -> Option<FieldRef<'_>> {
            None
        }

        fn set_field(&mut self, name: &str, _value: FieldValue) -> CodecResult<()> {
            Err(CodecError::unknown_field::<Self>(name))
        }
    }

    let err = to_bytes(&Forgetful).unwrap_err();
    assert!(matches!(err, CodecError::UnknownField { ref field, .. } if field == "a"));
    let err = read_from_slice(&mut Forgetful, &[7]).unwrap_err();
    assert!(matches!(err, CodecError::UnknownField { .. }));
}
