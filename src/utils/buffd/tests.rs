use {
    crate::{
        fixed::Fixed,
        object::ObjectId,
        utils::buffd::{Message, MsgParserError, WireArg},
    },
    std::rc::Rc,
};

fn words(body: &[u8]) -> Vec<u32> {
    body.chunks(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn header() {
    let msg = Message::format(ObjectId::from_raw(3), 2, &[WireArg::Uint(7)], None);
    assert_eq!(msg.header(), [3, (12 << 16) | 2]);
}

#[test]
fn string_padding() {
    let msg = Message::format(
        ObjectId::from_raw(1),
        0,
        &[WireArg::String(Some("abc")), WireArg::String(Some("abcd"))],
        None,
    );
    assert_eq!(msg.body.len(), 4 + 4 + 4 + 8);
    assert_eq!(words(&msg.body[..4]), [4]);
    assert_eq!(&msg.body[4..8], b"abc\0");
    assert_eq!(words(&msg.body[8..12]), [5]);
    assert_eq!(&msg.body[12..20], b"abcd\0\0\0\0");
    let mut parser = msg.parser();
    assert_eq!(parser.string().unwrap(), "abc");
    assert_eq!(parser.string().unwrap(), "abcd");
    parser.eof().unwrap();
}

#[test]
fn null_string() {
    let msg = Message::format(ObjectId::from_raw(1), 0, &[WireArg::String(None)], None);
    assert_eq!(words(&msg.body), [0]);
    assert_eq!(msg.parser().optional_string().unwrap(), None);
    assert!(matches!(
        msg.parser().string(),
        Err(MsgParserError::EmptyString)
    ));
}

#[test]
fn arrays() {
    let msg = Message::format(
        ObjectId::from_raw(1),
        0,
        &[WireArg::Array(&[1, 2, 3, 4, 5]), WireArg::Array(&[])],
        None,
    );
    assert_eq!(msg.body.len(), 4 + 8 + 4);
    let mut parser = msg.parser();
    assert_eq!(parser.array().unwrap(), [1, 2, 3, 4, 5]);
    assert!(parser.array().unwrap().is_empty());
    parser.eof().unwrap();
}

fn single(arg: WireArg<'_>) -> Message {
    Message::format(ObjectId::from_raw(1), 0, &[arg], Some(ObjectId::from_raw(9)))
}

#[test]
fn every_argument_type_round_trips() {
    let fd = Rc::new(uapi::memfd_create("round-trip", 0).unwrap());
    for nullable in [false, true] {
        assert_eq!(single(WireArg::Int(i32::MIN)).parser().int().unwrap(), i32::MIN);
        assert_eq!(single(WireArg::Uint(u32::MAX)).parser().uint().unwrap(), u32::MAX);
        let fixed = Fixed::from_f64(-2.25);
        assert_eq!(single(WireArg::Fixed(fixed)).parser().fixed().unwrap().0, fixed.0);
        assert_eq!(
            single(WireArg::NewObject).parser().new_id().unwrap(),
            ObjectId::from_raw(9)
        );
        for array in [&[][..], &[1, 2, 3][..]] {
            assert_eq!(single(WireArg::Array(array)).parser().array().unwrap(), array);
        }
        let parsed = single(WireArg::Fd(fd.clone())).parser().fd().unwrap();
        assert_eq!(parsed.raw(), fd.raw());
        let id = ObjectId::from_raw(7);
        if nullable {
            for s in [None, Some(""), Some("abc")] {
                let msg = single(WireArg::String(s));
                assert_eq!(msg.parser().optional_string().unwrap().as_deref(), s);
            }
            for o in [ObjectId::NONE, id] {
                assert_eq!(single(WireArg::Object(o)).parser().object().unwrap(), o);
            }
        } else {
            for s in ["", "abc"] {
                let msg = single(WireArg::String(Some(s)));
                assert_eq!(msg.parser().string().unwrap(), s);
            }
            assert_eq!(single(WireArg::Object(id)).parser().object().unwrap(), id);
        }
    }
}

#[test]
fn numbers_and_objects() {
    let msg = Message::format(
        ObjectId::from_raw(1),
        0,
        &[
            WireArg::Int(-5),
            WireArg::Fixed(Fixed::from_f64(1.5)),
            WireArg::Object(ObjectId::NONE),
            WireArg::NewObject,
        ],
        Some(ObjectId::from_raw(9)),
    );
    let mut parser = msg.parser();
    assert_eq!(parser.int().unwrap(), -5);
    assert_eq!(parser.fixed().unwrap().to_f64(), 1.5);
    assert_eq!(parser.object().unwrap(), ObjectId::NONE);
    assert_eq!(parser.new_id().unwrap(), ObjectId::from_raw(9));
    parser.eof().unwrap();
}

#[test]
fn null_new_id() {
    let msg = Message::format(ObjectId::from_raw(1), 0, &[WireArg::Uint(0)], None);
    assert!(matches!(
        msg.parser().new_id(),
        Err(MsgParserError::NullNewId)
    ));
}

#[test]
fn fds_are_out_of_band() {
    let fd = Rc::new(uapi::memfd_create("test", 0).unwrap());
    let msg = Message::format(
        ObjectId::from_raw(1),
        0,
        &[WireArg::Fd(fd.clone()), WireArg::Int(1)],
        None,
    );
    assert_eq!(msg.body.len(), 4);
    assert_eq!(msg.fds.len(), 1);
    let mut parser = msg.parser();
    assert_eq!(parser.fd().unwrap().raw(), fd.raw());
    assert!(matches!(parser.fd(), Err(MsgParserError::MissingFd)));
}

#[test]
fn truncated() {
    let mut msg = Message::format(
        ObjectId::from_raw(1),
        0,
        &[WireArg::String(Some("hello"))],
        None,
    );
    msg.body.truncate(6);
    assert!(matches!(
        msg.parser().string(),
        Err(MsgParserError::UnexpectedEof)
    ));
    assert!(matches!(
        msg.parser().eof(),
        Err(MsgParserError::TrailingData)
    ));
}

#[test]
fn unterminated_string() {
    let mut body = 4u32.to_ne_bytes().to_vec();
    body.extend_from_slice(b"abcd");
    let msg = Message {
        object: ObjectId::from_raw(1),
        opcode: 0,
        body,
        fds: vec![],
    };
    assert!(matches!(
        msg.parser().string(),
        Err(MsgParserError::UnterminatedString)
    ));
}
