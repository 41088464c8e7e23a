use {
    crate::{fixed::Fixed, object::ObjectId, utils::buffd::WireArg},
    std::rc::Rc,
    uapi::OwnedFd,
};

pub struct MsgFormatter<'a> {
    buf: &'a mut Vec<u8>,
    fds: &'a mut Vec<Rc<OwnedFd>>,
}

impl<'a> MsgFormatter<'a> {
    pub fn new(buf: &'a mut Vec<u8>, fds: &'a mut Vec<Rc<OwnedFd>>) -> Self {
        Self { buf, fds }
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn pad(&mut self) {
        let none = [0; 4];
        self.write(&none[..self.buf.len().wrapping_neg() & 3]);
    }

    pub fn int(&mut self, int: i32) -> &mut Self {
        self.write(uapi::as_bytes(&int));
        self
    }

    pub fn uint(&mut self, int: u32) -> &mut Self {
        self.write(uapi::as_bytes(&int));
        self
    }

    pub fn fixed(&mut self, fixed: Fixed) -> &mut Self {
        self.write(uapi::as_bytes(&fixed.0));
        self
    }

    pub fn optstr(&mut self, s: Option<&str>) -> &mut Self {
        match s {
            Some(s) => self.string(s),
            _ => self.uint(0),
        }
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        self.uint((s.len() + 1) as u32);
        self.write(s.as_bytes());
        self.write(&[0]);
        self.pad();
        self
    }

    pub fn array(&mut self, a: &[u8]) -> &mut Self {
        self.uint(a.len() as u32);
        self.write(a);
        self.pad();
        self
    }

    pub fn fd(&mut self, fd: Rc<OwnedFd>) -> &mut Self {
        self.fds.push(fd);
        self
    }

    pub fn object(&mut self, obj: ObjectId) -> &mut Self {
        self.uint(obj.raw())
    }

    pub fn arg(&mut self, arg: &WireArg<'_>, new_id: Option<ObjectId>) -> &mut Self {
        match arg {
            WireArg::Int(i) => self.int(*i),
            WireArg::Uint(u) => self.uint(*u),
            WireArg::Fixed(f) => self.fixed(*f),
            WireArg::String(s) => self.optstr(*s),
            WireArg::Object(o) => self.object(*o),
            WireArg::NewObject => self.object(new_id.unwrap_or(ObjectId::NONE)),
            WireArg::Array(a) => self.array(a),
            WireArg::Fd(fd) => self.fd(fd.clone()),
        }
    }
}
