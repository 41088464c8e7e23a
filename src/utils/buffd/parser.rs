use {
    crate::{fixed::Fixed, object::ObjectId},
    bstr::ByteSlice,
    std::{collections::VecDeque, rc::Rc},
    thiserror::Error,
    uapi::OwnedFd,
};

#[derive(Debug, Error)]
pub enum MsgParserError {
    #[error("The message ended unexpectedly")]
    UnexpectedEof,
    #[error("The message contained a string of size 0")]
    EmptyString,
    #[error("The message contained a string without a terminating nul byte")]
    UnterminatedString,
    #[error("Message is missing a required file descriptor")]
    MissingFd,
    #[error("There is trailing data after the message")]
    TrailingData,
    #[error("String is not UTF-8")]
    NonUtf8,
    #[error("The id of a new object is 0")]
    NullNewId,
}

pub struct MsgParser<'a> {
    data: &'a [u8],
    pos: usize,
    fds: VecDeque<Rc<OwnedFd>>,
}

impl<'a> MsgParser<'a> {
    pub fn new(data: &'a [u8], fds: Vec<Rc<OwnedFd>>) -> Self {
        Self {
            data,
            pos: 0,
            fds: fds.into(),
        }
    }

    pub fn int(&mut self) -> Result<i32, MsgParserError> {
        if self.data.len() - self.pos < 4 {
            return Err(MsgParserError::UnexpectedEof);
        }
        let mut bytes = [0; 4];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(i32::from_ne_bytes(bytes))
    }

    pub fn uint(&mut self) -> Result<u32, MsgParserError> {
        self.int().map(|i| i as u32)
    }

    pub fn fixed(&mut self) -> Result<Fixed, MsgParserError> {
        self.int().map(Fixed)
    }

    pub fn object(&mut self) -> Result<ObjectId, MsgParserError> {
        self.uint().map(ObjectId::from_raw)
    }

    pub fn new_id(&mut self) -> Result<ObjectId, MsgParserError> {
        match self.object()? {
            ObjectId::NONE => Err(MsgParserError::NullNewId),
            id => Ok(id),
        }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], MsgParserError> {
        let cap = (len + 3) & !3;
        if cap > self.data.len() - self.pos {
            return Err(MsgParserError::UnexpectedEof);
        }
        let res = &self.data[self.pos..self.pos + len];
        self.pos += cap;
        Ok(res)
    }

    pub fn optional_string(&mut self) -> Result<Option<String>, MsgParserError> {
        let len = self.uint()? as usize;
        if len == 0 {
            return Ok(None);
        }
        let s = match self.bytes(len)?.split_last() {
            Some((0, s)) => s,
            _ => return Err(MsgParserError::UnterminatedString),
        };
        match s.to_str() {
            Ok(s) => Ok(Some(s.to_string())),
            _ => Err(MsgParserError::NonUtf8),
        }
    }

    pub fn string(&mut self) -> Result<String, MsgParserError> {
        self.optional_string()?.ok_or(MsgParserError::EmptyString)
    }

    pub fn array(&mut self) -> Result<Vec<u8>, MsgParserError> {
        let len = self.uint()? as usize;
        self.bytes(len).map(|b| b.to_vec())
    }

    pub fn fd(&mut self) -> Result<Rc<OwnedFd>, MsgParserError> {
        self.fds.pop_front().ok_or(MsgParserError::MissingFd)
    }

    pub fn eof(&self) -> Result<(), MsgParserError> {
        if self.pos == self.data.len() {
            Ok(())
        } else {
            Err(MsgParserError::TrailingData)
        }
    }
}
