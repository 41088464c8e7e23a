use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Displays an error followed by its sources.
///
/// The plain form joins the chain with `: `. The alternate form (`{:#}`)
/// prints every source on its own `caused by` line.
pub struct ErrorFmt<E>(pub E);

impl<E: Error> Display for ErrorFmt<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(e) = source {
            if f.alternate() {
                write!(f, "\n  caused by: {}", e)?;
            } else {
                write!(f, ": {}", e)?;
            }
            source = e.source();
        }
        Ok(())
    }
}
