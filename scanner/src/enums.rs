#[cfg(test)]
mod tests;

use {
    crate::{
        ast::EnumDeclaration,
        ident::{safe_ident, screaming_snake_case, upper_camel_case},
        interface::write_description,
    },
    std::fmt::{self, Write},
};

pub fn enum_type_name(interface: &str, e: &EnumDeclaration) -> String {
    format!("{}{}", upper_camel_case(interface), upper_camel_case(&e.name))
}

/// Writes the struct holding the values of `e`.
pub fn write_enum_type<W: Write>(f: &mut W, interface: &str, e: &EnumDeclaration) -> fmt::Result {
    writeln!(f)?;
    write_description(f, "", e.description.as_ref())?;
    if e.bitfield {
        if e.description.is_some() {
            writeln!(f, "///")?;
        }
        writeln!(f, "/// The values of this enum are bit flags.")?;
    }
    writeln!(f, "#[derive(Copy, Clone, Debug, Eq, PartialEq)]")?;
    writeln!(f, "pub struct {} {{", enum_type_name(interface, e))?;
    for entry in &e.entries {
        if let Some(summary) = &entry.summary {
            writeln!(f, "    /// {}", summary.trim())?;
        }
        writeln!(f, "    pub {}: u32,", safe_ident(&entry.name))?;
    }
    writeln!(f, "}}")?;
    Ok(())
}

/// Writes the associated constant that attaches `e` to the proxy type.
pub fn write_enum_const<W: Write>(f: &mut W, interface: &str, e: &EnumDeclaration) -> fmt::Result {
    let ty = enum_type_name(interface, e);
    writeln!(f)?;
    let summary = e.description.as_ref().and_then(|d| d.summary.as_ref());
    if let Some(summary) = summary {
        writeln!(f, "    /// {}", summary.trim())?;
    }
    if let Some(since) = e.since {
        if summary.is_some() {
            writeln!(f, "    ///")?;
        }
        writeln!(f, "    /// Since version {}.", since)?;
    }
    writeln!(f, "    pub const {}: {} = {} {{", screaming_snake_case(&e.name), ty, ty)?;
    for entry in &e.entries {
        writeln!(f, "        {}: {},", safe_ident(&entry.name), entry.value)?;
    }
    writeln!(f, "    }};")?;
    Ok(())
}
