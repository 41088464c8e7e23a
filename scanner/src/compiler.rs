#[cfg(test)]
mod tests;

use {
    crate::{
        ast::ProtocolDocument,
        error::{CompileError, WriteError},
        interface::{
            CompileContext, compile_events, compile_interface, events_module, events_name,
            proxy_module, proxy_name,
        },
    },
    std::{
        collections::BTreeSet,
        fmt::Write,
        fs,
        path::{Path, PathBuf},
        slice,
    },
};

#[derive(Clone, Debug)]
pub struct CompilerOptions {
    /// Path under which the generated code refers to the runtime crate.
    ///
    /// `crate` when the code is compiled into the runtime itself.
    pub runtime_path: String,
    /// Interface whose `bind` request has a dynamically typed new object.
    pub registry_interface: String,
    /// Interfaces generated elsewhere into the same module tree.
    pub extern_interfaces: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            runtime_path: "westfield".to_string(),
            registry_interface: "wl_registry".to_string(),
            extern_interfaces: vec![],
        }
    }
}

/// One generated module.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputUnit {
    pub module: String,
    pub type_name: String,
    pub contents: String,
}

impl OutputUnit {
    pub fn file_name(&self) -> String {
        format!("{}.rs", self.module)
    }
}

pub struct ProtocolCompiler {
    options: CompilerOptions,
}

impl ProtocolCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn compile(&self, document: &ProtocolDocument) -> Result<Vec<OutputUnit>, CompileError> {
        self.compile_all(slice::from_ref(document))
    }

    /// Compiles several documents into one module tree.
    ///
    /// Interfaces are compiled in document order. The first interface that
    /// fails aborts the whole run.
    pub fn compile_all(
        &self,
        documents: &[ProtocolDocument],
    ) -> Result<Vec<OutputUnit>, CompileError> {
        let mut interfaces = BTreeSet::new();
        for document in documents {
            for itf in &document.interfaces {
                if !interfaces.insert(itf.name.clone()) {
                    return Err(CompileError::DuplicateInterface(itf.name.clone()));
                }
            }
        }
        interfaces.extend(self.options.extern_interfaces.iter().cloned());
        let ctx = CompileContext {
            runtime_path: &self.options.runtime_path,
            registry_interface: &self.options.registry_interface,
            interfaces: &interfaces,
        };
        let mut units = vec![];
        for document in documents {
            let header = header(document);
            for itf in &document.interfaces {
                log::info!("Compiling interface {} version {}", itf.name, itf.version);
                let map_err = |e| CompileError::Interface(itf.name.clone(), e);
                let proxy = compile_interface(&ctx, itf).map_err(map_err)?;
                let events = compile_events(&ctx, itf).map_err(map_err)?;
                units.push(OutputUnit {
                    module: proxy_module(&itf.name),
                    type_name: proxy_name(&itf.name),
                    contents: format!("{}{}", header, proxy),
                });
                if let Some(events) = events {
                    units.push(OutputUnit {
                        module: events_module(&itf.name),
                        type_name: events_name(&itf.name),
                        contents: format!("{}{}", header, events),
                    });
                }
            }
        }
        Ok(units)
    }
}

fn header(document: &ProtocolDocument) -> String {
    let mut header = format!(
        "// Generated by westfield-scanner from protocol `{}`. Do not edit.\n",
        document.name
    );
    for block in &document.copyright {
        header.push_str("//\n");
        let lines: Vec<_> = block.lines().map(|l| l.trim_end()).collect();
        let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
        let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |e| e + 1);
        for line in &lines[start..end] {
            if line.is_empty() {
                header.push_str("//\n");
            } else {
                let _ = writeln!(header, "//{}", line);
            }
        }
    }
    header.push('\n');
    header
}

/// Renders `units` as inline modules of a single source file.
pub fn render_module(units: &[OutputUnit]) -> String {
    let mut out = String::new();
    for unit in units {
        let _ = writeln!(out, "pub mod {} {{", unit.module);
        out.push_str(&unit.contents);
        let _ = writeln!(out, "}}");
        out.push('\n');
    }
    write_reexports(&mut out, units);
    out
}

fn render_index(units: &[OutputUnit]) -> String {
    let mut out = String::from("// Generated by westfield-scanner. Do not edit.\n\n");
    for unit in units {
        let _ = writeln!(out, "pub mod {};", unit.module);
    }
    out.push('\n');
    write_reexports(&mut out, units);
    out
}

fn write_reexports(out: &mut String, units: &[OutputUnit]) {
    for unit in units {
        let _ = writeln!(out, "pub use {}::{};", unit.module, unit.type_name);
    }
}

/// Writes one file per unit and a `mod.rs` declaring them into `dir`.
///
/// If any file cannot be written, the files written so far are removed.
pub fn write_units(dir: &Path, units: &[OutputUnit]) -> Result<(), WriteError> {
    fs::create_dir_all(dir).map_err(|e| WriteError::CreateDir(dir.display().to_string(), e))?;
    let mut written = vec![];
    let res = write_files(dir, units, &mut written);
    if res.is_err() {
        for path in written {
            let _ = fs::remove_file(path);
        }
    }
    res
}

fn write_files(
    dir: &Path,
    units: &[OutputUnit],
    written: &mut Vec<PathBuf>,
) -> Result<(), WriteError> {
    let mut write = |path: PathBuf, contents: &str| -> Result<(), WriteError> {
        fs::write(&path, contents)
            .map_err(|e| WriteError::WriteFile(path.display().to_string(), e))?;
        written.push(path);
        Ok(())
    };
    for unit in units {
        write(dir.join(unit.file_name()), &unit.contents)?;
    }
    write(dir.join("mod.rs"), &render_index(units))
}
