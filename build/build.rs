use {
    anyhow::{Context, Result},
    std::{env, fs, path::PathBuf},
    westfield_scanner::{CompilerOptions, ProtocolCompiler, parser::parse, render_module},
};

const PROTOCOL_DIR: &str = "protocol";

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=build/build.rs");
    println!("cargo:rerun-if-changed={}", PROTOCOL_DIR);
    let mut files = vec![];
    for file in fs::read_dir(PROTOCOL_DIR)? {
        let path = file?.path();
        if path.extension().is_some_and(|e| e == "xml") {
            files.push(path);
        }
    }
    files.sort();
    let mut documents = vec![];
    for file in &files {
        println!("cargo:rerun-if-changed={}", file.display());
        let contents = fs::read(file)?;
        let document =
            parse(&contents).with_context(|| format!("While parsing {}", file.display()))?;
        documents.push(document);
    }
    let compiler = ProtocolCompiler::new(CompilerOptions {
        runtime_path: "crate".to_string(),
        ..Default::default()
    });
    let units = compiler
        .compile_all(&documents)
        .context("Could not compile the protocols")?;
    let mut path = PathBuf::from(env::var("OUT_DIR")?);
    path.push("protocol.rs");
    fs::write(&path, render_module(&units))
        .with_context(|| format!("Could not write {}", path.display()))?;
    Ok(())
}
