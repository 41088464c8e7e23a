use crate::{
    compiler::{CompilerOptions, ProtocolCompiler, render_module, write_units},
    error::{CompileError, InterfaceError, MessageError},
    parser::parse,
};

const PROTOCOL: &str = r#"
<protocol name="example">
  <copyright>
    Copyright 2024 Example

    Permission is granted.
  </copyright>
  <interface name="wl_example" version="2">
    <request name="greet"><arg name="message" type="string"/></request>
    <event name="greeted"><arg name="reply" type="string"/></event>
  </interface>
  <interface name="wl_quiet">
    <request name="hush"/>
  </interface>
</protocol>
"#;

fn compiler() -> ProtocolCompiler {
    ProtocolCompiler::new(CompilerOptions::default())
}

#[test]
fn units() {
    let doc = parse(PROTOCOL.as_bytes()).unwrap();
    let units = compiler().compile(&doc).unwrap();
    let modules: Vec<_> = units.iter().map(|u| u.module.as_str()).collect();
    assert_eq!(
        modules,
        ["wl_example_proxy", "wl_example_events", "wl_quiet_proxy"]
    );
    let types: Vec<_> = units.iter().map(|u| u.type_name.as_str()).collect();
    assert_eq!(types, ["WlExampleProxy", "WlExampleEvents", "WlQuietProxy"]);
    for unit in &units {
        assert!(unit.contents.starts_with(
            "// Generated by westfield-scanner from protocol `example`. Do not edit.\n//\n//    Copyright 2024 Example\n//\n//    Permission is granted.\n"
        ));
    }
}

#[test]
fn fail_fast() {
    let doc = parse(
        br#"<protocol name="p">
              <interface name="a"><request name="r"/></interface>
              <interface name="b"><request name="r"><arg name="x" type="bogus"/></request></interface>
              <interface name="c"><request name="r"><arg name="y" type="bogus"/></request></interface>
            </protocol>"#,
    )
    .unwrap();
    match compiler().compile(&doc) {
        Err(CompileError::Interface(
            interface,
            InterfaceError::Request(request, MessageError::UnknownArgType { arg, .. }),
        )) => {
            assert_eq!(interface, "b");
            assert_eq!(request, "r");
            assert_eq!(arg, "x");
        }
        r => panic!("unexpected result: {:?}", r),
    }
}

#[test]
fn duplicate_interface() {
    let doc = parse(
        br#"<protocol name="p">
              <interface name="a"/>
              <interface name="a"/>
            </protocol>"#,
    )
    .unwrap();
    assert!(matches!(
        compiler().compile(&doc),
        Err(CompileError::DuplicateInterface(name)) if name == "a"
    ));
}

#[test]
fn cross_document_references() {
    let first = parse(
        br#"<protocol name="first">
              <interface name="wl_factory">
                <request name="create"><arg name="id" type="new_id" interface="ext_thing"/></request>
              </interface>
            </protocol>"#,
    )
    .unwrap();
    let second = parse(br#"<protocol name="second"><interface name="ext_thing"/></protocol>"#)
        .unwrap();
    assert!(compiler().compile(&first).is_err());
    let units = compiler().compile_all(&[first, second]).unwrap();
    assert_eq!(units.len(), 2);
    assert!(units[1].contents.starts_with("// Generated by westfield-scanner from protocol `second`."));
}

#[test]
fn extern_interfaces() {
    let doc = parse(
        br#"<protocol name="p">
              <interface name="ext_user">
                <request name="attach"><arg name="surface" type="object" interface="wl_surface"/></request>
              </interface>
            </protocol>"#,
    )
    .unwrap();
    assert!(compiler().compile(&doc).is_err());
    let compiler = ProtocolCompiler::new(CompilerOptions {
        extern_interfaces: vec!["wl_surface".to_string()],
        ..Default::default()
    });
    assert!(compiler.compile(&doc).is_ok());
}

#[test]
fn runtime_path() {
    let doc = parse(PROTOCOL.as_bytes()).unwrap();
    let compiler = ProtocolCompiler::new(CompilerOptions {
        runtime_path: "crate".to_string(),
        ..Default::default()
    });
    let units = compiler.compile(&doc).unwrap();
    assert!(units[0].contents.contains("use crate::connection::Connection;"));
    assert!(units[1].contents.contains("use crate::async_trait;"));
}

#[test]
fn inline_modules() {
    let doc = parse(PROTOCOL.as_bytes()).unwrap();
    let units = compiler().compile(&doc).unwrap();
    let module = render_module(&units);
    assert!(module.starts_with("pub mod wl_example_proxy {\n// Generated"));
    assert!(module.contains("pub mod wl_quiet_proxy {"));
    assert!(module.contains("pub use wl_example_events::WlExampleEvents;"));
    assert!(module.contains("pub use wl_quiet_proxy::WlQuietProxy;"));
}

#[test]
fn write_directory() {
    let doc = parse(PROTOCOL.as_bytes()).unwrap();
    let units = compiler().compile(&doc).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("protocol");
    write_units(&out, &units).unwrap();
    for unit in &units {
        let contents = std::fs::read_to_string(out.join(unit.file_name())).unwrap();
        assert_eq!(contents, unit.contents);
    }
    let index = std::fs::read_to_string(out.join("mod.rs")).unwrap();
    assert!(index.contains("pub mod wl_example_proxy;\npub mod wl_example_events;\npub mod wl_quiet_proxy;\n"));
    assert!(index.contains("pub use wl_example_proxy::WlExampleProxy;"));
}

#[test]
fn write_failure_removes_partial_output() {
    let doc = parse(PROTOCOL.as_bytes()).unwrap();
    let units = compiler().compile(&doc).unwrap();
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("mod.rs")).unwrap();
    assert!(write_units(dir.path(), &units).is_err());
    for unit in &units {
        assert!(!dir.path().join(unit.file_name()).exists());
    }
}
