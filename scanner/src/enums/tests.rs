use crate::{
    enums::{enum_type_name, write_enum_const, write_enum_type},
    parser::parse,
};

const TRANSFORM: &str = r#"
<protocol name="test">
  <interface name="wl_output" version="4">
    <enum name="transform">
      <description summary="transformation applied to buffer contents"/>
      <entry name="normal" value="0" summary="no transform"/>
      <entry name="90" value="1" summary="90 degrees counter-clockwise"/>
    </enum>
    <enum name="mode" bitfield="true" since="2">
      <entry name="current" value="0x1"/>
      <entry name="preferred" value="0x2"/>
    </enum>
  </interface>
</protocol>
"#;

#[test]
fn type_and_const() {
    let doc = parse(TRANSFORM.as_bytes()).unwrap();
    let itf = &doc.interfaces[0];
    let transform = &itf.enums[0];
    assert_eq!(enum_type_name(&itf.name, transform), "WlOutputTransform");

    let mut ty = String::new();
    write_enum_type(&mut ty, &itf.name, transform).unwrap();
    assert!(ty.contains("/// transformation applied to buffer contents\n"));
    assert!(ty.contains("pub struct WlOutputTransform {"));
    assert!(ty.contains("    /// 90 degrees counter-clockwise\n    pub _90: u32,"));

    let mut c = String::new();
    write_enum_const(&mut c, &itf.name, transform).unwrap();
    assert!(c.contains("pub const TRANSFORM: WlOutputTransform = WlOutputTransform {"));
    assert!(c.contains("        normal: 0,\n        _90: 1,\n"));
}

#[test]
fn bitfield() {
    let doc = parse(TRANSFORM.as_bytes()).unwrap();
    let itf = &doc.interfaces[0];
    let mode = &itf.enums[1];

    let mut ty = String::new();
    write_enum_type(&mut ty, &itf.name, mode).unwrap();
    assert!(ty.contains("/// The values of this enum are bit flags."));

    let mut c = String::new();
    write_enum_const(&mut c, &itf.name, mode).unwrap();
    assert!(c.contains("/// Since version 2."));
    assert!(c.contains("        current: 1,\n        preferred: 2,\n"));
}
