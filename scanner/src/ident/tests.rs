use crate::ident::{safe_ident, screaming_snake_case, upper_camel_case};

#[test]
fn camel() {
    assert_eq!(upper_camel_case("wl_example"), "WlExample");
    assert_eq!(upper_camel_case("zwp_linux_dmabuf_v1"), "ZwpLinuxDmabufV1");
    assert_eq!(upper_camel_case("error"), "Error");
    assert_eq!(upper_camel_case("_leading__double_"), "LeadingDouble");
    assert_eq!(upper_camel_case("2d_shape"), "_2dShape");
}

#[test]
fn screaming() {
    assert_eq!(screaming_snake_case("error"), "ERROR");
    assert_eq!(screaming_snake_case("subpixel_mode"), "SUBPIXEL_MODE");
    assert_eq!(screaming_snake_case("interface"), "INTERFACE_");
}

#[test]
fn reserved() {
    assert_eq!(safe_ident("interface"), "interface_");
    assert_eq!(safe_ident("type"), "type_");
    assert_eq!(safe_ident("self"), "self_");
    assert_eq!(safe_ident("parser"), "parser_");
    assert_eq!(safe_ident("90"), "_90");
    assert_eq!(safe_ident("surface"), "surface");
}
