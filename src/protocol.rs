//! Proxies of the core protocol in `protocol/`.

include!(concat!(env!("OUT_DIR"), "/protocol.rs"));
