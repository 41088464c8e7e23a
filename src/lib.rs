//! Runtime of the westfield protocol toolkit.
//!
//! The generated proxies in [`protocol`] are thin wrappers around
//! [`connection::Connection`]. Server implementations use
//! [`resource::Resource`].

#![allow(
    clippy::len_zero,
    clippy::needless_lifetimes,
    clippy::enum_variant_names,
    clippy::new_without_default,
    clippy::too_many_arguments,
    clippy::match_single_binding
)]

pub use {async_trait::async_trait, futures_util::future::LocalBoxFuture, uapi::OwnedFd};

pub mod connection;
pub mod destroy;
pub mod fixed;
pub mod object;
pub mod protocol;
pub mod proxy;
pub mod resource;
pub mod utils;
