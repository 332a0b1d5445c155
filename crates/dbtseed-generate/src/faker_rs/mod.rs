//! `fake`-crate backed implementation of [`crate::provider::ValueProvider`].

mod adapter;
pub mod locales;

pub use adapter::FakeValueProvider;
pub use locales::LocaleKey;
