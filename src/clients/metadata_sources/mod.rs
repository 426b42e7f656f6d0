//! Concrete metadata-source implementations. Individual providers are out
//! of scope (spec §1): this is a thin reqwest-based reference
//! implementation of [`crate::clients::MetadataSource`], kept mainly to
//! exercise the registry, the name-conversion step, and fill-if-empty
//! metadata enrichment in tests.

pub mod tmdb;
