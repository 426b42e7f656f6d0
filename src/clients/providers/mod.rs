//! Concrete scraper implementations. Individual providers are out of
//! scope (spec §1): everything here is a thin reqwest-based reference
//! implementation of the [`crate::clients::Scraper`] interface, shaped
//! like the teacher's `clients::nyaa::NyaaClient`, kept mainly to exercise
//! the registry and the pipeline in tests.

pub mod bilibili;
