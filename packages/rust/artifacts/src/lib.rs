//! Text generators for docpack's derived artifacts.
//!
//! Everything here is a pure function from already-built data to file
//! contents. Writing those contents to disk is `docpack-core`'s job.

mod bundle;
mod examples;

pub use bundle::{
    BundleSummary, ReferenceEntry, describe_reference, render_bundle_readme,
    render_interface_descriptor, render_lookup_script,
};
pub use examples::{ExampleSection, fence_for, render_examples};
