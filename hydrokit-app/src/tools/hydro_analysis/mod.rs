// private sub-module defined in other files
pub mod pipeline;
pub mod toolkit;
mod watershed_delineation;
pub mod watershed_form;

// exports identifiers from private sub-modules in the current module namespace
pub use self::watershed_delineation::WatershedDelineation;
