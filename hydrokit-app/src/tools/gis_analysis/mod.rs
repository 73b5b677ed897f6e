// private sub-module defined in other files
mod list_unique_values;
pub mod reclass_map;
mod reclassify_values;

// exports identifiers from private sub-modules in the current module namespace
pub use self::list_unique_values::ListUniqueValues;
pub use self::reclassify_values::ReclassifyValues;
