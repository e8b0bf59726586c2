/// User interface module
///
/// - Before/after comparison canvas (comparison.rs)
/// - Costume selection screen with photo upload (selector.rs)
/// - Processing screen (processing.rs)
/// - Result screen (result.rs)

pub mod comparison;
pub mod processing;
pub mod result;
pub mod selector;
