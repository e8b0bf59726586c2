/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - The transformation workflow state machine (workflow.rs)
/// - The static costume catalog and custom costumes (catalog.rs)
/// - Session id generation (ids.rs)
/// - Persisted user settings (settings.rs)

pub mod catalog;
pub mod data;
pub mod ids;
pub mod settings;
pub mod workflow;
