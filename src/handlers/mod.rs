/// Handlers for `/profiles`: profile lifecycle.
pub mod profiles;

/// Handlers for `/profiles-search`: discovery searches and their results.
pub mod profile_search;
