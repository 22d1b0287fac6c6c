/// Input adapters for the two source tables.
///
/// Everything that knows about CSV files, column names, and the
/// storm-start column heuristic lives under this module. The rest of the
/// pipeline works with the typed rows from `model` and never touches a
/// header name.

pub mod events;
pub mod schema;
pub mod site_table;

pub use events::read_event_table;
pub use site_table::read_site_table;
