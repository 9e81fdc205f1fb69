/// Credit ledger entries and balance types
pub mod ledger;
/// Read-side credit summaries grouped by time bucket
pub mod report;
/// Class slots and their lifecycle
pub mod slot;
