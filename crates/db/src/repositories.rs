/// CRUD and read queries over class slots (the class catalog)
pub mod class_slot;
/// Append-only credit transactions and cached balances (the credit ledger)
pub mod ledger;
