// notarium-engine: background reconciliation primitives.
//
// Everything here runs off the interactive path: coalescing schedulers
// push note state toward the search index, and the draft cleanup prunes
// abandoned empty notes. All external effects are injected via traits so
// the engine itself owns no I/O.

pub mod cleanup;
pub mod coalesce;
pub mod config;
pub mod dedup;
pub mod guard;
pub mod search;
