mod check;
mod reload_database;
mod update_peer;

pub use check::*;
pub use reload_database::*;
pub use update_peer::*;
