// Tailoring history: persistence seam, per-caller list cache, CRUD client, routes.
// Ownership always comes from the session; stores filter every query by owner.

pub mod cache;
pub mod client;
pub mod handlers;
pub mod memory;
pub mod store;
