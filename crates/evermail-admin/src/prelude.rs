pub use evermail_types::error::{EmResult, Error};

pub use tracing::{error, info, warn};

// vim: ts=4
