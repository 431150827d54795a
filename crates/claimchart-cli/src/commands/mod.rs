//! Command implementations.

pub mod attach;
pub mod chart;
pub mod check;
pub mod extract;
pub mod refine;
pub mod review;

pub use self::attach::execute_attach;
pub use self::chart::{execute_delete, execute_list, execute_show};
pub use self::check::execute_check;
pub use self::extract::execute_extract;
pub use self::refine::execute_refine;
pub use self::review::{execute_accept, execute_diff, execute_history, execute_reject};
