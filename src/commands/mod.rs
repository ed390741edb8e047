pub mod branches;
pub mod checkout;
pub mod group;
pub mod repo;
pub mod status;
pub mod watch;

pub use branches::*;
pub use checkout::*;
pub use group::*;
pub use repo::*;
pub use status::*;
pub use watch::*;
