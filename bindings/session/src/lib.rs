mod error;
mod session;
mod steady;

pub mod prelude {
    pub use crate::error::SessionError;
    pub use crate::session::{ClusterSession, ExecOutput};
}
