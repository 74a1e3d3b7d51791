pub mod parser;
pub mod reply;
pub mod request;

pub use parser::{ReadOutcome, RequestReader};
pub use reply::{Reply, ReplyWriter};
pub use request::Request;
