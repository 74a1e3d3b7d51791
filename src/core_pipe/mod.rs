pub mod pipe;
pub mod stream;

pub use pipe::{BytePipe, DuplexPipe, PipeRead};
pub use stream::PipeStream;
