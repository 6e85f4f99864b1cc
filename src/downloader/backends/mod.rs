// Retrieval backends

pub mod stream;
pub mod ytdlp;

pub use stream::StreamBackend;
pub use ytdlp::{YtDlpBackend, YtDlpCli, YtDlpClient};
