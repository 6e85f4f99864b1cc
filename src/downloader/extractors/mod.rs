// Stream resolution for the stream backend
//
// The resolver turns a locator into format metadata; the stream backend
// picks an audio-only format from it and fetches it directly.

mod diagnostics;
mod python;
mod traits;

pub use diagnostics::{diagnose_error, BlockingReason};
pub use python::PythonInfoExtractor;
pub use traits::{ExtendedFormat, ExtendedVideoInfo, ResolveVariant, StreamResolver};
