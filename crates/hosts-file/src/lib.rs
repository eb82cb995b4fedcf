//! Hosts file side of docker-hosts-writer.
//!
//! # Module Structure
//!
//! - [`block`]: managed block markers and the pure renderer
//! - [`writer`]: full-file overwrite with bounded retry (`RetryWriter`, `FileSink`)
//! - [`hosts`]: the file on disk (`HostsFile`)
//! - [`error`]: domain error type (`HostsFileError`)
//!
//! # Flow
//!
//! ```text
//! HostSnapshot --> HostsFile::read_lines --> block::render --> RetryWriter --> disk
//! ```

pub mod block;
pub mod error;
pub mod hosts;
pub mod writer;

pub use block::{BEGIN_MARKER, END_MARKER, render};
pub use error::HostsFileError;
pub use hosts::{HostsFile, short_id};
pub use writer::{FileSink, RetryWriter, StdFileSink};
