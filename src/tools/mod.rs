pub mod archive;
pub mod token_count;

pub use archive::{ArchiveSummary, ArchiveWriter};
pub use token_count::{TokenCountRequest, TokenCountWorkflow};
