pub mod compress;
pub mod issue;
pub mod prepare;

pub use compress::{snapshot, CompressionPolicy};
pub use issue::{IssueOutcome, IssueRequest, IssueService, IssueSettings};
pub use prepare::{generate_verification_code, personalize_config, stored_render_job, template_variables};
