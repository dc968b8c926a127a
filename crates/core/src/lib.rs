//! Favea core: the AI collection pipeline.
//!
//! Turns a keyword or URL into structured idol-event drafts in three
//! stages, each usable on its own:
//!
//! 1. [`robots::check_allowed`] — is automated retrieval of the target
//!    permitted by the site's robots.txt?
//! 2. [`fetch::fetch_page_content`] — Markdown rendering of the page via
//!    the reader service, truncated to a bounded size.
//! 3. [`extract::Extractor`] — language-model extraction of event and
//!    deadline records, with provenance stamped on every draft.
//!
//! Persistence of confirmed drafts lives in the server crate; this library
//! is network-only and holds no state.

pub mod draft;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod robots;

pub use draft::{DeadlineDraft, DeadlineType, EventDraft, ExtractionResult};
pub use error::{FaveaError, Result};
#[cfg(feature = "fetch")]
pub use extract::Extractor;
pub use extract::{ExtractorConfig, UNKNOWN_IDOL, build_prompt, parse_model_response};
#[cfg(feature = "fetch")]
pub use fetch::fetch_page_content;
pub use fetch::{MAX_CONTENT_LENGTH, ReaderConfig, TRUNCATION_MARKER, search_url_for_keyword, truncate_content};
#[cfg(feature = "fetch")]
pub use robots::check_allowed;
pub use robots::{CrawlDecision, RobotsConfig, RobotsRule, evaluate_policy, parse_robots_txt};
