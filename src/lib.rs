pub mod args;
pub mod browser;
pub mod domain;
pub mod grouping;
pub mod patterns;
pub mod query;
pub mod record;
pub mod render;
pub mod session;
pub mod sqlite;
pub mod stats;
pub mod utils;

pub use args::Args;
pub use browser::{delete_browser_history, search_browser_history};
pub use grouping::group_by_domain;
pub use patterns::init_default_patterns;
pub use query::{HistoryQuery, RangeChoice};
pub use record::{DomainGroup, VisitRecord};
pub use session::{QueryTicket, SearchResponse, SearchSession};
pub use stats::{ResultStats, SearchOutcome};
