//! Culture records and the lineage forest they form
//!
//! Every passage creates a child record pointing at its parent. Parentage is
//! fixed at creation, so the records form a forest rooted at founding cultures.

mod lineage;
mod record;

pub use lineage::{edges, LineageEdge, LineageIndex};
pub use record::{generate_id, CultureRecord, CultureStatus, NewCulture, ID_LEN};
