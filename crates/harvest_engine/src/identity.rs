use harvest_core::{ConnectionCount, ConnectionIdentity};
use harvest_logging::{harvest_info, harvest_warn};

use crate::{ConnectionDirectory, DisplayedCountSource, LookupError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentities {
    pub identities: Vec<ConnectionIdentity>,
    pub count: ConnectionCount,
}

/// Enumerate the session's connections, bounded by the displayed count.
///
/// A displayed count of 0 short-circuits: no request is made and the list is
/// empty, even if the account has connections.
pub async fn resolve_identities(
    page: &dyn DisplayedCountSource,
    directory: &dyn ConnectionDirectory,
) -> Result<ResolvedIdentities, LookupError> {
    let displayed = page.displayed_count();
    if displayed == 0 {
        harvest_info!("Displayed connection count is 0; skipping enumeration");
        return Ok(ResolvedIdentities {
            identities: Vec::new(),
            count: ConnectionCount::new(0, 0),
        });
    }

    let identities = directory.list_connections(displayed, 0).await?;
    let count = ConnectionCount::new(displayed, identities.len());
    if count.is_consistent() {
        harvest_info!("Resolved {} connections", identities.len());
    } else {
        harvest_warn!(
            "Page shows {} connections but {} were enumerated",
            displayed,
            identities.len()
        );
    }
    Ok(ResolvedIdentities { identities, count })
}
