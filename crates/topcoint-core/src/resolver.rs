use crate::directory::AssetRecord;

/// Outcome of resolving a query fragment against a directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The fragment identified exactly one asset; carries the directory's
    /// stored symbol, not the client's spelling.
    Resolved(String),
    /// Ranked candidates in directory order; may be empty.
    Suggestions(Vec<AssetRecord>),
}

/// Resolve a query fragment against a directory snapshot.
///
/// The query is normalized to uppercase. An exact symbol match always wins
/// over partial matches; otherwise every record whose symbol or display name
/// starts with the normalized fragment is collected in directory order.
///
/// Pure function of its inputs: no side effects, never touches the network.
pub fn resolve(query: &str, directory: &[AssetRecord]) -> Resolution {
    let normalized = query.trim().to_ascii_uppercase();

    for record in directory {
        if record.symbol.eq_ignore_ascii_case(&normalized) {
            return Resolution::Resolved(record.symbol.clone());
        }
    }

    let suggestions = directory
        .iter()
        .filter(|record| {
            has_prefix(&record.symbol, &normalized) || has_prefix(&record.display_name, &normalized)
        })
        .cloned()
        .collect();

    Resolution::Suggestions(suggestions)
}

fn has_prefix(candidate: &str, normalized_query: &str) -> bool {
    candidate.to_ascii_uppercase().starts_with(normalized_query)
}
