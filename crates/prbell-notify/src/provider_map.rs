use std::collections::HashMap;

use prbell_core::Degradation;

/// Mapping from GitHub login (or team slug) to chat mention id.
///
/// Parsed from a `login:mentionId` list separated by commas. A missing entry
/// and an entry without an id are both valid: formatters fall back to the raw
/// login.
///
/// # Examples
///
/// ```
/// use prbell_notify::provider_map::ProviderMap;
///
/// let map = ProviderMap::parse("alice:U1,bob");
/// assert_eq!(map.mention_id("alice"), Some("U1"));
/// assert_eq!(map.mention_id("bob"), None);
/// assert!(map.contains("bob"));
/// assert!(!map.contains("carol"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderMap {
    entries: HashMap<String, Option<String>>,
    malformed: Vec<String>,
}

impl ProviderMap {
    /// Parse a `login:id,login:id` list.
    ///
    /// Empty input yields an empty map. Entries without a `:` (or with an
    /// empty id) are kept with no id and remembered as malformed. When a login
    /// repeats, the last entry wins. Whitespace around entries is ignored and
    /// blank entries from stray commas are skipped.
    pub fn parse(input: &str) -> Self {
        let mut map = Self::default();

        for raw in input.split(',') {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }

            // Teams ids look like `29:1a2b...`, so only the first colon splits.
            let (login, id) = match entry.split_once(':') {
                Some((login, id)) => (login.trim(), Some(id.trim())),
                None => (entry, None),
            };
            let id = id.filter(|id| !id.is_empty()).map(str::to_string);

            if login.is_empty() {
                map.malformed.push(entry.to_string());
                continue;
            }
            if id.is_none() {
                map.malformed.push(entry.to_string());
            }
            map.entries.insert(login.to_string(), id);
        }

        map
    }

    /// Parse optional input; `None` is the same as an empty string.
    pub fn from_option(input: Option<&str>) -> Self {
        input.map(Self::parse).unwrap_or_default()
    }

    /// Mention id for `login`, if one is configured.
    pub fn mention_id(&self, login: &str) -> Option<&str> {
        self.entries.get(login).and_then(|id| id.as_deref())
    }

    /// Returns `true` if `login` appears in the map, even without an id.
    pub fn contains(&self, login: &str) -> bool {
        self.entries.contains_key(login)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw text of entries that could not be fully parsed, in input order.
    pub fn malformed_entries(&self) -> &[String] {
        &self.malformed
    }

    /// Malformed entries as run-report degradations.
    pub fn degradations(&self) -> Vec<Degradation> {
        self.malformed
            .iter()
            .map(|entry| Degradation::MalformedMapEntry {
                entry: entry.clone(),
            })
            .collect()
    }
}
