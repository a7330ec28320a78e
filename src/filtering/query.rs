use super::predicate::FilterSet;

/// Decode a raw query string into a [`FilterSet`].
///
/// Only the first value of a repeated parameter is kept. Parameters with an
/// empty name are ignored.
#[must_use]
pub fn parse_query(raw: Option<&str>) -> FilterSet {
    let mut filters = FilterSet::new();
    let Some(query) = raw else {
        return filters;
    };
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        filters
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    filters
}
