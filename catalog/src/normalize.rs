use crate::volume::{ImageLinks, IndustryIdentifier, SearchResponse, Volume, VolumeInfo};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const NO_DESCRIPTION: &str = "No description available.";

const UNKNOWN_SEARCH_TITLE: &str = "Título desconhecido";
const UNKNOWN_SEARCH_AUTHOR: &str = "Autor desconhecido";

/// The internal book shape every consumer of the gateway depends on.
///
/// Always fully populated: absent upstream fields become defaults here,
/// so downstream persistence never branches on missing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub volume_id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover_url: Option<String>,
    pub published_date: Option<String>,
    pub page_count: Option<u32>,
    pub categories: Vec<String>,
    pub isbn: Option<String>,
}

/// Lighter shape used only for search listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub volume_id: String,
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub items: Vec<SearchItem>,
    pub total_items: i64,
}

/// Map an upstream volume into the internal book shape. Pure function,
/// no I/O.
pub fn normalize_book(volume: &Volume) -> BookRecord {
    let default_info = VolumeInfo::default();
    let info = volume.volume_info.as_ref().unwrap_or(&default_info);

    let cover_url = preferred_cover(info.image_links.as_ref()).map(secure_url);

    BookRecord {
        volume_id: volume.id.clone(),
        title: info
            .title
            .clone()
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        author: first_author(info.authors.as_deref())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        description: info
            .description
            .clone()
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        cover_url,
        published_date: info.published_date.clone(),
        page_count: info.page_count,
        categories: info.categories.clone().unwrap_or_default(),
        isbn: info.industry_identifiers.as_deref().and_then(extract_isbn),
    }
}

/// Map an upstream search response into listing summaries. Items without
/// a metadata block are dropped, but `total_items` stays the upstream's
/// reported total: it is advisory pagination data, never recomputed from
/// the filtered set.
pub fn normalize_search_results(response: &SearchResponse) -> SearchSummary {
    if response.items.is_empty() {
        return SearchSummary::default();
    }

    let items = response
        .items
        .iter()
        .filter_map(|item| {
            let info = item.volume_info.as_ref()?;
            Some(SearchItem {
                volume_id: item.id.clone(),
                title: info
                    .title
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_SEARCH_TITLE.to_string()),
                author: first_author(info.authors.as_deref())
                    .unwrap_or_else(|| UNKNOWN_SEARCH_AUTHOR.to_string()),
                // Listing covers keep the upstream scheme; only the
                // single-volume path rewrites to https.
                cover_url: preferred_cover(info.image_links.as_ref()),
            })
        })
        .collect();

    SearchSummary {
        items,
        total_items: response.total_items,
    }
}

/// ISBN_13 wins over ISBN_10; any other identifier type is ignored.
fn extract_isbn(identifiers: &[IndustryIdentifier]) -> Option<String> {
    let find = |kind: &str| {
        identifiers
            .iter()
            .find(|id| id.kind == kind)
            .map(|id| id.identifier.clone())
    };
    find("ISBN_13").or_else(|| find("ISBN_10"))
}

/// The larger thumbnail wins over the small one.
fn preferred_cover(links: Option<&ImageLinks>) -> Option<String> {
    links.and_then(|links| {
        links
            .thumbnail
            .clone()
            .or_else(|| links.small_thumbnail.clone())
    })
}

/// Cover assets must load over secure transport; upstream still hands
/// out plain-http URLs.
fn secure_url(url: String) -> String {
    match url.strip_prefix("http:") {
        Some(rest) => format!("https:{rest}"),
        None => url,
    }
}

fn first_author(authors: Option<&[String]>) -> Option<String> {
    authors.and_then(|authors| authors.first().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn volume_from(value: serde_json::Value) -> Volume {
        serde_json::from_value(value).unwrap()
    }

    fn response_from(value: serde_json::Value) -> SearchResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_book_applies_defaults() {
        let volume = volume_from(json!({ "id": "abcd1234efgh" }));

        let record = normalize_book(&volume);

        assert_eq!(record.volume_id, "abcd1234efgh");
        assert_eq!(record.title, UNKNOWN_TITLE);
        assert_eq!(record.author, UNKNOWN_AUTHOR);
        assert_eq!(record.description, NO_DESCRIPTION);
        assert_eq!(record.cover_url, None);
        assert_eq!(record.published_date, None);
        assert_eq!(record.page_count, None);
        assert!(record.categories.is_empty());
        assert_eq!(record.isbn, None);
    }

    #[test]
    fn test_normalize_book_takes_first_author_only() {
        let volume = volume_from(json!({
            "id": "abcd1234efgh",
            "volumeInfo": { "authors": ["Frank Herbert", "Brian Herbert"] }
        }));

        assert_eq!(normalize_book(&volume).author, "Frank Herbert");
    }

    #[test]
    fn test_normalize_book_prefers_isbn_13() {
        let volume = volume_from(json!({
            "id": "abcd1234efgh",
            "volumeInfo": {
                "industryIdentifiers": [
                    { "type": "ISBN_10", "identifier": "0441013597" },
                    { "type": "ISBN_13", "identifier": "9780441013593" }
                ]
            }
        }));

        assert_eq!(
            normalize_book(&volume).isbn.as_deref(),
            Some("9780441013593")
        );
    }

    #[test]
    fn test_normalize_book_accepts_isbn_10_when_13_is_absent() {
        let volume = volume_from(json!({
            "id": "abcd1234efgh",
            "volumeInfo": {
                "industryIdentifiers": [
                    { "type": "OTHER", "identifier": "OCLC:123" },
                    { "type": "ISBN_10", "identifier": "0441013597" }
                ]
            }
        }));

        assert_eq!(normalize_book(&volume).isbn.as_deref(), Some("0441013597"));
    }

    #[test]
    fn test_normalize_book_rewrites_cover_to_https() {
        let volume = volume_from(json!({
            "id": "abcd1234efgh",
            "volumeInfo": {
                "imageLinks": { "thumbnail": "http://books.example.com/cover.jpg" }
            }
        }));

        assert_eq!(
            normalize_book(&volume).cover_url.as_deref(),
            Some("https://books.example.com/cover.jpg")
        );
    }

    #[test]
    fn test_normalize_book_prefers_large_thumbnail() {
        let volume = volume_from(json!({
            "id": "abcd1234efgh",
            "volumeInfo": {
                "imageLinks": {
                    "thumbnail": "https://books.example.com/large.jpg",
                    "smallThumbnail": "https://books.example.com/small.jpg"
                }
            }
        }));

        assert_eq!(
            normalize_book(&volume).cover_url.as_deref(),
            Some("https://books.example.com/large.jpg")
        );
    }

    #[test]
    fn test_normalize_search_results_empty_input() {
        let summary = normalize_search_results(&SearchResponse::empty());
        assert!(summary.items.is_empty());
        assert_eq!(summary.total_items, 0);
    }

    #[test]
    fn test_normalize_search_results_filters_items_without_metadata() {
        // One well-formed item and one missing its metadata block. The
        // malformed item is dropped, yet the reported total stays the
        // upstream's figure: a known characteristic, not a bug.
        let response = response_from(json!({
            "totalItems": 2,
            "items": [
                { "id": "abcd1234efgh", "volumeInfo": { "title": "Dune" } },
                { "id": "ijkl5678mnop" }
            ]
        }));

        let summary = normalize_search_results(&response);

        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.items[0].title, "Dune");
        assert_eq!(summary.total_items, 2);
    }

    #[test]
    fn test_normalize_search_results_applies_listing_defaults() {
        let response = response_from(json!({
            "totalItems": 2,
            "items": [
                {
                    "id": "abcd1234efgh",
                    "volumeInfo": { "title": "Dune", "authors": ["Frank Herbert"] }
                },
                { "id": "ijkl5678mnop", "volumeInfo": {} }
            ]
        }));

        let summary = normalize_search_results(&response);

        assert_eq!(summary.items.len(), 2);
        assert_eq!(summary.items[0].title, "Dune");
        assert_eq!(summary.items[1].title, "Título desconhecido");
        assert_eq!(summary.items[1].author, "Autor desconhecido");
    }

    #[test]
    fn test_normalize_search_results_keeps_insecure_cover_scheme() {
        // Listing normalization deliberately skips the https rewrite the
        // single-volume path performs.
        let response = response_from(json!({
            "totalItems": 1,
            "items": [{
                "id": "abcd1234efgh",
                "volumeInfo": {
                    "imageLinks": { "smallThumbnail": "http://books.example.com/s.jpg" }
                }
            }]
        }));

        let summary = normalize_search_results(&response);

        assert_eq!(
            summary.items[0].cover_url.as_deref(),
            Some("http://books.example.com/s.jpg")
        );
    }
}
