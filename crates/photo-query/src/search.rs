//! Boolean AND filter over photo tags.

use tracing::debug;

use photo_core::{normalize_name, Id, PhotoError, PhotoRecord, Result};
use photo_store::PhotoStore;

/// Tag groups to match, all of which a photo must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    groups: Vec<String>,
}

impl TagQuery {
    /// Word that separates one tag from the next on the command line.
    pub const SEPARATOR: &'static str = "-";

    /// Build a query from command-line words.
    ///
    /// Words between separators form one tag name, joined with single
    /// spaces, so `big cat - dog` asks for `big cat` and `dog`.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut groups = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for word in words {
            let word = word.as_ref();
            if word == Self::SEPARATOR {
                groups.push(current.join(" "));
                current.clear();
            } else {
                current.push(word.to_string());
            }
        }
        groups.push(current.join(" "));

        Self::from_groups(groups)
    }

    /// Build a query from tag names. Empty names are dropped.
    pub fn from_groups<I, S>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let groups: Vec<String> = groups
            .into_iter()
            .map(|group| normalize_name(group.as_ref()))
            .filter(|group| !group.is_empty())
            .collect();

        if groups.is_empty() {
            return Err(PhotoError::invalid_argument("no tags given"));
        }

        Ok(Self { groups })
    }

    /// Normalized tag names.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Concept ids for every group; fails on the first unknown name.
    pub fn resolve(&self, store: &PhotoStore) -> Result<Vec<Id>> {
        self.groups
            .iter()
            .map(|name| {
                store
                    .concept_id(name)
                    .ok_or_else(|| PhotoError::unknown_concept(name.clone()))
            })
            .collect()
    }
}

/// Photos carrying every tag of the query, in catalogue order.
pub fn find_photos<'a>(store: &'a PhotoStore, query: &TagQuery) -> Result<Vec<&'a PhotoRecord>> {
    let required = query.resolve(store)?;
    debug!("Searching for concepts {:?}", required);

    let matches: Vec<_> = store
        .photos()
        .iter()
        .filter(|photo| required.iter().all(|&tag| photo.has_tag(tag)))
        .collect();

    debug!("{} of {} photos match", matches.len(), store.photo_count());
    Ok(matches)
}

/// Relative paths of the photos carrying every tag of the query.
///
/// An unknown tag name fails the whole search; no partial result is
/// returned.
pub fn search<'a>(store: &'a PhotoStore, query: &TagQuery) -> Result<Vec<&'a str>> {
    Ok(find_photos(store, query)?
        .into_iter()
        .map(PhotoRecord::relative_path)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> PhotoStore {
        let mut store = PhotoStore::new();
        let tags: [&[&str]; 5] = [
            &["cat"],
            &["cat", "dog"],
            &["dog"],
            &["cat", "dog", "big cat"],
            &[],
        ];
        for (i, names) in tags.iter().enumerate() {
            let id = store.add_photo(format!("d{}", i), format!("{}.jpg", i)).unwrap();
            for name in names.iter() {
                store.tag_photo(id, name).unwrap();
            }
        }
        store
    }

    #[test]
    fn test_from_words_groups() {
        let query = TagQuery::from_words(["Big", "Cat", "-", "dog"]).unwrap();
        assert_eq!(query.groups(), ["big cat", "dog"]);

        let query = TagQuery::from_words(["-", "cat", "-", "-"]).unwrap();
        assert_eq!(query.groups(), ["cat"]);
    }

    #[test]
    fn test_from_words_empty() {
        let err = TagQuery::from_words(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        assert!(TagQuery::from_words(["-"]).is_err());
    }

    #[test]
    fn test_single_tag() {
        let store = sample_store();
        let query = TagQuery::from_words(["cat"]).unwrap();
        assert_eq!(search(&store, &query).unwrap(), vec!["0.jpg", "1.jpg", "3.jpg"]);
    }

    #[test]
    fn test_and_is_subset() {
        let store = sample_store();
        let cats = search(&store, &TagQuery::from_words(["cat"]).unwrap()).unwrap();
        let both = search(&store, &TagQuery::from_words(["cat", "-", "dog"]).unwrap()).unwrap();

        assert_eq!(both, vec!["1.jpg", "3.jpg"]);
        assert!(both.iter().all(|path| cats.contains(path)));
    }

    #[test]
    fn test_multi_word_tag() {
        let store = sample_store();
        let query = TagQuery::from_words(["BIG", "cat"]).unwrap();
        assert_eq!(search(&store, &query).unwrap(), vec!["3.jpg"]);
    }

    #[test]
    fn test_unknown_tag_fails_whole_search() {
        let store = sample_store();
        let query = TagQuery::from_words(["cat", "-", "unicorn"]).unwrap();
        match search(&store, &query) {
            Err(PhotoError::UnknownConcept { name }) => assert_eq!(name, "unicorn"),
            other => panic!("expected UnknownConcept, got {:?}", other),
        }
    }

    #[test]
    fn test_find_photos_records() {
        let store = sample_store();
        let query = TagQuery::from_groups(["dog"]).unwrap();
        let ids: Vec<_> = find_photos(&store, &query).unwrap().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_known_tag_with_no_photos() {
        let mut store = sample_store();
        store.add_concept("empty").unwrap();
        let query = TagQuery::from_groups(["empty"]).unwrap();
        assert!(search(&store, &query).unwrap().is_empty());
    }

    #[test]
    fn test_loaded_names_differing_in_case_match_together() {
        let (store, _) = photo_store::parse("0 \"cat\"\n1 \"Cat\"\n\nd0 \"a.jpg\" -tags 0\nd1 \"b.jpg\" -tags 1\n");
        let query = TagQuery::from_words(["cat"]).unwrap();
        assert_eq!(search(&store, &query).unwrap(), vec!["a.jpg", "b.jpg"]);
    }
}
