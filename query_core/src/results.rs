use serde::{Deserialize, Serialize};

/// One page of results together with the total row count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResults<T> {
    /// Rows matched before OFFSET and LIMIT
    pub total: i64,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub results: Vec<T>,
}

impl<T> QueryResults<T> {
    pub fn new(total: i64, offset: Option<i64>, limit: Option<i64>, results: Vec<T>) -> Self {
        Self {
            total,
            offset,
            limit,
            results,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether rows remain after this page
    pub fn has_more(&self) -> bool {
        self.offset.unwrap_or(0) + (self.results.len() as i64) < self.total
    }
}

impl<T> IntoIterator for QueryResults<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_more() {
        let page = QueryResults::new(4, Some(1), Some(2), vec!["member3", "member2"]);
        assert!(page.has_more());
        assert_eq!(page.len(), 2);

        let last = QueryResults::new(4, Some(2), Some(2), vec!["member2", "member1"]);
        assert!(!last.has_more());
    }

    #[test]
    fn test_serialize() {
        let page = QueryResults::new(1, None, None, vec![10]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["results"][0], 10);
    }
}
