//! Query suite management: load, save, filter, split.

use std::path::Path;

use hcr_core::{Difficulty, HcrError, Query, QueryCategory};

/// A collection of benchmark queries with load/save/filter/split support.
#[derive(Debug, Clone, Default)]
pub struct QuerySuite {
    /// The queries, in file order.
    pub queries: Vec<Query>,
}

impl QuerySuite {
    /// Create a suite from queries.
    pub fn new(queries: Vec<Query>) -> Self {
        Self { queries }
    }

    /// Number of queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the suite is empty.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Load and validate queries from a JSON array file.
    ///
    /// # Errors
    ///
    /// `MissingArtifact` when the file does not exist; `InvalidQuery` when
    /// any query fails validation.
    pub fn load(path: &Path) -> Result<Self, HcrError> {
        if !path.exists() {
            return Err(HcrError::MissingArtifact(path.display().to_string()));
        }
        let queries: Vec<Query> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        for query in &queries {
            query.validate()?;
        }
        Ok(Self { queries })
    }

    /// Save queries to a JSON array file.
    pub fn save(&self, path: &Path) -> Result<(), HcrError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.queries)?)?;
        Ok(())
    }

    /// Queries whose 400-token budget feasibility matches `feasible`.
    pub fn filter_budget_feasible(&self, feasible: bool) -> Self {
        Self::new(
            self.queries
                .iter()
                .filter(|q| q.budget_feasible_400 == feasible)
                .cloned()
                .collect(),
        )
    }

    /// Queries of one category.
    pub fn filter_category(&self, category: QueryCategory) -> Self {
        Self::new(
            self.queries
                .iter()
                .filter(|q| q.category == category)
                .cloned()
                .collect(),
        )
    }

    /// Queries of one difficulty tier.
    pub fn filter_difficulty(&self, difficulty: Difficulty) -> Self {
        Self::new(
            self.queries
                .iter()
                .filter(|q| q.difficulty == difficulty)
                .cloned()
                .collect(),
        )
    }

    /// Prefix split into train/dev/test by the given fractions.
    pub fn split(&self, train: f64, dev: f64) -> (Self, Self, Self) {
        let n = self.queries.len();
        let train_end = (n as f64 * train) as usize;
        let dev_end = train_end + (n as f64 * dev) as usize;

        (
            Self::new(self.queries[..train_end].to_vec()),
            Self::new(self.queries[train_end..dev_end].to_vec()),
            Self::new(self.queries[dev_end..].to_vec()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(id: &str, category: QueryCategory, difficulty: Difficulty) -> Query {
        Query {
            id: id.to_string(),
            text: format!("query {id}"),
            category,
            difficulty,
            budget_feasible_400: true,
            gold_chunk_ids: vec!["c-0".to_string()],
            gold_answer: "answer".to_string(),
        }
    }

    fn sample_suite() -> QuerySuite {
        QuerySuite::new(vec![
            query("q-0", QueryCategory::SingleBranch, Difficulty::Easy),
            query("q-1", QueryCategory::MultiHop, Difficulty::Hard),
            query("q-2", QueryCategory::SingleBranch, Difficulty::Medium),
            query("q-3", QueryCategory::Comparative, Difficulty::Easy),
            query("q-4", QueryCategory::SingleBranch, Difficulty::Hard),
        ])
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.json");
        let suite = sample_suite();
        suite.save(&path).unwrap();

        let loaded = QuerySuite::load(&path).unwrap();
        assert_eq!(loaded.queries, suite.queries);
    }

    #[test]
    fn test_load_missing_file() {
        let err = QuerySuite::load(Path::new("/nonexistent/queries.json")).unwrap_err();
        assert!(matches!(err, HcrError::MissingArtifact(_)));
    }

    #[test]
    fn test_load_rejects_invalid_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queries.json");
        // Empty gold list is invalid
        std::fs::write(
            &path,
            r#"[{"id": "q-0", "text": "t", "category": "ood", "difficulty": "easy",
                "gold_chunk_ids": [], "gold_answer": "a"}]"#,
        )
        .unwrap();
        assert!(QuerySuite::load(&path).is_err());
    }

    #[test]
    fn test_filters() {
        let suite = sample_suite();
        assert_eq!(suite.filter_category(QueryCategory::SingleBranch).len(), 3);
        assert_eq!(suite.filter_difficulty(Difficulty::Easy).len(), 2);
        assert_eq!(suite.filter_budget_feasible(false).len(), 0);
    }

    #[test]
    fn test_split_fractions() {
        let suite = sample_suite();
        let (train, dev, test) = suite.split(0.6, 0.2);
        assert_eq!(train.len(), 3);
        assert_eq!(dev.len(), 1);
        assert_eq!(test.len(), 1);
        // No query lost or duplicated
        assert_eq!(train.len() + dev.len() + test.len(), suite.len());
    }
}
