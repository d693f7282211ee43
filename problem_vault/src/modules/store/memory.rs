use super::{search_terms, Listing, ProblemStore, Result, Upserted, TOP_TAG_COUNT};
use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use problem_vault_libs::api::{
    NewProblem, ProblemListParameter, ProblemRecord, ProblemStats, TagCount,
};
use std::{cmp::Ordering, collections::BTreeMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    last_id: i64,
    records: Vec<ProblemRecord>,
}

/// Store kept in process memory. Used by `server --in-memory` and by the tests.
#[derive(Debug, Default)]
pub struct MemoryProblemStore {
    state: RwLock<State>,
}

impl MemoryProblemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// title weighs most, the solution least
fn relevance(record: &ProblemRecord, terms: &[String]) -> u32 {
    let tags = record.tags.iter().join(" ");
    let fields: [(&str, u32); 5] = [
        (&record.title, 8),
        (&tags, 4),
        (&record.difficulty, 4),
        (&record.description, 2),
        (&record.solution, 1),
    ];
    let fields: Vec<(Vec<String>, u32)> = fields
        .iter()
        .map(|(text, weight)| (search_terms(text), *weight))
        .collect();

    terms
        .iter()
        .map(|term| {
            fields
                .iter()
                .filter(|(words, _)| words.contains(term))
                .map(|(_, weight)| weight)
                .sum::<u32>()
        })
        .sum()
}

fn newest_first(a: &ProblemRecord, b: &ProblemRecord) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

#[async_trait]
impl ProblemStore for MemoryProblemStore {
    async fn list(&self, params: &ProblemListParameter) -> Result<Listing> {
        let state = self.state.read().await;
        let tags = params.tag_list();
        let terms = params.search().map(search_terms);

        let mut matched: Vec<(u32, &ProblemRecord)> = state
            .records
            .iter()
            .filter(|record| {
                params
                    .difficulty()
                    .map_or(true, |difficulty| record.difficulty == difficulty)
            })
            .filter(|record| params.user_id().map_or(true, |user_id| record.user_id == user_id))
            .filter(|record| tags.is_empty() || record.tags.iter().any(|tag| tags.contains(tag)))
            .filter_map(|record| match &terms {
                Some(terms) => {
                    let score = relevance(record, terms);
                    (score > 0).then_some((score, record))
                }
                None => Some((0, record)),
            })
            .collect();

        matched.sort_by(|(score_a, a), (score_b, b)| {
            score_b.cmp(score_a).then_with(|| newest_first(a, b))
        });

        let total = matched.len() as u64;
        let problems = matched
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.limit() as usize)
            .map(|(_, record)| record.clone())
            .collect();

        Ok(Listing { problems, total })
    }

    async fn get(&self, id: i64) -> Result<Option<ProblemRecord>> {
        let state = self.state.read().await;
        Ok(state.records.iter().find(|record| record.id == id).cloned())
    }

    async fn upsert(&self, problem: NewProblem) -> Result<Upserted> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let existing = state
            .records
            .iter()
            .position(|record| record.url == problem.url);
        let id = match existing {
            Some(index) => state.records[index].id,
            None => {
                state.last_id += 1;
                state.last_id
            }
        };

        let record = ProblemRecord {
            id,
            title: problem.title,
            url: problem.url,
            difficulty: problem.difficulty,
            description: problem.description,
            solution: problem.solution,
            test_cases: problem.test_cases,
            tags: problem.tags,
            user_id: problem.user_id,
            user_email: problem.user_email,
            created_at: now,
            updated_at: now,
        };

        match existing {
            Some(index) => {
                state.records[index] = record.clone();
                Ok(Upserted::Updated(record))
            }
            None => {
                state.records.push(record.clone());
                Ok(Upserted::Created(record))
            }
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.state.read().await.records.len() as u64)
    }

    async fn stats(&self) -> Result<ProblemStats> {
        let state = self.state.read().await;

        let mut difficulties: BTreeMap<String, u64> = BTreeMap::new();
        let mut tags: BTreeMap<&str, u64> = BTreeMap::new();
        for record in state.records.iter() {
            *difficulties.entry(record.difficulty.clone()).or_default() += 1;
            for tag in record.tags.iter() {
                *tags.entry(tag.as_str()).or_default() += 1;
            }
        }

        // BTreeMap iterates by name, and the sort is stable, so ties stay alphabetical.
        let top_tags = tags
            .into_iter()
            .sorted_by(|(_, a), (_, b)| b.cmp(a))
            .take(TOP_TAG_COUNT)
            .map(|(tag, count)| TagCount {
                tag: tag.to_string(),
                count,
            })
            .collect();

        Ok(ProblemStats {
            total_problems: state.records.len() as u64,
            difficulties,
            top_tags,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    fn problem(title: &str, slug: &str, difficulty: &str, tags: &[&str]) -> NewProblem {
        NewProblem {
            title: String::from(title),
            url: format!("https://leetcode.com/problems/{}", slug),
            difficulty: String::from(difficulty),
            description: String::new(),
            solution: String::new(),
            test_cases: vec![],
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            user_id: String::from("anonymous"),
            user_email: String::new(),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_the_record_for_the_same_url() {
        let store = MemoryProblemStore::new();

        let first = store
            .upsert(problem("Two Sum", "two-sum", "Easy", &["Array"]))
            .await
            .unwrap();
        assert!(first.is_created());
        let first = first.into_record();

        let mut changed = problem("Two Sum (revisited)", "two-sum", "Medium", &[]);
        changed.solution = String::from("class Solution {}");
        let second = store.upsert(changed).await.unwrap();
        assert!(!second.is_created());
        let second = second.into_record();

        assert_eq!(second.id, first.id);
        assert_eq!(second.title, "Two Sum (revisited)");
        assert_eq!(second.difficulty, "Medium");
        assert!(second.tags.is_empty());
        assert!(second.created_at >= first.created_at);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_upserts_of_one_url_leave_one_record() {
        let store = Arc::new(MemoryProblemStore::new());

        let tasks = (0..16).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .upsert(problem(&format!("Two Sum {}", i), "two-sum", "Easy", &[]))
                    .await
                    .unwrap()
            })
        });
        let outcomes = futures::future::join_all(tasks).await;

        let created = outcomes
            .into_iter()
            .filter(|outcome| outcome.as_ref().unwrap().is_created())
            .count();
        assert_eq!(created, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_filters_are_conjunctive() {
        let store = MemoryProblemStore::new();
        store.upsert(problem("Two Sum", "two-sum", "Easy", &["Array", "Hash Table"])).await.unwrap();
        store.upsert(problem("LRU Cache", "lru-cache", "Medium", &["Design", "Hash Table"])).await.unwrap();
        store.upsert(problem("Trapping Rain Water", "trapping-rain-water", "Hard", &["Array"])).await.unwrap();

        let params = ProblemListParameter::default().with_tags(["Hash Table", "Design"]);
        let listing = store.list(&params).await.unwrap();
        assert_eq!(listing.total, 2);

        let params = ProblemListParameter {
            difficulty: Some(String::from("Easy")),
            ..Default::default()
        }
        .with_tags(["Array"]);
        let listing = store.list(&params).await.unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.problems[0].title, "Two Sum");
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let store = MemoryProblemStore::new();
        for i in 0..5 {
            store
                .upsert(problem(&format!("Problem {}", i), &format!("p-{}", i), "Easy", &[]))
                .await
                .unwrap();
        }

        let params = ProblemListParameter {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        };
        let listing = store.list(&params).await.unwrap();

        assert_eq!(listing.total, 5);
        let titles: Vec<&str> = listing.problems.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Problem 2", "Problem 1"]);
    }

    #[tokio::test]
    async fn search_orders_by_relevance() {
        let store = MemoryProblemStore::new();
        store.upsert(problem("Two Sum", "two-sum", "Easy", &["Array"])).await.unwrap();
        store.upsert(problem("Add Two Numbers", "add-two-numbers", "Medium", &["Linked List"])).await.unwrap();
        store.upsert(problem("Valid Parentheses", "valid-parentheses", "Easy", &["Stack"])).await.unwrap();

        let params = ProblemListParameter {
            search: Some(String::from("two sum")),
            ..Default::default()
        };
        let listing = store.list(&params).await.unwrap();

        let titles: Vec<&str> = listing.problems.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Two Sum", "Add Two Numbers"]);
        assert_eq!(listing.total, 2);
    }

    #[tokio::test]
    async fn stats_count_difficulties_and_tags() {
        let store = MemoryProblemStore::new();
        store.upsert(problem("A", "a", "easy", &["Array", "Math"])).await.unwrap();
        store.upsert(problem("B", "b", "easy", &["Array"])).await.unwrap();
        store.upsert(problem("C", "c", "hard", &["Graph", "Math"])).await.unwrap();

        let stats = store.stats().await.unwrap();

        assert_eq!(stats.total_problems, 3);
        assert_eq!(
            stats.difficulties,
            BTreeMap::from([(String::from("easy"), 2), (String::from("hard"), 1)])
        );
        assert_eq!(
            stats.top_tags,
            vec![
                TagCount { tag: String::from("Array"), count: 2 },
                TagCount { tag: String::from("Math"), count: 2 },
                TagCount { tag: String::from("Graph"), count: 1 },
            ]
        );
    }
}
