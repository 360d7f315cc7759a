//! Per-month counts over a record directory.

use crate::models::PostRecord;
use chrono::Datelike;
use std::collections::BTreeMap;

/// Number of posts in one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCount {
    pub month: u32,
    pub posts: usize,
}

/// The months of one year that have posts, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearReport {
    pub year: i32,
    pub months: Vec<MonthCount>,
}

/// Posts bucketed by the local year and month of their date.
#[derive(Debug, Default)]
pub struct Archive<'a> {
    buckets: BTreeMap<(i32, u32), Vec<&'a PostRecord>>,
}

impl<'a> Archive<'a> {
    pub fn new(records: &'a [PostRecord]) -> Archive<'a> {
        let mut buckets: BTreeMap<(i32, u32), Vec<&'a PostRecord>> = BTreeMap::new();
        for record in records {
            buckets
                .entry((record.date.year(), record.date.month()))
                .or_default()
                .push(record);
        }
        Archive { buckets }
    }

    /// Years with posts, newest first; within a year, months newest first.
    pub fn summary(&self) -> Vec<YearReport> {
        let mut years: Vec<YearReport> = vec![];
        for (&(year, month), posts) in self.buckets.iter().rev() {
            if years.last().map(|y| y.year) != Some(year) {
                years.push(YearReport {
                    year,
                    months: vec![],
                });
            }
            if let Some(current) = years.last_mut() {
                current.months.push(MonthCount {
                    month,
                    posts: posts.len(),
                });
            }
        }
        years
    }

    /// Titles of the posts of one month, in record order.
    pub fn titles(&self, year: i32, month: u32) -> Vec<&'a str> {
        self.buckets
            .get(&(year, month))
            .map(|posts| posts.iter().map(|p| p.title.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn post(date: &str, title: &str) -> PostRecord {
        PostRecord {
            date: DateTime::parse_from_rfc3339(date).unwrap(),
            author: String::new(),
            author_id: 1,
            categories: vec![],
            title: title.into(),
            content: String::new(),
            comments: None,
            url: String::new(),
            media: vec![],
        }
    }

    #[test]
    fn buckets_newest_first() {
        let records = vec![
            post("2010-03-01T10:00:00+01:00", "a"),
            post("2012-01-05T10:00:00+01:00", "b"),
            post("2010-03-30T10:00:00+02:00", "c"),
            post("2010-11-30T10:00:00+01:00", "d"),
        ];
        let archive = Archive::new(&records);
        assert_eq!(
            archive.summary(),
            vec![
                YearReport {
                    year: 2012,
                    months: vec![MonthCount { month: 1, posts: 1 }],
                },
                YearReport {
                    year: 2010,
                    months: vec![
                        MonthCount { month: 11, posts: 1 },
                        MonthCount { month: 3, posts: 2 },
                    ],
                },
            ]
        );
        assert_eq!(archive.titles(2010, 3), vec!["a", "c"]);
        assert!(archive.titles(2011, 3).is_empty());
        assert_eq!(archive.total(), 4);
    }

    #[test]
    fn local_date_decides_the_month() {
        let records = vec![post("2010-04-01T00:30:00+02:00", "x")];
        let archive = Archive::new(&records);
        assert_eq!(archive.titles(2010, 4), vec!["x"]);
    }
}
