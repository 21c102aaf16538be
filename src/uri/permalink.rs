//! Permalink structures like ``/%year%/%monthnum%/%postname%/``
use chrono::{Datelike, NaiveDateTime, Timelike};
use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tag {
    Year,
    MonthNum,
    Day,
    Hour,
    Minute,
    Second,
    PostId,
    PostName,
    Category,
    Author,
}

impl Tag {
    const ALL: [(&'static str, Tag); 10] = [
        ("%year%", Tag::Year),
        ("%monthnum%", Tag::MonthNum),
        ("%day%", Tag::Day),
        ("%hour%", Tag::Hour),
        ("%minute%", Tag::Minute),
        ("%second%", Tag::Second),
        ("%post_id%", Tag::PostId),
        ("%postname%", Tag::PostName),
        ("%category%", Tag::Category),
        ("%author%", Tag::Author),
    ];

    fn pattern(&self) -> &'static str {
        match self {
            Tag::Year => r"(\d{4})",
            Tag::MonthNum | Tag::Day | Tag::Hour | Tag::Minute | Tag::Second => r"(\d{1,2})",
            Tag::PostId => r"(\d+)",
            Tag::PostName | Tag::Author => r"([^/]+)",
            // nested categories span several segments
            Tag::Category => r"(.+?)",
        }
    }
}

/// A compiled permalink structure
#[derive(Debug)]
pub struct Permalink {
    regex: Regex,
    tags: Vec<Tag>,
}

/// What a path told about the post it links to
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermalinkMatch {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    pub post_id: Option<i64>,
    pub post_name: Option<String>,
    /// The full category path, e.g. ``news/local``
    pub category: Option<String>,
    pub author: Option<String>,
}

impl Permalink {
    /// Returns ``None`` when the structure cannot identify a single post,
    /// that is it names neither ``%post_id%`` nor ``%postname%``.
    pub fn compile(structure: &str) -> Option<Self> {
        let structure = structure.trim_matches('/');
        let mut pattern = String::from("^");
        let mut tags = Vec::new();
        let mut rest = structure;

        while !rest.is_empty() {
            let next = Tag::ALL
                .iter()
                .filter_map(|(token, tag)| rest.find(token).map(|at| (at, *token, *tag)))
                .min_by_key(|(at, _, _)| *at);

            match next {
                Some((at, token, tag)) => {
                    pattern.push_str(&regex::escape(&rest[..at]));
                    pattern.push_str(tag.pattern());
                    tags.push(tag);
                    rest = &rest[at + token.len()..];
                }
                None => {
                    pattern.push_str(&regex::escape(rest));
                    rest = "";
                }
            }
        }
        pattern.push('$');

        if !tags.contains(&Tag::PostId) && !tags.contains(&Tag::PostName) {
            return None;
        }
        Some(Self {
            regex: Regex::new(&pattern).ok()?,
            tags,
        })
    }

    /// Matches a path without leading or trailing slashes
    pub fn captures(&self, path: &str) -> Option<PermalinkMatch> {
        let captures = self.regex.captures(path)?;
        let mut found = PermalinkMatch::default();

        for (tag, value) in self.tags.iter().zip(captures.iter().skip(1)) {
            let value = value?.as_str();
            match tag {
                Tag::Year => found.year = Some(value.parse().ok()?),
                Tag::MonthNum => found.month = Some(value.parse().ok()?),
                Tag::Day => found.day = Some(value.parse().ok()?),
                Tag::Hour => found.hour = Some(value.parse().ok()?),
                Tag::Minute => found.minute = Some(value.parse().ok()?),
                Tag::Second => found.second = Some(value.parse().ok()?),
                Tag::PostId => found.post_id = Some(value.parse().ok()?),
                Tag::PostName => found.post_name = Some(value.to_string()),
                Tag::Category => found.category = Some(value.to_string()),
                Tag::Author => found.author = Some(value.to_string()),
            }
        }
        Some(found)
    }
}

impl PermalinkMatch {
    /// Whether every date part present in the path agrees with ``date``
    pub fn matches_date(&self, date: &NaiveDateTime) -> bool {
        self.year.map_or(true, |y| y == date.year())
            && self.month.map_or(true, |m| m == date.month())
            && self.day.map_or(true, |d| d == date.day())
            && self.hour.map_or(true, |h| h == date.hour())
            && self.minute.map_or(true, |m| m == date.minute())
            && self.second.map_or(true, |s| s == date.second())
    }

    /// The slug of the innermost category in the path
    pub fn category_slug(&self) -> Option<&str> {
        self.category
            .as_deref()
            .and_then(|path| path.rsplit('/').next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postname_structure() {
        let permalink = Permalink::compile("/%postname%/").unwrap();
        let found = permalink.captures("hello-world").unwrap();
        assert_eq!(found.post_name.as_deref(), Some("hello-world"));
        assert!(permalink.captures("2021/hello-world").is_none());
    }

    #[test]
    fn test_dated_structure() {
        let permalink = Permalink::compile("/%year%/%monthnum%/%day%/%postname%/").unwrap();
        let found = permalink.captures("2021/04/01/hello-world").unwrap();
        assert_eq!(found.year, Some(2021));
        assert_eq!(found.month, Some(4));
        assert_eq!(found.day, Some(1));

        let date = chrono::NaiveDate::from_ymd_opt(2021, 4, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap();
        assert!(found.matches_date(&date));
        let other = chrono::NaiveDate::from_ymd_opt(2021, 5, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap();
        assert!(!found.matches_date(&other));
    }

    #[test]
    fn test_static_prefix_and_category() {
        let permalink = Permalink::compile("/blog/%category%/%postname%").unwrap();
        let found = permalink.captures("blog/news/local/flooding").unwrap();
        assert_eq!(found.category.as_deref(), Some("news/local"));
        assert_eq!(found.category_slug(), Some("local"));
        assert_eq!(found.post_name.as_deref(), Some("flooding"));
        assert!(permalink.captures("news/local/flooding").is_none());
    }

    #[test]
    fn test_post_id_structure() {
        let permalink = Permalink::compile("/archives/%post_id%").unwrap();
        assert_eq!(permalink.captures("archives/42").unwrap().post_id, Some(42));
        assert!(permalink.captures("archives/abc").is_none());
    }

    #[test]
    fn test_structure_without_post_is_rejected() {
        assert!(Permalink::compile("/%year%/%monthnum%/").is_none());
        assert!(Permalink::compile("").is_none());
    }
}
