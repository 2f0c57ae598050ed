//! Maven version ordering.
//!
//! Versions are split into numeric and textual items at `.`, `-` and at every
//! switch between digits and letters. A `-` (or a digit/letter switch) opens a
//! nested list, so `1.0-alpha-1` reads as `[1, [alpha, [1]]]`. Trailing zeros
//! and release qualifiers are dropped before comparing, which makes `1`,
//! `1.0` and `1.0.0-ga` equal.
//!
//! Known qualifiers order as
//! `alpha < beta < milestone < rc < snapshot < (release) < sp`; unknown
//! qualifiers sort after `sp`, lexically among themselves.

use std::cmp::Ordering;
use std::fmt;

const QUALIFIERS: [&str; 7] = ["alpha", "beta", "milestone", "rc", "snapshot", "", "sp"];
const RELEASE_INDEX: &str = "5";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    /// Decimal digits without leading zeros; empty for zero.
    Int(String),
    Str(String),
    List(Vec<Item>),
}

impl Item {
    fn int(digits: &str) -> Self {
        Item::Int(digits.trim_start_matches('0').to_owned())
    }

    fn string(value: &str, followed_by_digit: bool) -> Self {
        let value = match value {
            "a" if followed_by_digit => "alpha",
            "b" if followed_by_digit => "beta",
            "m" if followed_by_digit => "milestone",
            "ga" | "final" | "release" => "",
            "cr" => "rc",
            other => other,
        };
        Item::Str(value.to_owned())
    }

    fn parsed(is_digit: bool, text: &str) -> Self {
        if is_digit {
            Item::int(text)
        } else {
            Item::string(text, false)
        }
    }

    fn is_null(&self) -> bool {
        match self {
            Item::Int(digits) => digits.is_empty(),
            Item::Str(value) => value.is_empty(),
            Item::List(items) => items.is_empty(),
        }
    }

    /// Compare against `other`, where `None` stands for a missing item.
    fn compare(&self, other: Option<&Item>) -> Ordering {
        match (self, other) {
            (Item::Int(digits), None) => {
                if digits.is_empty() {
                    Ordering::Equal
                } else {
                    Ordering::Greater
                }
            }
            (Item::Int(a), Some(Item::Int(b))) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Item::Int(_), Some(_)) => Ordering::Greater,

            (Item::Str(value), None) => comparable_qualifier(value).as_str().cmp(RELEASE_INDEX),
            (Item::Str(a), Some(Item::Str(b))) => comparable_qualifier(a).cmp(&comparable_qualifier(b)),
            (Item::Str(_), Some(_)) => Ordering::Less,

            (Item::List(items), None) => items.first().map_or(Ordering::Equal, |first| first.compare(None)),
            (Item::List(_), Some(Item::Int(_))) => Ordering::Less,
            (Item::List(_), Some(Item::Str(_))) => Ordering::Greater,
            (Item::List(left), Some(Item::List(right))) => {
                let mut left = left.iter();
                let mut right = right.iter();
                loop {
                    let ordering = match (left.next(), right.next()) {
                        (None, None) => return Ordering::Equal,
                        (None, Some(r)) => r.compare(None).reverse(),
                        (Some(l), r) => l.compare(r),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
            }
        }
    }
}

fn comparable_qualifier(qualifier: &str) -> String {
    match QUALIFIERS.iter().position(|known| *known == qualifier) {
        Some(index) => index.to_string(),
        None => format!("{}-{qualifier}", QUALIFIERS.len()),
    }
}

/// Drop null items from the tail, stepping over nested lists.
fn normalize(items: &mut Vec<Item>) {
    let mut index = items.len();
    while index > 0 {
        index -= 1;
        if items[index].is_null() {
            items.remove(index);
        } else if !matches!(items[index], Item::List(_)) {
            break;
        }
    }
}

/// Builder state: the chain of open lists, innermost last.
struct Parser {
    stack: Vec<Vec<Item>>,
}

impl Parser {
    fn push(&mut self, item: Item) {
        if let Some(list) = self.stack.last_mut() {
            list.push(item);
        }
    }

    fn open_list(&mut self) {
        self.stack.push(Vec::new());
    }

    fn finish(mut self) -> Item {
        let mut closed = None;
        while let Some(mut list) = self.stack.pop() {
            if let Some(child) = closed.take() {
                list.push(child);
            }
            normalize(&mut list);
            closed = Some(Item::List(list));
        }
        closed.unwrap_or(Item::List(Vec::new()))
    }
}

fn parse(version: &str) -> Item {
    let version = version.to_lowercase();
    let mut parser = Parser { stack: vec![Vec::new()] };
    let mut is_digit = false;
    let mut start = 0;

    for (i, c) in version.char_indices() {
        match c {
            '.' | '-' => {
                if i == start {
                    parser.push(Item::Int(String::new()));
                } else {
                    parser.push(Item::parsed(is_digit, &version[start..i]));
                }
                start = i + 1;
                if c == '-' {
                    parser.open_list();
                }
            }
            _ if c.is_ascii_digit() => {
                if !is_digit && i > start {
                    parser.push(Item::string(&version[start..i], true));
                    start = i;
                    parser.open_list();
                }
                is_digit = true;
            }
            _ => {
                if is_digit && i > start {
                    parser.push(Item::parsed(true, &version[start..i]));
                    start = i;
                    parser.open_list();
                }
                is_digit = false;
            }
        }
    }
    if version.len() > start {
        parser.push(Item::parsed(is_digit, &version[start..]));
    }
    parser.finish()
}

/// A version string ordered the way Maven orders versions.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    text: String,
    items: Item,
}

impl MavenVersion {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let items = parse(&text);
        Self { text, items }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.items.compare(Some(&other.items))
    }
}

/// Order two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    parse(a).compare(Some(&parse(b)))
}

/// Sort version strings in place, lowest first.
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by_cached_key(|version| MavenVersion::new(version.as_str()));
}
