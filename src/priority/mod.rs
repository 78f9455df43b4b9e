//! Prioritized per-team views: open issues of a team grouped into ordered
//! categories and rewritten into `<team>-prio` on every run.

pub mod render;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::model::row::BacklogRow;
use crate::sheets::SheetStore;
use crate::versions::{ProductSprints, Sprint};

/// Issues created less than this many days ago are "recent".
const RECENT_DAYS: i64 = 21;

pub fn prio_sheet_name(team: &str) -> String {
    format!("{team}-prio")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    PreviousSprint,
    CurrentSprint,
    NextSprint,
    Recent,
    Blocker,
    Critical,
    Major,
    Unsorted,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::PreviousSprint,
        Category::CurrentSprint,
        Category::NextSprint,
        Category::Recent,
        Category::Blocker,
        Category::Critical,
        Category::Major,
        Category::Unsorted,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::PreviousSprint => "Previous Sprint",
            Category::CurrentSprint => "Current Sprint",
            Category::NextSprint => "Next Sprint",
            Category::Recent => "Recent",
            Category::Blocker => "Blocker",
            Category::Critical => "Critical / P1",
            Category::Major => "Major / P2",
            Category::Unsorted => "Unsorted",
        }
    }

    /// Sprint and recency buckets are ordered by severity, the others by
    /// issue identifier.
    fn by_severity(self) -> bool {
        matches!(
            self,
            Category::PreviousSprint | Category::CurrentSprint | Category::NextSprint | Category::Recent
        )
    }
}

/// Inputs shared by every predicate of one run.
pub struct CategoryContext<'a> {
    pub sprints: &'a [ProductSprints],
    pub now: DateTime<Utc>,
}

type Predicate<'a> = Box<dyn Fn(&BacklogRow) -> bool + 'a>;

/// Parse an epoch-millis cell.
pub fn parse_millis(cell: &str) -> Option<DateTime<Utc>> {
    cell.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

fn in_sprint(sprints: &[ProductSprints], row: &BacklogRow, sprint: Sprint) -> bool {
    sprints
        .iter()
        .any(|product| product.applies_to(&row.link) && product.label(sprint) == Some(row.milestone.as_str()))
}

fn has_severity(row: &BacklogRow, names: &[&str]) -> bool {
    names.iter().any(|name| row.severity.eq_ignore_ascii_case(name))
}

fn entry<'a>(category: Category, matches: impl Fn(&BacklogRow) -> bool + 'a) -> (Category, Predicate<'a>) {
    (category, Box::new(matches))
}

/// Ordered (category, predicate) pairs; the first matching entry wins.
pub fn filter_chain<'a>(ctx: &'a CategoryContext<'a>) -> Vec<(Category, Predicate<'a>)> {
    let sprints = ctx.sprints;
    let now = ctx.now;
    vec![
        entry(Category::PreviousSprint, move |row| in_sprint(sprints, row, Sprint::Previous)),
        entry(Category::CurrentSprint, move |row| in_sprint(sprints, row, Sprint::Current)),
        entry(Category::NextSprint, move |row| in_sprint(sprints, row, Sprint::Next)),
        entry(Category::Recent, move |row| {
            parse_millis(&row.created).is_some_and(|created| now - created < Duration::days(RECENT_DAYS))
        }),
        entry(Category::Blocker, |row| has_severity(row, &["blocker"])),
        entry(Category::Critical, |row| has_severity(row, &["critical", "p1"])),
        entry(Category::Major, |row| has_severity(row, &["major", "p2"])),
        entry(Category::Unsorted, |_| true),
    ]
}

pub fn severity_score(severity: &str) -> u32 {
    match severity.to_lowercase().as_str() {
        "blocker" => 1000,
        "critical" | "p1" => 500,
        "major" | "p2" => 200,
        _ => 0,
    }
}

/// A category and its issues, in display order.
#[derive(Debug)]
pub struct Bucket<'a> {
    pub category: Category,
    pub rows: Vec<&'a BacklogRow>,
}

/// Group the open issues of `team` into every category, in category order.
pub fn categorize<'r>(ctx: &CategoryContext<'_>, team: &str, master: &'r [BacklogRow]) -> Vec<Bucket<'r>> {
    let chain = filter_chain(ctx);
    let mut buckets: Vec<Bucket<'r>> = Category::ALL
        .iter()
        .map(|category| Bucket {
            category: *category,
            rows: Vec::new(),
        })
        .collect();

    for row in master.iter().filter(|r| r.belongs_to(team) && !r.is_closed()) {
        if let Some(pos) = chain.iter().position(|(_, matches)| matches(row)) {
            buckets[pos].rows.push(row);
        }
    }

    for bucket in &mut buckets {
        if bucket.category.by_severity() {
            bucket.rows.sort_by(|a, b| {
                severity_score(&b.severity)
                    .cmp(&severity_score(&a.severity))
                    .then_with(|| a.milestone.cmp(&b.milestone))
            });
        } else {
            bucket
                .rows
                .sort_by_cached_key(|row| render::issue_key(&render::short_id(&row.link)));
        }
    }

    buckets
}

/// Rewrite the prioritized view of `team` from the master rows.
pub async fn generate_prioritized_view(
    store: &dyn SheetStore,
    master: &[BacklogRow],
    team: &str,
    sheet_id: i64,
    sprints: &[ProductSprints],
    now: DateTime<Utc>,
) -> Result<usize> {
    let ctx = CategoryContext { sprints, now };
    let buckets = categorize(&ctx, team, master);
    let view = render::render(&buckets, now);
    let sheet = prio_sheet_name(team);

    store.batch_update(render::clear_requests(sheet_id)).await?;
    if !view.rows.is_empty() {
        store
            .batch_update_values(vec![view.value_range(&sheet)])
            .await?;
        store
            .batch_update(render::title_requests(sheet_id, &view.title_rows))
            .await?;
    }

    let issues = buckets.iter().map(|b| b.rows.len()).sum();
    info!(
        team,
        issues,
        categories = view.title_rows.len(),
        "prioritized view written"
    );
    Ok(issues)
}
