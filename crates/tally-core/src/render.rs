//! Plain-text rendering of the board.

use crate::model::{Activity, Document};
use regex::Regex;
use std::sync::OnceLock;

pub const BOARD_HEADER: &str = "**📋 Activity Status**";
pub const EMPTY_PLACEHOLDER: &str = "_(empty; use `!add ...`)_";

static KIND_SUFFIX_RE: OnceLock<Regex> = OnceLock::new();

fn kind_suffix_re() -> &'static Regex {
    KIND_SUFFIX_RE.get_or_init(|| {
        Regex::new(r"(?i)^(?P<base>.+?)_(?P<kind>CORP|NUESTRA)$").expect("valid kind suffix regex")
    })
}

/// Display name for an activity: `NDS_CORP` becomes `NDS (CORP)`, anything
/// without a recognized kind suffix is shown as `NAME (KIND)`.
pub fn display_name(activity: &str, kind: &str) -> String {
    let kind = kind.to_uppercase();
    match kind_suffix_re().captures(activity) {
        Some(caps) => format!("{} ({kind})", caps["base"].to_uppercase()),
        None => format!("{activity} ({kind})"),
    }
}

pub fn activity_line(activity: &Activity) -> String {
    format!(
        " → {}: {}/{}",
        display_name(&activity.name, &activity.tipo),
        activity.hecho,
        activity.total
    )
}

/// Render the full board text for `doc`.
pub fn render(doc: &Document) -> String {
    let mut lines = vec![BOARD_HEADER.to_string()];
    for system in doc.systems() {
        if system.activities.is_empty() {
            continue;
        }
        lines.push(format!("**{}**", system.name));
        lines.extend(system.activities.iter().map(activity_line));
    }
    if lines.len() == 1 {
        lines.push(EMPTY_PLACEHOLDER.to_string());
    }
    lines.join("\n")
}
