//! Pure record → presentation descriptor mapping
//!
//! The view layer derives icons, tooltips and command bindings from data
//! records on demand. Construction of a descriptor has no side effects; the
//! editor surface resolves icon ids and theme-color tokens itself.

use chrono::{DateTime, Utc};

use crate::application::pagination::PageEntry;
use crate::domain::{FileNode, MatchType, ModuleRecord, NodeKind, Severity, VulnerabilityRecord};

/// What activating an item should trigger, if anything.
///
/// The load-more sentinels run a command only when explicitly activated;
/// selecting them as data does nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    None,
    ShowMoreModules,
    ShowMoreVulnerabilities,
    ShowFileDetails,
}

/// Everything the editor surface needs to render one tree item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItemDescriptor {
    pub label: String,
    pub description: String,
    /// Icon identifier from the surface's icon set
    pub icon: &'static str,
    /// Theme-color token for the icon, when severity applies
    pub color_token: Option<&'static str>,
    /// Markdown tooltip body
    pub tooltip: String,
    pub collapsible: bool,
    pub activation: Activation,
}

/// Map one module pane entry.
pub fn module_entry(entry: &PageEntry<ModuleRecord>) -> TreeItemDescriptor {
    match entry {
        PageEntry::Item(record) => module_item(record),
        PageEntry::LoadMore => load_more(Activation::ShowMoreModules),
    }
}

/// Map one vulnerability pane entry.
pub fn vulnerability_entry(entry: &PageEntry<VulnerabilityRecord>) -> TreeItemDescriptor {
    match entry {
        PageEntry::Item(record) => vulnerability_item(record),
        PageEntry::LoadMore => load_more(Activation::ShowMoreVulnerabilities),
    }
}

fn load_more(activation: Activation) -> TreeItemDescriptor {
    TreeItemDescriptor {
        label: "Load more…".into(),
        description: String::new(),
        icon: "ellipsis",
        color_token: None,
        tooltip: String::new(),
        collapsible: false,
        activation,
    }
}

fn module_item(record: &ModuleRecord) -> TreeItemDescriptor {
    let highest = record.highest_severity();
    let mut tooltip = format!("**{}**: {}\n\n", record.name, record.version);
    if let (Some(origin), Some(url)) = (&record.origin, &record.url) {
        tooltip.push_str(&format!("**Source**: [{origin}]({url})\n\n"));
    }
    tooltip.push_str(&format!(
        "**Known vulnerabilities**: {}\n\n",
        record.vulnerability_count
    ));
    for (count, marker, name) in [
        (record.high, "🔴", "High"),
        (record.medium, "🟠", "Medium"),
        (record.low, "🟡", "Low"),
        (record.other, "🔵", "Other"),
    ] {
        if count > 0 {
            tooltip.push_str(&format!("**{marker} {name}**: {count}\n\n"));
        }
    }
    tooltip.push_str(&format!(
        "**Recommended version**: {}{}\n\n",
        record.recommended_version.as_deref().unwrap_or("none"),
        release_suffix(record.recommended_released_at)
    ));
    tooltip.push_str(&format!(
        "**Latest version**: {}{}",
        record.latest_version.as_deref().unwrap_or("none"),
        release_suffix(record.latest_released_at)
    ));

    TreeItemDescriptor {
        label: record.name.clone(),
        description: record.version.clone(),
        icon: "extensions",
        color_token: highest.map(Severity::color_token),
        tooltip,
        collapsible: true,
        activation: Activation::None,
    }
}

fn vulnerability_item(record: &VulnerabilityRecord) -> TreeItemDescriptor {
    let mut tooltip = match &record.url {
        Some(url) => format!("**[{}]({url})**", record.name),
        None => format!("**{}**", record.name),
    };
    tooltip.push_str(&format!(
        ": {} {} {}\n\n",
        severity_glyph(record.severity),
        record.severity.label(),
        record.score
    ));
    if let Some(category) = &record.category {
        tooltip.push_str(&format!("**Category**: {category}\n\n"));
    }
    if let Some(released) = record.released_at {
        tooltip.push_str(&format!("**Published**: {}\n\n", relative_age(released)));
    }
    for (score, name) in [
        (record.base_score, "Base score"),
        (record.exploitability_score, "Exploitability"),
        (record.impact_score, "Impact"),
    ] {
        if let Some(score) = score {
            tooltip.push_str(&format!("**{name}**: {score}\n\n"));
        }
    }

    TreeItemDescriptor {
        label: record.name.clone(),
        description: record.score.clone(),
        icon: "bug",
        color_token: Some(record.severity.color_token()),
        tooltip,
        collapsible: false,
        activation: Activation::None,
    }
}

/// Map one file tree node; `project_name` prefixes the description the way
/// the module pane shows provenance.
pub fn file_item(node: &FileNode, match_type: MatchType, project_name: &str) -> TreeItemDescriptor {
    let is_file = node.kind == NodeKind::File;
    let label = if is_file {
        format!("{} · {}", node.name, match_label(match_type))
    } else {
        node.name.clone()
    };
    let description = if node.path.is_empty() {
        String::new()
    } else {
        format!("{project_name} · {}", node.path)
    };

    TreeItemDescriptor {
        label,
        description,
        icon: if is_file { "file" } else { "folder" },
        color_token: None,
        tooltip: String::new(),
        collapsible: !node.children.is_empty(),
        activation: if is_file {
            Activation::ShowFileDetails
        } else {
            Activation::None
        },
    }
}

/// Title for the vulnerability pane once a module is selected.
pub fn vulnerability_pane_title(record: &ModuleRecord) -> String {
    format!(
        "{} {} · {} vulnerabilities",
        record.name, record.version, record.vulnerability_count
    )
}

fn match_label(match_type: MatchType) -> &'static str {
    match match_type {
        MatchType::Exact => "exact match",
        MatchType::Partial => "partial match",
    }
}

fn severity_glyph(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "🔴",
        Severity::Medium => "🟠",
        Severity::Low => "🟡",
        Severity::Other => "🔵",
    }
}

fn release_suffix(released_at: Option<DateTime<Utc>>) -> String {
    match released_at {
        Some(at) => format!(", released {}", relative_age(at)),
        None => String::new(),
    }
}

/// Coarse human-readable age, largest unit only.
fn relative_age(at: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(at);
    let days = elapsed.num_days();
    if days >= 365 {
        let years = days / 365;
        format!("{years} year{} ago", plural(years))
    } else if days >= 30 {
        let months = days / 30;
        format!("{months} month{} ago", plural(months))
    } else if days >= 1 {
        format!("{days} day{} ago", plural(days))
    } else if elapsed.num_hours() >= 1 {
        let hours = elapsed.num_hours();
        format!("{hours} hour{} ago", plural(hours))
    } else {
        "just now".into()
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
