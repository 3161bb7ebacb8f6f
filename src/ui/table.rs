use crate::registry::Entry;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Path")]
    path: String,
}

/// Render tracked repositories as a rounded table. Empty input renders
/// nothing.
pub fn entries_table(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|entry| EntryRow {
            alias: entry.alias.clone(),
            path: entry.path.clone(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_table() {
        assert!(entries_table(&[]).is_empty());

        let table = entries_table(&[
            Entry {
                alias: "dots".to_string(),
                path: "/home/me/dotfiles".to_string(),
            },
            Entry {
                alias: "work".to_string(),
                path: "/srv/work".to_string(),
            },
        ]);
        assert!(table.contains("Alias"));
        assert!(table.contains("/home/me/dotfiles"));
        assert!(table.contains("work"));
    }
}
