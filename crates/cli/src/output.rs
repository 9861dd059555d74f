//! Rendering: colored status lines for single-result commands, and
//! comfy-table listings for list-shaped commands. `--format json` skips
//! the table and prints the raw records for scripting.

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use webhook_capture::CaptureFile;
use webhook_templates::{LocalTemplate, RemoteTemplateListing, TemplateMetadata};

pub fn success_line(message: &str) {
    println!("{} {message}", "✓".green());
}

pub fn info_line(message: &str) {
    println!("{message}");
}

pub fn error_line(message: &str) {
    eprintln!("{} {message}", "error:".red().bold());
}

pub fn captures_table(captures: &[CaptureFile]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Timestamp").fg(Color::Cyan),
        Cell::new("Method").fg(Color::Cyan),
        Cell::new("Path").fg(Color::Cyan),
        Cell::new("Provider").fg(Color::Cyan),
    ]);
    for capture in captures {
        let record = &capture.record;
        let provider_color = if record.provider == "unknown" {
            Color::DarkGrey
        } else {
            Color::Green
        };
        table.add_row(vec![
            Cell::new(&record.id[..record.id.len().min(8)]),
            Cell::new(&record.timestamp),
            Cell::new(&record.method),
            Cell::new(&record.path),
            Cell::new(&record.provider).fg(provider_color),
        ]);
    }
    table
}

pub fn remote_templates_table(listings: &[RemoteTemplateListing]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Event").fg(Color::Cyan),
        Cell::new("Local").fg(Color::Cyan),
    ]);
    for listing in listings {
        let local_marker = if listing.downloaded_locally {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("-").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(&listing.metadata.id),
            Cell::new(&listing.metadata.name),
            Cell::new(&listing.metadata.provider),
            Cell::new(&listing.metadata.event),
            local_marker,
        ]);
    }
    table
}

pub fn local_templates_table(templates: &[LocalTemplate]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Event").fg(Color::Cyan),
        Cell::new("Downloaded").fg(Color::Cyan),
    ]);
    for template in templates {
        table.add_row(vec![
            Cell::new(&template.id),
            Cell::new(&template.metadata.provider),
            Cell::new(&template.metadata.event),
            Cell::new(&template.downloaded_at),
        ]);
    }
    table
}

pub fn template_metadata_table(entries: &[TemplateMetadata]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Event").fg(Color::Cyan),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.id),
            Cell::new(&entry.name),
            Cell::new(&entry.provider),
            Cell::new(&entry.event),
        ]);
    }
    table
}
