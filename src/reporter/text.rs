//! Plain text report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{ModuleReport, ResourceInfo};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

/// Text report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show descriptions
    verbose: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
            verbose: config.output.verbose,
        }
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, modules: &[ModuleReport]) -> Result<String> {
        let mut output = String::new();

        for module in modules {
            output.push_str(&self.format_header(&module.source));
            output.push_str(&self.format_inputs(&module.info));
            output.push_str(&self.format_outputs(&module.info));
        }

        Ok(output)
    }
}

impl TextReporter {
    fn format_header(&self, source: &str) -> String {
        if self.use_colors {
            format!("\n{}\n{}\n", source.bright_white().bold(), "=".repeat(80).bright_blue())
        } else {
            format!("\n{}\n{}\n", source, "=".repeat(80))
        }
    }

    fn section_title(&self, title: &str, count: usize) -> String {
        let title = format!("{title} ({count})");
        if self.use_colors {
            format!("\n{}\n", title.bright_cyan().bold())
        } else {
            format!("\n{title}\n")
        }
    }

    fn format_inputs(&self, info: &ResourceInfo) -> String {
        let mut output = self.section_title("Inputs", info.inputs.len());
        if info.inputs.is_empty() {
            return output;
        }

        let mut header = vec!["Name", "Type", "Required"];
        if self.verbose {
            header.push("Description");
        }

        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header);

        for input in &info.inputs {
            let required = if input.required {
                self.colored_cell("yes", Color::Yellow)
            } else {
                Cell::new("no")
            };
            let mut row = vec![
                Cell::new(&input.name),
                Cell::new(&input.type_description),
                required,
            ];
            if self.verbose {
                row.push(Cell::new(input.description.as_deref().unwrap_or("")));
            }
            table.add_row(row);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_outputs(&self, info: &ResourceInfo) -> String {
        let mut output = self.section_title("Outputs", info.outputs.len());
        if info.outputs.is_empty() {
            return output;
        }

        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Name", "Sensitive", "Description"]);

        for out in &info.outputs {
            let sensitive = if out.sensitive {
                self.colored_cell("yes", Color::Red)
            } else {
                Cell::new("no")
            };
            table.add_row(vec![
                Cell::new(&out.name),
                sensitive,
                Cell::new(out.description.as_deref().unwrap_or("")),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn colored_cell(&self, text: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).fg(color)
        } else {
            Cell::new(text)
        }
    }
}
