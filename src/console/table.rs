//! Text tables for `help`, `show modules` and `show options`

use crate::core::options::OptionSet;
use crate::core::registry::ModuleRegistry;
use colored::Colorize;
use unicode_width::UnicodeWidthStr;

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(s));
    format!("{}{}", s, " ".repeat(fill))
}

fn column_width<'a>(header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells
        .map(UnicodeWidthStr::width)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}

pub fn help() -> String {
    let rows = [
        ("help", "Show this help menu"),
        ("show modules", "List available modules"),
        ("show options", "Show global and module options"),
        ("use <module|number>", "Select a module by name or number"),
        ("options", "Alias for 'show options'"),
        ("set <option> <value>", "Set an option value"),
        ("unset <option>", "Clear an option value"),
        ("run", "Run the selected module"),
        ("back", "Deselect the current module"),
        ("workspace", "Show the active workspace"),
        ("exit", "Exit the console"),
    ];
    let width = column_width("Command", rows.iter().map(|(c, _)| *c));

    let mut out = vec![
        String::new(),
        "Core Commands".bold().to_string(),
        "=============".to_string(),
        String::new(),
        format!("  {}  {}", pad("Command", width), "Description"),
        format!("  {}  {}", pad("-------", width), "-----------"),
    ];
    for (cmd, desc) in rows {
        out.push(format!("  {}  {}", pad(cmd, width), desc));
    }
    out.push(String::new());
    out.join("\n")
}

pub fn modules(registry: &ModuleRegistry) -> String {
    if registry.is_empty() {
        return "No modules loaded".to_string();
    }

    let name_width = column_width("Name", registry.names());
    let num_width = registry.len().to_string().len().max(1);

    let mut out = vec![
        String::new(),
        "Available Modules".bold().to_string(),
        "=================".to_string(),
        String::new(),
        format!("  {}  {}  Description", pad("#", num_width), pad("Name", name_width)),
        format!("  {}  {}  -----------", pad("-", num_width), pad("----", name_width)),
    ];
    for (i, module) in registry.iter().enumerate() {
        out.push(format!(
            "  {}  {}  {}",
            pad(&(i + 1).to_string(), num_width),
            pad(&module.name, name_width).blue(),
            module.description
        ));
    }
    out.push(String::new());
    out.join("\n")
}

fn option_block(title: &str, options: &OptionSet) -> Vec<String> {
    let name_width = column_width("Name", options.names());
    let value_width = column_width("Current Setting", options.iter().map(|(_, o)| o.value.as_str()));

    let mut out = vec![
        String::new(),
        title.bold().to_string(),
        "=".repeat(UnicodeWidthStr::width(title)),
        String::new(),
        format!(
            "  {}  {}  Required  Description",
            pad("Name", name_width),
            pad("Current Setting", value_width)
        ),
        format!(
            "  {}  {}  --------  -----------",
            pad("----", name_width),
            pad("---------------", value_width)
        ),
    ];
    for (name, option) in options.iter() {
        out.push(format!(
            "  {}  {}  {}  {}",
            pad(name, name_width),
            pad(&option.value, value_width).green(),
            pad(if option.required { "yes" } else { "no" }, "Required".len()),
            option.description
        ));
    }
    out
}

/// Global options always; the module block only when a module is selected.
pub fn options(globals: &OptionSet, module: Option<(&str, &OptionSet)>) -> String {
    let mut out = option_block("Global Options", globals);
    if let Some((name, options)) = module {
        let title = format!("Module Options ({})", name);
        if options.is_empty() {
            out.push(String::new());
            out.push(title.bold().to_string());
            out.push(String::new());
            out.push("  No module-specific options".to_string());
        } else {
            out.extend(option_block(&title, options));
        }
    }
    out.push(String::new());
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::ModuleOption;

    #[test]
    fn test_options_table_shows_values() {
        colored::control::set_override(false);
        let mut globals = OptionSet::globals();
        globals.set_value("TARGET", "https://victim.example.com/App");
        let module = OptionSet::new().with("X", ModuleOption::required("an x"));

        let table = options(&globals, Some(("alpha", &module)));
        assert!(table.contains("https://victim.example.com/App"));
        assert!(table.contains("Module Options (alpha)"));
        assert!(table.lines().any(|l| l.trim_start().starts_with("X ") && l.contains("yes")));
    }

    #[test]
    fn test_options_without_module() {
        colored::control::set_override(false);
        let table = options(&OptionSet::globals(), None);
        assert!(table.contains("Global Options"));
        assert!(!table.contains("Module Options"));
    }

    #[test]
    fn test_help_lists_every_command() {
        colored::control::set_override(false);
        let text = help();
        for word in crate::console::command::COMMAND_WORDS {
            assert!(text.contains(word), "{}", word);
        }
    }
}
