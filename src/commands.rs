//! Shell commands, parsing and autocomplete logic

use crate::country::search::SortCriteria;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available shell commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "search",
    aliases: &["s", "find"],
    usage: "search <query>",
    description: "Search countries by name",
  },
  Command {
    name: "filter",
    aliases: &["f"],
    usage: "filter [text]",
    description: "Filter the loaded list by name, capital or region",
  },
  Command {
    name: "sort",
    aliases: &["o", "order"],
    usage: "sort <name|population|area|region>",
    description: "Sort the loaded list",
  },
  Command {
    name: "show",
    aliases: &["d", "detail"],
    usage: "show <name>",
    description: "Show details for a country",
  },
  Command {
    name: "add",
    aliases: &["a", "select"],
    usage: "add <name>",
    description: "Add a country to the selection",
  },
  Command {
    name: "remove",
    aliases: &["rm", "unselect"],
    usage: "remove <name>",
    description: "Remove a country from the selection",
  },
  Command {
    name: "selected",
    aliases: &["sel", "mine"],
    usage: "selected",
    description: "List selected countries",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    usage: "refresh",
    description: "Reload the country list from the network",
  },
  Command {
    name: "clear",
    aliases: &["c", "reset"],
    usage: "clear",
    description: "Clear the active filter and search",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "Show available commands",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit the shell",
  },
];

/// A parsed shell line
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
  Search(String),
  Filter(String),
  Sort(SortCriteria),
  Show(String),
  Add(String),
  Remove(String),
  Selected,
  Refresh,
  Clear,
  Help,
  Quit,
}

/// Parse one line of shell input.
///
/// Returns `Ok(None)` for blank lines. Unknown commands produce an error
/// message that includes the closest suggestions.
pub fn parse(line: &str) -> Result<Option<ShellCommand>, String> {
  let line = line.trim();
  if line.is_empty() {
    return Ok(None);
  }

  let (word, rest) = match line.split_once(char::is_whitespace) {
    Some((word, rest)) => (word, rest.trim()),
    None => (line, ""),
  };

  let Some(command) = resolve(word) else {
    let suggestions = get_suggestions(word);
    return Err(match suggestions.first() {
      Some(cmd) => format!("Unknown command '{}'. Did you mean '{}'?", word, cmd.name),
      None => format!("Unknown command '{}'. Type 'help' for a list.", word),
    });
  };

  let require_arg = |what: &str| {
    if rest.is_empty() {
      Err(format!("Usage: {} ({} required)", command.usage, what))
    } else {
      Ok(rest.to_string())
    }
  };

  let parsed = match command.name {
    "search" => ShellCommand::Search(require_arg("query")?),
    "filter" => ShellCommand::Filter(rest.to_string()),
    "sort" => {
      let criteria = require_arg("criteria")?;
      ShellCommand::Sort(criteria.parse::<SortCriteria>()?)
    }
    "show" => ShellCommand::Show(require_arg("name")?),
    "add" => ShellCommand::Add(require_arg("name")?),
    "remove" => ShellCommand::Remove(require_arg("name")?),
    "selected" => ShellCommand::Selected,
    "refresh" => ShellCommand::Refresh,
    "clear" => ShellCommand::Clear,
    "help" => ShellCommand::Help,
    _ => ShellCommand::Quit,
  };

  Ok(Some(parsed))
}

/// Exact match on name or alias
fn resolve(word: &str) -> Option<&'static Command> {
  let word = word.to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == word || cmd.aliases.contains(&word.as_str()))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if cmd.name == input_lower {
      matches.push((cmd, 0));
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
    } else if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
    } else if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Stable, so equal priorities keep table order
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Help text listing every command
pub fn help_text() -> String {
  let width = COMMANDS.iter().map(|c| c.usage.len()).max().unwrap_or(0);
  COMMANDS
    .iter()
    .map(|c| format!("  {:<width$}  {}", c.usage, c.description, width = width))
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("search");
    assert_eq!(suggestions[0].name, "search");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("rm");
    assert_eq!(suggestions[0].name, "remove");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("sel");
    // "sel" is an alias of "selected", which outranks the prefix match on "select"
    assert_eq!(suggestions[0].name, "selected");

    let suggestions = get_suggestions("ref");
    assert_eq!(suggestions[0].name, "refresh");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("fres");
    assert_eq!(suggestions[0].name, "refresh");
  }

  #[test]
  fn test_parse_blank_line() {
    assert_eq!(parse("   "), Ok(None));
  }

  #[test]
  fn test_parse_with_argument() {
    assert_eq!(
      parse("search  united states "),
      Ok(Some(ShellCommand::Search("united states".to_string())))
    );
    assert_eq!(
      parse("ADD Japan"),
      Ok(Some(ShellCommand::Add("Japan".to_string())))
    );
  }

  #[test]
  fn test_parse_alias() {
    assert_eq!(parse("q"), Ok(Some(ShellCommand::Quit)));
    assert_eq!(parse("?"), Ok(Some(ShellCommand::Help)));
  }

  #[test]
  fn test_parse_sort() {
    assert_eq!(
      parse("sort pop"),
      Ok(Some(ShellCommand::Sort(SortCriteria::Population)))
    );
    assert!(parse("sort sideways").is_err());
  }

  #[test]
  fn test_parse_filter_without_text_clears() {
    assert_eq!(parse("filter"), Ok(Some(ShellCommand::Filter(String::new()))));
  }

  #[test]
  fn test_parse_missing_argument() {
    let err = parse("show").unwrap_err();
    assert!(err.contains("show <name>"));
  }

  #[test]
  fn test_parse_unknown_suggests() {
    let err = parse("refesh").unwrap_err();
    assert!(err.contains("Unknown command 'refesh'"));
  }

  #[test]
  fn test_help_lists_every_command() {
    let help = help_text();
    for cmd in COMMANDS {
      assert!(help.contains(cmd.usage));
    }
  }
}
