use crate::models::{FilterState, Product};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreCommand {
    SetProduct(Option<Product>),
    SetCohort(Option<String>),
    Clear,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  product <MBA|CPA|CEA|CFP|OTHER|all>
  cohort <value|all>
  clear   reset both filters
  show    render the current view again
  quit";

pub fn parse_command(line: &str) -> Result<ExploreCommand, String> {
    let line = line.trim();
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, Some(arg.trim())),
        None => (line, None),
    };
    let arg = arg.filter(|a| !a.is_empty());

    match (verb.to_lowercase().as_str(), arg) {
        ("product", Some(value)) if value.eq_ignore_ascii_case("all") => {
            Ok(ExploreCommand::SetProduct(None))
        }
        ("product", Some(value)) => Product::parse(value)
            .map(|p| ExploreCommand::SetProduct(Some(p)))
            .ok_or_else(|| format!("unknown product '{value}'")),
        ("cohort", Some(value)) if value.eq_ignore_ascii_case("all") => {
            Ok(ExploreCommand::SetCohort(None))
        }
        ("cohort", Some(value)) => Ok(ExploreCommand::SetCohort(Some(value.to_string()))),
        ("product" | "cohort", None) => Err(format!("'{verb}' needs a value or 'all'")),
        ("clear", None) => Ok(ExploreCommand::Clear),
        ("show" | "", None) => Ok(ExploreCommand::Show),
        ("help" | "?", None) => Ok(ExploreCommand::Help),
        ("quit" | "exit" | "q", None) => Ok(ExploreCommand::Quit),
        _ => Err(format!("unrecognised command '{line}'")),
    }
}

/// Applies a filter command. Returns true when the filter state changed.
pub fn apply(filters: &mut FilterState, command: &ExploreCommand) -> bool {
    let next = match command {
        ExploreCommand::SetProduct(product) => FilterState {
            product: *product,
            ..filters.clone()
        },
        ExploreCommand::SetCohort(cohort) => FilterState {
            cohort: cohort.clone(),
            ..filters.clone()
        },
        ExploreCommand::Clear => FilterState::default(),
        ExploreCommand::Show | ExploreCommand::Help | ExploreCommand::Quit => return false,
    };
    let changed = next != *filters;
    *filters = next;
    changed
}
