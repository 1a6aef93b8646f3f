use dialoguer::Select;
use std::io::IsTerminal;

/// Lets the user pick one of `items` from a menu.
///
/// Returns `None` without prompting when there is nothing to pick or stdin is
/// not a terminal, and when the user cancels the menu.
pub fn select_item(prompt: &str, items: &[String]) -> anyhow::Result<Option<String>> {
    if items.is_empty() || !std::io::stdin().is_terminal() {
        return Ok(None);
    }
    let chosen = Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact_opt()?;
    Ok(chosen.and_then(|index| items.get(index).cloned()))
}
