//! Interactive confirmation of suggested tags, one file at a time.

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use grabby::{FileId, FileState, Session};

/// Source of answers while reviewing files.
pub trait Prompter {
    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> Result<usize>;
    fn multi_select(&mut self, prompt: &str, items: &[String]) -> Result<Vec<usize>>;
    fn input(&mut self, prompt: &str) -> Result<String>;
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

#[derive(Default)]
pub struct Terminal {
    theme: ColorfulTheme,
}

impl Prompter for Terminal {
    fn select(&mut self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()?)
    }

    fn multi_select(&mut self, prompt: &str, items: &[String]) -> Result<Vec<usize>> {
        Ok(MultiSelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .interact()?)
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        Ok(Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Accept,
    ChoosePrimary,
    AddTags,
    RemoveTags,
    Skip,
}

const ACTIONS: [(Action, &str); 5] = [
    (Action::Accept, "Accept and select for embedding"),
    (Action::ChoosePrimary, "Choose primary tag"),
    (Action::AddTags, "Add tags"),
    (Action::RemoveTags, "Remove tags"),
    (Action::Skip, "Skip"),
];

fn choose_primary(
    session: &Session,
    id: &FileId,
    tags: &[String],
    current: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    let default = current
        .and_then(|c| tags.iter().position(|t| t == c))
        .unwrap_or(0);
    let picked = prompter.select("Primary tag (workspace)", tags, default)?;
    if let Some(tag) = tags.get(picked) {
        session.set_primary_tag(id, tag)?;
    }
    Ok(())
}

/// Let the user edit tags and pick a primary tag for one file. Returns
/// whether the file ended up selected for embedding.
pub fn review_file(session: &Session, id: &FileId, prompter: &mut dyn Prompter) -> Result<bool> {
    let labels: Vec<String> = ACTIONS.iter().map(|(_, label)| label.to_string()).collect();

    loop {
        let Some(file) = session.file(id) else {
            return Ok(false);
        };
        let FileState::AwaitingConfirmation {
            tags, primary_tag, ..
        } = &file.state
        else {
            return Ok(false);
        };

        let primary = primary_tag
            .as_deref()
            .map(|t| format!(" -> {t}"))
            .unwrap_or_default();
        let header = format!("{} [{}]{primary}", file.filename(), tags.join(", "));

        let picked = prompter.select(&header, &labels, 0)?;
        let Some((action, _)) = ACTIONS.get(picked) else {
            continue;
        };

        match action {
            Action::Accept => {
                if tags.is_empty() {
                    println!("Add a tag before accepting \"{}\".", file.filename());
                    continue;
                }
                if primary_tag.is_none() {
                    choose_primary(session, id, tags, None, prompter)?;
                }
                if !session.is_selected(id) {
                    session.toggle_selection(id)?;
                }
                return Ok(true);
            }
            Action::ChoosePrimary if !tags.is_empty() => {
                choose_primary(session, id, tags, primary_tag.as_deref(), prompter)?;
            }
            Action::AddTags => {
                let text = prompter.input("Tags to add (comma-separated)")?;
                for tag in text.split(',') {
                    session.add_tag(id, tag)?;
                }
            }
            Action::RemoveTags if !tags.is_empty() => {
                for index in prompter.multi_select("Tags to remove", tags)? {
                    if let Some(tag) = tags.get(index) {
                        session.remove_tag(id, tag)?;
                    }
                }
            }
            Action::ChoosePrimary | Action::RemoveTags => {}
            Action::Skip => {
                if session.is_selected(id) {
                    session.toggle_selection(id)?;
                }
                return Ok(false);
            }
        }
    }
}

/// Review every file in `ids` that is awaiting confirmation. Returns the
/// number of files selected afterwards.
pub fn review_all(session: &Session, ids: &[FileId], prompter: &mut dyn Prompter) -> Result<usize> {
    for id in ids {
        if session
            .file(id)
            .is_some_and(|f| matches!(f.state, FileState::AwaitingConfirmation { .. }))
        {
            review_file(session, id, prompter)?;
        }
    }
    Ok(session.selected_count())
}
