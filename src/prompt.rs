use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};
use std::borrow::Cow;

/// `navigator=> ` prompt, or `navigator(rides)=> ` for a non-default store
pub struct NavigatorPrompt {
    store_name: Option<String>,
}

impl NavigatorPrompt {
    pub fn new(store_name: &str) -> Self {
        let store_name = match store_name {
            "" | "uber_data" => None,
            name => Some(name.to_string()),
        };
        Self { store_name }
    }
}

impl Prompt for NavigatorPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        match &self.store_name {
            Some(name) => Cow::Owned(format!("navigator({})=> ", name)),
            None => Cow::Borrowed("navigator=> "),
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Vi(reedline::PromptViMode::Insert) => Cow::Borrowed("[INS] "),
            PromptEditMode::Vi(reedline::PromptViMode::Normal) => Cow::Borrowed("[NOR] "),
            _ => Cow::Borrowed(""),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        match history_search.term.as_str() {
            "" => Cow::Owned(format!("({}reverse-i-search): ", prefix)),
            term => Cow::Owned(format!("({}reverse-i-search '{}'): ", prefix, term)),
        }
    }
}
