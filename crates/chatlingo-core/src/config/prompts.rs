use std::collections::HashMap;

use super::shellexpand;

/// System prompts and fixed user-facing texts.
///
/// Loaded from `{data_dir}/prompts/PROMPTS.md` at startup; any missing file or
/// section keeps the built-in default.
#[derive(Debug, Clone)]
pub struct Prompts {
    /// Base tutor prompt for random chat and curriculum lessons.
    pub chat_system: String,
    /// Roleplay prompt with `{scenario_title}`, `{bot_persona}` and `{situation_seed}`.
    pub scenario_system: String,
    /// Nudge for a user with a day cursor: `{day_number}`, `{scenario_title}`.
    pub nudge_day: String,
    /// Nudge for a user parked in a scenario: `{scenario_title}`.
    pub nudge_scenario: String,
    /// Nudge for a user who never started the curriculum.
    pub nudge_new: String,
    /// Instruction handed to the LLM when writing a nudge: `{nudge}`.
    pub nudge_cue: String,
    /// Main menu body.
    pub welcome: String,
    /// Body of the scenario picker list.
    pub scenario_list: String,
    /// Label of the button that opens the scenario list.
    pub scenario_list_button: String,
    pub no_scenarios: String,
    pub scenario_not_found: String,
    /// Sent when the user leaves a scenario.
    pub scenario_exit: String,
    /// Corrective text for `day N` outside the curriculum: `{last_day}`.
    pub invalid_day: String,
    /// Fallback reply when the provider fails during chat or lessons.
    pub fallback_chat: String,
    /// Fallback reply when the provider fails during roleplay.
    pub fallback_roleplay: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            chat_system: "You are Chatlingo, a friendly Kannada tutor from Bengaluru chatting on a messaging app.\n\
                          - Reply in simple Kannada written in Latin script (Kanglish), with a short English gloss in brackets for new words.\n\
                          - Keep replies short: two or three sentences, like a text message.\n\
                          - Gently correct mistakes by repeating the right phrase, never by lecturing.\n\
                          - End with a question so the learner keeps talking.".into(),
            scenario_system: "You are roleplaying for a Kannada learner.\n\
                              Scenario: {scenario_title}\n\
                              Your character: {bot_persona}\n\
                              Situation: {situation_seed}\n\n\
                              Stay in character. Speak casual Bengaluru Kannada in Latin script, mixing English the way locals do. \
                              Keep each reply to one or two short lines. If the learner is stuck, drop a hint in brackets and carry on. \
                              If this is the start of the conversation, open the scene in character.".into(),
            nudge_day: "Namaskara! 🌞 Ready for day {day_number}? Today's lesson: {scenario_title}. \
                        Reply \"day {day_number}\" to jump in.".into(),
            nudge_scenario: "Hey! We were in the middle of \"{scenario_title}\". \
                             Send me a message to carry on, or \"menu\" to pick something else.".into(),
            nudge_new: "Namaskara! 🙏 Five minutes of Kannada a day goes a long way. \
                        Reply \"day 1\" to start your first lesson.".into(),
            nudge_cue: "[The learner has been quiet for a while. Write one short, warm message in your own words \
                        to bring them back, and point them to this: {nudge}]".into(),
            welcome: "Namaskara! 🙏 Welcome to Chatlingo. How would you like to learn Kannada today?".into(),
            scenario_list: "Pick a situation to practice. I'll play the other person.".into(),
            scenario_list_button: "Scenarios".into(),
            no_scenarios: "No scenarios found. Please contact admin.".into(),
            scenario_not_found: "Sorry, I couldn't find that scenario. Let's go back to the menu.".into(),
            scenario_exit: "Super! Chennagi maadidri 👏 Ending the scenario. Back to the menu.".into(),
            invalid_day: "Lessons run from day 1 to day {last_day}. Try something like \"day 3\".".into(),
            fallback_chat: "Ayyo! Something went wrong with my brain. Please try again later, maadi.".into(),
            fallback_roleplay: "Swalpa technical issue ide. Let's continue in a bit!".into(),
        }
    }
}

impl Prompts {
    /// Load prompts from `{data_dir}/prompts/PROMPTS.md`.
    ///
    /// Sections are `## Name` headers; unknown names are ignored.
    pub fn load(data_dir: &str) -> Self {
        let mut prompts = Self::default();
        let dir = shellexpand(data_dir);
        let path = format!("{dir}/prompts/PROMPTS.md");
        if let Ok(content) = std::fs::read_to_string(&path) {
            prompts.apply_sections(&parse_markdown_sections(&content));
            tracing::info!("prompts: loaded overrides from {path}");
        }
        prompts
    }

    fn apply_sections(&mut self, sections: &HashMap<String, String>) {
        let slots: [(&str, &mut String); 15] = [
            ("Chat System", &mut self.chat_system),
            ("Scenario System", &mut self.scenario_system),
            ("Nudge Day", &mut self.nudge_day),
            ("Nudge Scenario", &mut self.nudge_scenario),
            ("Nudge New", &mut self.nudge_new),
            ("Nudge Cue", &mut self.nudge_cue),
            ("Welcome", &mut self.welcome),
            ("Scenario List", &mut self.scenario_list),
            ("Scenario List Button", &mut self.scenario_list_button),
            ("No Scenarios", &mut self.no_scenarios),
            ("Scenario Not Found", &mut self.scenario_not_found),
            ("Scenario Exit", &mut self.scenario_exit),
            ("Invalid Day", &mut self.invalid_day),
            ("Fallback Chat", &mut self.fallback_chat),
            ("Fallback Roleplay", &mut self.fallback_roleplay),
        ];
        for (name, slot) in slots {
            if let Some(v) = sections.get(name) {
                *slot = v.clone();
            }
        }
    }

    /// Fill the roleplay template for one scenario.
    pub fn render_scenario_system(&self, title: &str, persona: &str, seed: &str) -> String {
        self.scenario_system
            .replace("{scenario_title}", title)
            .replace("{bot_persona}", persona)
            .replace("{situation_seed}", seed)
    }

    /// Fill the day nudge template.
    pub fn render_nudge_day(&self, day: i64, title: &str) -> String {
        self.nudge_day
            .replace("{day_number}", &day.to_string())
            .replace("{scenario_title}", title)
    }

    /// Fill the scenario nudge template.
    pub fn render_nudge_scenario(&self, title: &str) -> String {
        self.nudge_scenario.replace("{scenario_title}", title)
    }

    /// Wrap a rendered nudge into the LLM instruction.
    pub fn render_nudge_cue(&self, nudge: &str) -> String {
        self.nudge_cue.replace("{nudge}", nudge)
    }

    /// Fill the invalid-day correction.
    pub fn render_invalid_day(&self, last_day: i64) -> String {
        self.invalid_day.replace("{last_day}", &last_day.to_string())
    }
}

/// Parse a markdown file with `## Section` headers into a map of section name -> body.
fn parse_markdown_sections(content: &str) -> HashMap<String, String> {
    let mut sections = HashMap::new();
    let mut current_key: Option<String> = None;
    let mut current_body = String::new();

    for line in content.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            if let Some(key) = current_key.take() {
                let trimmed = current_body.trim().to_string();
                if !trimmed.is_empty() {
                    sections.insert(key, trimmed);
                }
            }
            current_key = Some(header.trim().to_string());
            current_body.clear();
        } else if current_key.is_some() {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }

    if let Some(key) = current_key {
        let trimmed = current_body.trim().to_string();
        if !trimmed.is_empty() {
            sections.insert(key, trimmed);
        }
    }

    sections
}
