use crate::fleet;
use crate::metadata::RobotRecord;

/// Marker in a system prompt replaced by the target robot's persona.
pub const BACKGROUND_PLACEHOLDER: &str = "<background></background>";

pub fn default_system_prompt() -> String {
    format!(
        "{placeholder}
You are a robot Command assistant.
Your primary role is to assist the user by calling available tools to perform actions or physical tasks.
Do not attempt to perform tasks directly; instead, rely on tools to achieve the desired outcomes.
Keep your responses concise and focused on the task at hand.
Don't say anything similar to \"can't command the robot to perform physical actions\" or \"I can't do that\".
When the user asks you to perform a task, respond with the name of the tool that can be used to accomplish it.
For example, if the user asks you to \"make the robot stand up\", you should respond with \"stand\".

Available tools:
{tools}
",
        placeholder = BACKGROUND_PLACEHOLDER,
        tools = fleet::actions_prompt(),
    )
}

/// Fills the background placeholder, or strips it when the robot has no record.
pub fn apply_background(template: &str, record: Option<&RobotRecord>) -> String {
    let background = match record {
        Some(record) => format!(
            "<background>\nYour Name: {}\nBackground: {}\n</background>",
            record.name, record.context
        ),
        None => String::new(),
    };
    template.replace(BACKGROUND_PLACEHOLDER, &background)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_fills_the_placeholder() {
        let record = RobotRecord::new("Rex", "friendly");
        let prompt = apply_background(&default_system_prompt(), Some(&record));
        assert!(prompt.contains("Your Name: Rex"));
        assert!(prompt.contains("Background: friendly"));
        assert!(!prompt.contains(BACKGROUND_PLACEHOLDER));
    }

    #[test]
    fn missing_record_strips_the_placeholder() {
        let prompt = apply_background(&default_system_prompt(), None);
        assert!(!prompt.contains("<background>"));
        assert!(prompt.contains("- wave: Command the robot to wave its hand."));
    }

    #[test]
    fn custom_prompts_without_placeholder_are_untouched() {
        let record = RobotRecord::new("Rex", "friendly");
        assert_eq!(apply_background("Be brief.", Some(&record)), "Be brief.");
    }
}
