//! System prompt for the pizza ordering agent

use time::{Date, OffsetDateTime, macros::format_description};

use super::tools::ToolRegistry;

const PERSONA: &str = "\
You are a friendly, conversational AI assistant helping a caller order a pizza over the phone.
Your task is to gather all necessary information for a pizza order, including size, toppings, and crust type.
Keep responses short and natural. If the user doesn't provide all necessary details, ask for the missing information. Only ask one question at a time.
Your response will be used to generate audio responses to the user. Non-standard characters should not be included.
Don't mention the function or expose its usage to the user.";

const CALL_FORMAT: &str = r#"You must use the following function and the reply should contain the function call in the following format:
<{start_tag}={function_name}>{parameters}{end_tag}
where

start_tag => `<function`
parameters => a JSON dict with the function argument name as key and function argument value as value.
end_tag => `</function>`

Here is an example,
<function=process_pizza_order>{"size": "medium", "toppings": ["cheese", "pepperoni"], "crust": "thin"}</function>

Reminder:
- Function calls MUST follow the specified format
- Required parameters MUST be specified
- Only call one function at a time
- Put the entire function call reply on one line"#;

fn format_date(date: Date) -> String {
    let format = format_description!("[day] [month repr:long] [year]");
    date.format(&format).unwrap_or_else(|_| date.to_string())
}

/// Build the system prompt for the registered tools, dated today.
pub fn system_prompt(tools: &ToolRegistry) -> String {
    system_prompt_for_date(tools, OffsetDateTime::now_utc().date())
}

pub fn system_prompt_for_date(tools: &ToolRegistry, today: Date) -> String {
    let definitions = tools.definitions();
    let names: Vec<String> = definitions
        .iter()
        .filter_map(|def| def["name"].as_str().map(str::to_string))
        .collect();

    let mut prompt = String::new();
    prompt.push_str("Environment: pizza_ordering\n");
    prompt.push_str(&format!("Tools: {}\n", names.join(", ")));
    prompt.push_str("Cutting Knowledge Date: December 2023\n");
    prompt.push_str(&format!("Today Date: {}\n\n", format_date(today)));

    if !definitions.is_empty() {
        prompt.push_str("# Tool Instructions\n");
        prompt.push_str(
            "- When you have gathered all necessary information for a pizza order, use the process_pizza_order function.\n\n",
        );
        prompt.push_str("You have access to the following functions:\n\n");
        for def in &definitions {
            let name = def["name"].as_str().unwrap_or_default();
            let description = def["description"].as_str().unwrap_or_default();
            let schema = serde_json::to_string_pretty(def).unwrap_or_default();
            prompt.push_str(&format!(
                "Use the function '{name}' to: {description}\n{schema}\n\n"
            ));
        }
        prompt.push_str(CALL_FORMAT);
        prompt.push_str("\n\n");
    }

    prompt.push_str(PERSONA);
    prompt
}
