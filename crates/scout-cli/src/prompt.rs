use anyhow::Result;

pub mod cliclack;

pub trait Prompt {
    fn render(&mut self, reply: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
    fn scout_ready(&self) {
        println!("\n");
        println!("Scout is running! Ask a question, it will search the web when it needs to.");
        println!("\n");
    }
}

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Only set for messages
}

pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,  // User sent a message
    Exit,     // User wants to exit the session
}

/// Sort a raw line of user input into a message or a control command
pub fn parse_input(raw: &str) -> Input {
    let text = raw.trim();
    if text.is_empty() {
        return Input {
            input_type: InputType::AskAgain,
            content: None,
        };
    }

    if ["exit", "/exit", "/quit"]
        .iter()
        .any(|command| text.eq_ignore_ascii_case(command))
    {
        return Input {
            input_type: InputType::Exit,
            content: None,
        };
    }

    Input {
        input_type: InputType::Message,
        content: Some(text.to_string()),
    }
}
