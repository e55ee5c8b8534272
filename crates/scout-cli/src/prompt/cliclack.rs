use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::{input, spinner};
use console::style;

use super::{parse_input, Input, InputType, Prompt};

pub struct CliclackPrompt {
    spinner: cliclack::ProgressBar,
    input_mode: InputMode,
    theme: Theme,
}

enum InputMode {
    Singleline,
    Multiline,
}

enum Theme {
    Light,
    Dark,
}

impl Theme {
    fn bat_theme(&self) -> &'static str {
        match self {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }
}

impl CliclackPrompt {
    pub fn new() -> Self {
        CliclackPrompt {
            spinner: spinner(),
            input_mode: InputMode::Singleline,
            theme: Theme::Dark,
        }
    }
}

fn print(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();

    // not a terminal bat can style, print the reply as is
    if printed.is_err() {
        println!("{}", content);
    }
}

fn print_help() {
    println!("Commands:");
    println!("exit - Exit the session");
    println!("/m - Switch to multiline input mode");
    println!("/s - Switch to singleline input mode");
    println!("/t - Toggle Light/Dark theme");
    println!("/? - Display this help message");
}

impl Prompt for CliclackPrompt {
    fn render(&mut self, reply: &str) {
        print(reply, self.theme.bat_theme());
        println!();
        let _ = io::stdout().flush();
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start("searching and thinking");
    }

    fn hide_busy(&mut self) {
        self.spinner.stop("");
    }

    fn get_input(&mut self) -> Result<Input> {
        let mut input = input(format!(
            "Scout: {}",
            style("(exit to quit, /? for help)").dim()
        ))
        .placeholder("");
        if let InputMode::Multiline = self.input_mode {
            input = input.multiline();
        }
        let message_text: String = input.interact()?;

        match message_text.trim() {
            "/m" => {
                self.input_mode = InputMode::Multiline;
                Ok(ask_again())
            }
            "/s" => {
                self.input_mode = InputMode::Singleline;
                Ok(ask_again())
            }
            "/t" => {
                self.theme = match self.theme {
                    Theme::Light => {
                        println!("Switching to Dark theme");
                        Theme::Dark
                    }
                    Theme::Dark => {
                        println!("Switching to Light theme");
                        Theme::Light
                    }
                };
                Ok(ask_again())
            }
            "/?" => {
                print_help();
                Ok(ask_again())
            }
            _ => Ok(parse_input(&message_text)),
        }
    }

    fn close(&self) {
        // No cleanup required
    }
}

fn ask_again() -> Input {
    Input {
        input_type: InputType::AskAgain,
        content: None,
    }
}
