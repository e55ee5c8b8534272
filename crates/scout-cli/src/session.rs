use anyhow::Result;

use crate::prompt::{InputType, Prompt};
use scout::agent::Agent;
use scout::models::role::Role;

/// An interactive chat. The history lives only as long as the session.
pub struct Session<'a> {
    agent: Agent,
    prompt: Box<dyn Prompt + 'a>,
    history: Vec<(Role, String)>,
}

impl<'a> Session<'a> {
    pub fn new(agent: Agent, prompt: Box<dyn Prompt + 'a>) -> Self {
        Session {
            agent,
            prompt,
            history: Vec::new(),
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt.scout_ready();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = input.content {
                        let reply = self.reply(&content).await;
                        self.prompt.render(&reply);
                    }
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }
        }

        self.prompt.close();
        Ok(())
    }

    /// Answer a single message without entering the input loop
    pub async fn headless_start(&mut self, message: &str) -> Result<()> {
        let reply = self.reply(message).await;
        self.prompt.render(&reply);
        self.prompt.close();
        Ok(())
    }

    async fn reply(&mut self, message: &str) -> String {
        self.prompt.show_busy();
        let reply = self.agent.chat(message, &self.history).await;
        self.prompt.hide_busy();

        self.history.push((Role::User, message.to_string()));
        self.history.push((Role::Assistant, reply.clone()));
        reply
    }
}
