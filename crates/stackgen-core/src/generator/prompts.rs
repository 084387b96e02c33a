//! Prompt templates for the four generator capabilities.

use crate::task::BranchInput;

pub fn validation_prompt(task_description: &str) -> String {
    format!(
        "Decide whether the user request below describes a concrete programming task, \
such as building a web service, writing a CI/CD pipeline, designing a database, \
implementing an authorization flow or any other software development work.\n\
Answer with the single word true if it does and false otherwise.\n\n\
User request:\n{task_description}\n\nAnswer:"
    )
}

pub fn stacks_prompt(task_description: &str, limit: usize) -> String {
    format!(
        "Identify up to {limit} popular and mutually distinct technology stacks suited to \
the programming task below.\n\
Write each stack as one string naming the main languages and frameworks of its key \
components (for example frontend, backend and database). Do not reuse a specific \
technology in more than one stack and prefer widely adopted choices.\n\n\
Reply with JSON only, in this shape:\n\
{{\"tech_stacks\": [\"Angular, ASP.NET, SQL Server\", \"React, Spring Boot, MySQL\"]}}\n\n\
Programming task:\n{task_description}"
    )
}

pub fn code_prompt(input: &BranchInput) -> String {
    format!(
        "Software development task:\n{task}\n\nTechnology stack:\n{stack}\n\n\
For every technology in the stack write one complete, self-contained code block that \
shows its primary role in the task: include framework setup, configuration and the \
entry point, and keep the components consistent with each other (shared models, \
matching URLs, aligned database access).\n\n\
Reply with JSON only, in this shape:\n\
{{\"code_blocks\": [{{\"technology\": \"<technology>\", \"code\": \"<main code>\"}}]}}",
        task = input.task_description,
        stack = input.tech_stack,
    )
}

pub fn dependencies_prompt(input: &BranchInput) -> String {
    format!(
        "Software development task:\n{task}\n\nTechnology stack:\n{stack}\n\n\
For every technology in the stack write its primary dependency file as it would sit \
at the project root (requirements.txt, package.json, a .csproj, pom.xml and so on). \
Pin every dependency to an explicit version and use the file's real name. Escape only \
what JSON requires.\n\n\
Reply with JSON only, in this shape:\n\
{{\"code_blocks\": [{{\"technology\": \"<technology>\", \
\"blocks\": [{{\"filename\": \"<file name>\", \"code\": \"<file content>\"}}]}}]}}",
        task = input.task_description,
        stack = input.tech_stack,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::GenerationMode;

    fn input() -> BranchInput {
        BranchInput {
            task_description: "A URL shortener".to_string(),
            generation_mode: GenerationMode::Code,
            tech_stack: "Go, PostgreSQL".to_string(),
        }
    }

    #[test]
    fn stacks_prompt_mentions_limit() {
        let prompt = stacks_prompt("A chat server", 3);
        assert!(prompt.contains("up to 3"));
        assert!(prompt.contains("A chat server"));
        assert!(prompt.contains("{\"tech_stacks\""));
    }

    #[test]
    fn branch_prompts_embed_task_and_stack() {
        for prompt in [code_prompt(&input()), dependencies_prompt(&input())] {
            assert!(prompt.contains("A URL shortener"));
            assert!(prompt.contains("Go, PostgreSQL"));
            assert!(prompt.contains("code_blocks"));
        }
    }

    #[test]
    fn validation_prompt_embeds_request() {
        assert!(validation_prompt("make me a sandwich").contains("make me a sandwich"));
    }
}
