//! Turns placeholder occurrences into text.

use crate::context::Snapshot;
use crate::services::Services;
use crate::surface::SyntheticKey;
use crate::template::commands::Command;
use crate::template::parser::{contains_tokens, parse_placeholders, parse_tokens, Occurrence, Syntax};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves placeholders against one snapshot of variables and AI settings
pub struct Resolver<'a> {
    services: &'a Services,
    snapshot: &'a Snapshot,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(services: &'a Services, snapshot: &'a Snapshot, max_depth: usize) -> Self {
        Self {
            services,
            snapshot,
            max_depth,
        }
    }

    /// Run a command, degrading any failure to empty text
    pub async fn run_command(
        &self,
        command: Command,
        argument: &str,
        keys: &mut Vec<SyntheticKey>,
    ) -> String {
        match command.run(argument, self.services, self.snapshot, keys).await {
            Ok(text) => text,
            Err(e) => {
                warn!(command = command.name(), "command failed: {}", e);
                String::new()
            }
        }
    }

    /// Value of one occurrence: a command, else a custom variable, else a
    /// prompt labelled with the argument. A cancelled prompt, or a bare name
    /// that is neither command nor variable, keeps the token verbatim.
    pub async fn resolve_occurrence(
        &self,
        occurrence: &Occurrence,
        keys: &mut Vec<SyntheticKey>,
    ) -> String {
        if let Some(command) = Command::lookup(&occurrence.key) {
            return self
                .run_command(command, occurrence.argument_or_empty(), keys)
                .await;
        }

        if let Some(value) = self.snapshot.variables.get(&occurrence.key) {
            return value.clone();
        }

        let Some(label) = occurrence.argument.as_deref() else {
            return occurrence.full_match.clone();
        };

        match self.services.prompter.prompt(label).await {
            Some(answer) => answer,
            None => {
                debug!(key = %occurrence.key, "prompt cancelled, keeping placeholder");
                occurrence.full_match.clone()
            }
        }
    }

    /// Resolve every occurrence of `syntax` in `text`.
    ///
    /// Square syntax takes argument-less tokens too; curly syntax only sees
    /// `{key:arg}`. An identical token is resolved once and its value reused.
    /// A resolved value holding more of the same syntax is resolved again, up
    /// to the depth limit, beyond which it is left as is. Clipboard and AI
    /// text is never rescanned.
    pub fn resolve_text<'r>(
        &'r self,
        text: String,
        syntax: Syntax,
        keys: &'r mut Vec<SyntheticKey>,
        depth: usize,
    ) -> BoxFuture<'r, String> {
        Box::pin(async move {
            let occurrences = match syntax {
                Syntax::Square => parse_tokens(&text, syntax),
                Syntax::Curly => parse_placeholders(&text, syntax),
            };
            if occurrences.is_empty() {
                return text;
            }

            let mut resolved: HashMap<String, String> = HashMap::new();
            let mut output = String::with_capacity(text.len());
            let mut last = 0;

            for occurrence in &occurrences {
                output.push_str(&text[last..occurrence.position]);
                last = occurrence.position + occurrence.full_match.len();

                if let Some(value) = resolved.get(&occurrence.full_match) {
                    output.push_str(value);
                    continue;
                }

                let literal = Command::lookup(&occurrence.key)
                    .map_or(false, |command| command.output_is_literal());
                let mut value = self.resolve_occurrence(occurrence, keys).await;
                if !literal && value != occurrence.full_match && contains_tokens(&value, syntax) {
                    if depth + 1 < self.max_depth {
                        value = self.resolve_text(value, syntax, keys, depth + 1).await;
                    } else {
                        warn!(
                            token = %occurrence.full_match,
                            "placeholder nesting too deep, leaving the rest unresolved"
                        );
                    }
                }

                output.push_str(&value);
                resolved.insert(occurrence.full_match.clone(), value);
            }

            output.push_str(&text[last..]);
            output
        })
    }
}
