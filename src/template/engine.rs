use crate::config::EngineConfig;
use crate::context::ResolutionContext;
use crate::services::Services;
use crate::surface::SyntheticKey;
use crate::template::commands::Command;
use crate::template::parser::{enclosing_token, parse_command_token, parse_variables, Syntax};
use crate::template::resolver::Resolver;
use std::sync::Arc;

/// Expands whole templates against the current resolution context
pub struct TemplateEngine {
    context: Arc<ResolutionContext>,
    services: Services,
    config: EngineConfig,
}

impl TemplateEngine {
    pub fn new(context: Arc<ResolutionContext>, services: Services, config: EngineConfig) -> Self {
        Self {
            context,
            services,
            config,
        }
    }

    pub fn context(&self) -> &Arc<ResolutionContext> {
        &self.context
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Expand a template, discarding any synthetic key presses
    pub async fn expand(&self, template: &str) -> String {
        self.expand_with_keys(template, &mut Vec::new()).await
    }

    /// Expand in three passes: square placeholders, then bare `{name}`
    /// variables, then curly placeholders. Text without placeholders comes
    /// back unchanged.
    pub async fn expand_with_keys(&self, template: &str, keys: &mut Vec<SyntheticKey>) -> String {
        let snapshot = self.context.snapshot();
        let resolver = Resolver::new(&self.services, &snapshot, self.config.max_depth);

        let text = resolver
            .resolve_text(template.to_string(), Syntax::Square, keys, 0)
            .await;
        let text = substitute_variables(&resolver, &snapshot.variables, &text, keys).await;
        resolver.resolve_text(text, Syntax::Curly, keys, 0).await
    }

    /// Resolve one placeholder token from the incremental driver.
    ///
    /// A token naming a command runs it directly and substitutes the result
    /// into the token. Anything else goes through the full expansion.
    /// Clipboard or AI text nested in a wider token only feeds that token and
    /// is never read as placeholders.
    pub async fn execute_command(&self, token: &str, keys: &mut Vec<SyntheticKey>) -> String {
        let Some(occurrence) = parse_command_token(token) else {
            return token.to_string();
        };

        let Some(command) = Command::lookup(&occurrence.key) else {
            return self.expand_with_keys(token, keys).await;
        };

        let snapshot = self.context.snapshot();
        let resolver = Resolver::new(&self.services, &snapshot, self.config.max_depth);
        let value = resolver
            .run_command(command, occurrence.argument_or_empty(), keys)
            .await;

        if occurrence.full_match == token {
            return value;
        }
        if command.output_is_literal() {
            return resolve_around(&resolver, token, &occurrence.full_match, &value, keys).await;
        }
        // A command nested inside a wider token leaves the outer one to expand
        let substituted = token.replacen(&occurrence.full_match, &value, 1);
        self.expand_with_keys(&substituted, keys).await
    }
}

/// Stands in for clipboard or AI text while the token around it is parsed
const LITERAL_MASK: &str = "\u{0}";

/// Resolve only the token wrapping `inner`, feeding it `value` verbatim.
/// Nothing `value` contains is ever parsed as a placeholder.
async fn resolve_around(
    resolver: &Resolver<'_>,
    token: &str,
    inner: &str,
    value: &str,
    keys: &mut Vec<SyntheticKey>,
) -> String {
    let masked = token.replacen(inner, LITERAL_MASK, 1);
    let Some(mut outer) = enclosing_token(&masked, LITERAL_MASK) else {
        return masked.replace(LITERAL_MASK, value);
    };

    let start = outer.position;
    let end = start + outer.full_match.len();
    outer.full_match = outer.full_match.replace(LITERAL_MASK, value);
    outer.argument = outer.argument.map(|arg| arg.replace(LITERAL_MASK, value));
    let resolved = resolver.resolve_occurrence(&outer, keys).await;

    format!("{}{}{}", &masked[..start], resolved, &masked[end..]).replace(LITERAL_MASK, value)
}

/// Bare `{name}`: a variable, else an argument-less command, else literal.
/// Substituted values are not rescanned here.
async fn substitute_variables(
    resolver: &Resolver<'_>,
    variables: &crate::models::Variables,
    text: &str,
    keys: &mut Vec<SyntheticKey>,
) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for occurrence in parse_variables(text) {
        output.push_str(&text[last..occurrence.position]);
        last = occurrence.position + occurrence.full_match.len();

        if let Some(value) = variables.get(&occurrence.key) {
            output.push_str(value);
        } else if let Some(command) = Command::lookup(&occurrence.key) {
            output.push_str(&resolver.run_command(command, "", keys).await);
        } else {
            output.push_str(&occurrence.full_match);
        }
    }

    output.push_str(&text[last..]);
    output
}
