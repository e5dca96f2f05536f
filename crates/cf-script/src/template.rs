use std::sync::{Arc, OnceLock};

use cf_core::{FlowResult, SourceSpan};
use cf_runtime::Params;
use regex::Regex;

use crate::bridge::{apply_effects, check_syntax, ScriptEffect, ScriptRun};

fn template_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$\{([^{}]+)\}").expect("template regex must compile"))
}

/// Message text with `${expr}` placeholders.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    source: Arc<str>,
}

impl MessageTemplate {
    pub fn is_template(text: &str) -> bool {
        template_regex().is_match(text)
    }

    pub fn compile(text: &str, span: &SourceSpan) -> FlowResult<Self> {
        for captures in template_regex().captures_iter(text) {
            if let Some(expr) = captures.get(1) {
                check_syntax(&format!("({})", expr.as_str()), span)?;
            }
        }
        Ok(Self {
            source: Arc::from(text),
        })
    }

    /// Substitutes every placeholder. All expressions share one scope.
    pub fn render_sync(&self, params: &Params) -> FlowResult<(String, Vec<ScriptEffect>)> {
        let template = self.source.as_ref();
        let mut run = ScriptRun::new(params);
        let mut output = String::new();
        let mut last_index = 0usize;
        for captures in template_regex().captures_iter(template) {
            let (Some(full), Some(expr)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            output.push_str(&template[last_index..full.start()]);
            let value = run.eval(&format!("({})", expr.as_str()))?;
            output.push_str(&value.to_text());
            last_index = full.end();
        }
        output.push_str(&template[last_index..]);
        Ok((output, run.finish()))
    }

    pub async fn render(&self, params: &Params) -> FlowResult<String> {
        let (text, effects) = self.render_sync(params)?;
        apply_effects(effects, params).await?;
        Ok(text)
    }
}
